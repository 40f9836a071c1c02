//! Reinvestment return at which the two strategies end with equal net wealth.
//!
//! Net wealth credits the lower-interest loan's strategy with the interest it
//! saved, so the break-even return is the point where investing the payment
//! gap stops losing to simply paying less interest.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::schedule::{Simulation, StrategyPlan};
use crate::annuity::{annualize_monthly_rate, annuity_future_value, monthly_effective_rate};
use crate::loan::SolvedLoan;
use crate::solver::{solve_bracketed, BisectionConfig};
use crate::types::{LoanSide, Money, Rate};

/// Break-even returns above this annual percentage are reported as unbounded.
pub const UNBOUNDED_RATE_PERCENT: f64 = 1000.0;

// ---------------------------------------------------------------------------
// Label
// ---------------------------------------------------------------------------

/// Display form of a break-even rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum BreakEvenLabel {
    /// No finite return closes the gap ("∞").
    Unbounded,
    /// The search found no root ("—").
    Unsolvable,
    /// Annual effective percentage.
    Rate(f64),
}

impl BreakEvenLabel {
    /// Label for a month whose cumulative interest delta is `interest_delta_sum`.
    pub fn classify(interest_delta_sum: Money, rate_percent: Option<f64>) -> Self {
        if interest_delta_sum <= 0.0 {
            return BreakEvenLabel::Unbounded;
        }
        match rate_percent {
            Some(rate) if rate > UNBOUNDED_RATE_PERCENT => BreakEvenLabel::Unbounded,
            Some(rate) => BreakEvenLabel::Rate(rate),
            None => BreakEvenLabel::Unsolvable,
        }
    }

    /// Label for a whole-schedule rate, where an unbounded rate has no
    /// meaningful display and shows as unsolvable.
    pub fn for_schedule(rate_percent: Option<f64>) -> Self {
        rate_percent.map_or(BreakEvenLabel::Unsolvable, BreakEvenLabel::Rate)
    }
}

impl fmt::Display for BreakEvenLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakEvenLabel::Unbounded => f.write_str("∞"),
            BreakEvenLabel::Unsolvable => f.write_str("—"),
            BreakEvenLabel::Rate(rate) => write!(f, "{rate:.2}%"),
        }
    }
}

impl FromStr for BreakEvenLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "∞" => Ok(BreakEvenLabel::Unbounded),
            "—" => Ok(BreakEvenLabel::Unsolvable),
            other => other
                .strip_suffix('%')
                .and_then(|n| n.trim().parse::<f64>().ok())
                .map(BreakEvenLabel::Rate)
                .ok_or_else(|| format!("unrecognised break-even label '{other}'")),
        }
    }
}

impl From<BreakEvenLabel> for String {
    fn from(label: BreakEvenLabel) -> Self {
        label.to_string()
    }
}

impl TryFrom<String> for BreakEvenLabel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ---------------------------------------------------------------------------
// Break-even at one month
// ---------------------------------------------------------------------------

/// Annual effective return (percent) at which both strategies have equal
/// net wealth at the end of `month`, evaluated in closed form.
///
/// `interest_saved` is the cumulative interest+PMI delta through `month`;
/// it is credited to the `lower_interest` strategy. `None` when nothing has
/// been saved yet or no root can be bracketed.
pub fn break_even_rate_at_month(
    plan: &StrategyPlan,
    month: u32,
    interest_saved: Money,
    lower_interest: Option<LoanSide>,
) -> Option<f64> {
    if !interest_saved.is_finite() || interest_saved <= 0.0 {
        return None;
    }
    if !plan.payment_delta.is_finite() {
        return None;
    }

    let net_difference = |monthly_rate: Rate| {
        let growth = (1.0 + monthly_rate).powf(f64::from(month));
        let net = |side: LoanSide| {
            let contribution = plan.contribution_amount(side);
            let periods = f64::from(plan.contribution_months(side, month));
            let seed = plan.seed(side);
            let value = annuity_future_value(contribution, periods, monthly_rate) + seed * growth;
            let gain = value - (contribution * periods + seed);
            let credit = if lower_interest == Some(side) {
                interest_saved
            } else {
                0.0
            };
            gain + credit
        };
        net(LoanSide::A) - net(LoanSide::B)
    };

    solve_bracketed(net_difference, 0.0, &BisectionConfig::BREAK_EVEN_AT_MONTH)
        .map(|monthly| annualize_monthly_rate(monthly) * 100.0)
}

// ---------------------------------------------------------------------------
// Break-even over the whole schedule
// ---------------------------------------------------------------------------

/// Terminal net-wealth difference (A − B) when both strategies earn
/// `monthly_return`: end portfolio value plus, for the lower-interest loan,
/// the cumulative interest saved.
fn terminal_net_difference(
    a: &SolvedLoan,
    b: &SolvedLoan,
    monthly_return: Rate,
    lower_interest: Option<LoanSide>,
) -> Option<f64> {
    let end = Simulation::new(a, b, Some(monthly_return), false)?.last()?;
    let net = |side: LoanSide| {
        let credit = if lower_interest == Some(side) {
            end.interest_delta_sum
        } else {
            0.0
        };
        end.portfolio_value(side).map(|value| value + credit)
    };
    Some(net(LoanSide::A)? - net(LoanSide::B)?)
}

/// Annual effective return (percent) at which both strategies finish the
/// full schedule with equal net wealth, re-running the monthly simulation
/// for every trial rate.
pub fn break_even_rate_over_schedule(a: &SolvedLoan, b: &SolvedLoan) -> Option<f64> {
    let lower_interest = LoanSide::of_smaller(a.total_interest, b.total_interest);

    let objective = |annual_rate: Rate| {
        terminal_net_difference(a, b, monthly_effective_rate(annual_rate), lower_interest)
            .unwrap_or(f64::NAN)
    };

    let rate = solve_bracketed(objective, 0.0, &BisectionConfig::BREAK_EVEN_OVER_SCHEDULE)
        .map(|annual| annual * 100.0);
    if rate.is_none() {
        debug!(a = %a.label, b = %b.label, "no whole-schedule break-even rate");
    }
    rate
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
