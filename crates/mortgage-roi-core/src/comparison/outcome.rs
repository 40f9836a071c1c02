use serde::{Deserialize, Serialize};

use super::break_even::BreakEvenLabel;
use super::schedule::{ScheduleResult, ScheduleRow};
use crate::error::MortgageRoiError;
use crate::loan::SolvedLoan;
use crate::types::{LoanSide, Money};
use crate::MortgageRoiResult;

// ---------------------------------------------------------------------------
// Assumptions
// ---------------------------------------------------------------------------

fn default_capital_gains_tax_rate() -> f64 {
    0.15
}

/// Tunable assumptions applied on top of the simulated schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonAssumptions {
    /// Long-term capital gains tax applied to positive portfolio gains.
    #[serde(default = "default_capital_gains_tax_rate")]
    pub capital_gains_tax_rate: f64,
}

impl Default for ComparisonAssumptions {
    fn default() -> Self {
        ComparisonAssumptions {
            capital_gains_tax_rate: default_capital_gains_tax_rate(),
        }
    }
}

impl ComparisonAssumptions {
    pub fn validate(&self) -> MortgageRoiResult<()> {
        let rate = self.capital_gains_tax_rate;
        if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
            return Err(MortgageRoiError::InvalidInput {
                field: "capital_gains_tax_rate".into(),
                reason: "Must be between 0 and 1".into(),
            });
        }
        Ok(())
    }

    /// Tax due on a gain; losses and undefined gains owe nothing.
    pub fn tax_on(&self, gain: Option<Money>) -> Money {
        tax_at(self.capital_gains_tax_rate, gain)
    }
}

fn tax_at(rate: f64, gain: Option<Money>) -> Money {
    match gain {
        Some(g) if g > 0.0 => g * rate,
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Headline result of the comparison at the end of the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    /// Strategy with more net wealth, `None` when even.
    pub winner: Option<LoanSide>,
    /// Absolute net wealth difference.
    pub difference: Money,
    /// After-tax portfolio value plus interest saved, per strategy.
    pub net_wealth_a: Money,
    pub net_wealth_b: Money,
    /// Month the shorter loan is paid off.
    pub payoff_month: u32,
    pub payoff_years: f64,
    /// Both portfolios combined at `payoff_month`.
    pub portfolio_total_at_payoff: Money,
    /// Loan with the longer term (A when terms are equal).
    pub longer_loan: LoanSide,
    pub longer_loan_balance_at_payoff: Money,
    pub crossover_month_with_tax: Option<u32>,
    pub crossover_month_without_tax: Option<u32>,
}

impl OutcomeSummary {
    pub fn net_wealth(&self, side: LoanSide) -> Money {
        match side {
            LoanSide::A => self.net_wealth_a,
            LoanSide::B => self.net_wealth_b,
        }
    }

    /// Portfolio total less the longer loan's remaining balance.
    pub fn net_gain_at_payoff(&self) -> Money {
        self.portfolio_total_at_payoff - self.longer_loan_balance_at_payoff
    }
}

/// One row of the side-by-side totals table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSummary {
    pub side: LoanSide,
    pub label: String,
    pub payment_with_pmi: Money,
    /// Sum of scheduled payments, PMI included.
    pub total_payment: Money,
    pub total_interest: Money,
    pub delta_sum: Money,
    /// Cumulative interest saved; only set for the lower-interest loan.
    pub interest_saved: Option<Money>,
    pub portfolio_value: Option<Money>,
    pub portfolio_gain: Option<Money>,
    pub tax_amount: Money,
    pub after_tax_value: Option<Money>,
    pub after_tax_gain: Option<Money>,
    /// Whole-schedule break-even rate; only set when the payments differ.
    pub break_even_rate: Option<f64>,
    pub break_even: BreakEvenLabel,
    pub monthly_pmi: Money,
    pub pmi_last_month: Option<u32>,
    pub pmi_total: Option<Money>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Loan with the smaller lifetime interest, `None` when equal.
pub fn lowest_interest(a: &SolvedLoan, b: &SolvedLoan) -> Option<LoanSide> {
    LoanSide::of_smaller(a.total_interest, b.total_interest)
}

fn loan_for<'a>(side: LoanSide, a: &'a SolvedLoan, b: &'a SolvedLoan) -> &'a SolvedLoan {
    match side {
        LoanSide::A => a,
        LoanSide::B => b,
    }
}

/// Net wealth of each strategy at the end of the schedule, with the winner,
/// payoff-month position and crossover months.
///
/// `None` when the portfolios are undefined (no reinvestment rate) or the
/// resulting net wealth is not finite.
pub fn summarize_outcome(
    schedule: &ScheduleResult,
    a: &SolvedLoan,
    b: &SolvedLoan,
    assumptions: &ComparisonAssumptions,
) -> Option<OutcomeSummary> {
    let end = &schedule.terminal;
    let lower_interest = schedule.lower_interest;

    let net = |side: LoanSide| -> Option<Money> {
        let value = end.portfolio_value(side)?;
        let tax = assumptions.tax_on(end.portfolio_gain(side));
        let credit = if lower_interest == Some(side) {
            end.interest_delta_sum
        } else {
            0.0
        };
        Some(value - tax + credit).filter(|v| v.is_finite())
    };
    let net_wealth_a = net(LoanSide::A)?;
    let net_wealth_b = net(LoanSide::B)?;
    let diff = net_wealth_a - net_wealth_b;

    let payoff_month = a
        .whole_months()
        .min(b.whole_months())
        .clamp(1, schedule.months());
    let payoff_row = schedule.row(payoff_month).unwrap_or(end);

    let longer_loan = if b.term_months > a.term_months {
        LoanSide::B
    } else {
        LoanSide::A
    };

    let portfolio_total_at_payoff = payoff_row.portfolio_value(LoanSide::A).unwrap_or(0.0)
        + payoff_row.portfolio_value(LoanSide::B).unwrap_or(0.0);

    Some(OutcomeSummary {
        winner: LoanSide::of_larger(net_wealth_a, net_wealth_b),
        difference: diff.abs(),
        net_wealth_a,
        net_wealth_b,
        payoff_month: payoff_row.month,
        payoff_years: f64::from(payoff_row.month) / 12.0,
        portfolio_total_at_payoff,
        longer_loan,
        longer_loan_balance_at_payoff: payoff_row.balance(longer_loan),
        crossover_month_with_tax: crossover_month(
            schedule,
            a,
            b,
            assumptions.capital_gains_tax_rate,
        ),
        crossover_month_without_tax: crossover_month(schedule, a, b, 0.0),
    })
}

/// First month at which the lead in after-tax portfolio value plus home
/// equity changes hands between the strategies.
///
/// `None` when the terms are equal, the portfolios are undefined, or the
/// lead never changes.
pub fn crossover_month(
    schedule: &ScheduleResult,
    a: &SolvedLoan,
    b: &SolvedLoan,
    tax_rate: f64,
) -> Option<u32> {
    if a.term_months == b.term_months {
        return None;
    }

    let position = |row: &ScheduleRow, side: LoanSide| -> Option<Money> {
        let value = row.portfolio_value(side)?;
        let after_tax = value - tax_at(tax_rate, row.portfolio_gain(side));
        let equity = loan_for(side, a, b).principal - row.balance(side);
        Some(after_tax + equity)
    };

    let mut previous: Option<f64> = None;
    for row in &schedule.rows {
        let diff = position(row, LoanSide::A)? - position(row, LoanSide::B)?;
        if let Some(prev) = previous {
            if prev * diff < 0.0 {
                return Some(row.month);
            }
        }
        previous = Some(diff);
    }
    None
}

/// Per-loan totals for the side-by-side table.
///
/// `break_even_rate` is the whole-schedule rate; it is shown for both loans
/// when their payments differ and omitted otherwise.
pub fn summarize_options(
    schedule: &ScheduleResult,
    a: &SolvedLoan,
    b: &SolvedLoan,
    assumptions: &ComparisonAssumptions,
    break_even_rate: Option<f64>,
) -> [OptionSummary; 2] {
    let totals = schedule.rows.iter().fold([0.0, 0.0], |acc, row| {
        [acc[0] + row.payment_a, acc[1] + row.payment_b]
    });
    let show_break_even = schedule.higher_payment.is_some();
    let end = &schedule.terminal;

    let summary = |side: LoanSide| {
        let loan = loan_for(side, a, b);
        let portfolio_value = end.portfolio_value(side);
        let portfolio_gain = end.portfolio_gain(side);
        let tax_amount = assumptions.tax_on(portfolio_gain);
        let pmi = schedule.pmi(side);
        let rate = if show_break_even { break_even_rate } else { None };

        OptionSummary {
            side,
            label: loan.label.clone(),
            payment_with_pmi: loan.payment_with_pmi,
            total_payment: totals[side.index()],
            total_interest: loan.total_interest,
            delta_sum: end.delta_sum,
            interest_saved: (schedule.lower_interest == Some(side))
                .then_some(end.interest_delta_sum),
            portfolio_value,
            portfolio_gain,
            tax_amount,
            after_tax_value: portfolio_value.map(|v| v - tax_amount),
            after_tax_gain: portfolio_gain.map(|g| g - tax_amount),
            break_even_rate: rate,
            break_even: BreakEvenLabel::for_schedule(rate),
            monthly_pmi: loan.monthly_pmi,
            pmi_last_month: pmi.last_month,
            pmi_total: pmi.last_month.map(|_| pmi.total),
        }
    };

    [summary(LoanSide::A), summary(LoanSide::B)]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
