use serde::{Deserialize, Serialize};

use super::break_even::{break_even_rate_at_month, BreakEvenLabel};
use crate::loan::{SolvedLoan, MAX_TERM_MONTHS};
use crate::types::{LoanSide, Money, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One simulated month for both loans and both reinvestment strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub month: u32,
    /// Scheduled payment: P&I plus PMI while PMI is active, zero after payoff.
    pub payment_a: Money,
    pub payment_b: Money,
    pub principal_paid_a: Money,
    pub principal_paid_b: Money,
    /// Interest only; PMI is not included.
    pub interest_paid_a: Money,
    pub interest_paid_b: Money,
    pub balance_a: Money,
    pub balance_b: Money,
    /// Cumulative payment delta, higher-payment loan minus lower-payment loan.
    pub delta_sum: Money,
    /// Cumulative interest+PMI delta, higher-interest loan minus lower-interest loan.
    pub interest_delta_sum: Money,
    pub portfolio_value_a: Option<Money>,
    pub portfolio_gain_a: Option<Money>,
    pub portfolio_value_b: Option<Money>,
    pub portfolio_gain_b: Option<Money>,
    /// Annual effective reinvestment return (percent) at which both
    /// strategies end this month with equal net wealth.
    pub break_even_rate: Option<f64>,
    pub break_even: BreakEvenLabel,
}

impl ScheduleRow {
    pub fn payment(&self, side: LoanSide) -> Money {
        pick(side, self.payment_a, self.payment_b)
    }

    pub fn balance(&self, side: LoanSide) -> Money {
        pick(side, self.balance_a, self.balance_b)
    }

    pub fn portfolio_value(&self, side: LoanSide) -> Option<Money> {
        pick(side, self.portfolio_value_a, self.portfolio_value_b)
    }

    pub fn portfolio_gain(&self, side: LoanSide) -> Option<Money> {
        pick(side, self.portfolio_gain_a, self.portfolio_gain_b)
    }
}

fn pick<T>(side: LoanSide, a: T, b: T) -> T {
    match side {
        LoanSide::A => a,
        LoanSide::B => b,
    }
}

/// PMI actually charged over the simulated schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PmiUsage {
    pub months: u32,
    pub last_month: Option<u32>,
    pub total: Money,
}

/// Who invests what, and from which month.
///
/// The primary strategy belongs to the lower-payment loan (A when the
/// payments are equal) and invests the payment difference every month. The
/// alternate strategy belongs to the other loan and invests that loan's full
/// P&I payment once its term has ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyPlan {
    pub primary: LoanSide,
    /// `|payment_a − payment_b|`, P&I only.
    pub payment_delta: Money,
    pub alternate_payment: Money,
    pub alternate_term_months: f64,
    /// Month-0 deposit: the other loan's closing costs plus any principal
    /// this loan borrows beyond the other.
    pub seed_a: Money,
    pub seed_b: Money,
}

impl StrategyPlan {
    pub fn new(a: &SolvedLoan, b: &SolvedLoan) -> Self {
        let primary =
            LoanSide::of_smaller(a.monthly_payment, b.monthly_payment).unwrap_or(LoanSide::A);
        let alternate = pick(primary.other(), a, b);
        let principal_delta = b.principal - a.principal;

        StrategyPlan {
            primary,
            payment_delta: (a.monthly_payment - b.monthly_payment).abs(),
            alternate_payment: alternate.monthly_payment,
            alternate_term_months: alternate.term_months,
            seed_a: b.closing_costs + (-principal_delta).max(0.0),
            seed_b: a.closing_costs + principal_delta.max(0.0),
        }
    }

    pub fn seed(&self, side: LoanSide) -> Money {
        pick(side, self.seed_a, self.seed_b)
    }

    /// Amount invested in each month the strategy contributes.
    pub fn contribution_amount(&self, side: LoanSide) -> Money {
        if side == self.primary {
            if self.payment_delta.is_finite() {
                self.payment_delta
            } else {
                0.0
            }
        } else if self.alternate_payment > 0.0 {
            self.alternate_payment
        } else {
            0.0
        }
    }

    /// Contribution made at the end of `month`.
    pub fn contribution(&self, side: LoanSide, month: u32) -> Money {
        if side == self.primary || f64::from(month) > self.alternate_term_months {
            self.contribution_amount(side)
        } else {
            0.0
        }
    }

    /// Number of contributing months in `1..=month`.
    pub fn contribution_months(&self, side: LoanSide, month: u32) -> u32 {
        if side == self.primary {
            month
        } else {
            month.saturating_sub(self.alternate_term_months.floor() as u32)
        }
    }
}

/// Month-by-month simulation of two loans and the two reinvestment strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub rows: Vec<ScheduleRow>,
    /// Loan with the higher P&I payment, `None` when equal.
    pub higher_payment: Option<LoanSide>,
    pub lower_payment: Option<LoanSide>,
    /// Loan with the smaller lifetime interest, `None` when equal.
    pub lower_interest: Option<LoanSide>,
    pub strategy: StrategyPlan,
    pub pmi_a: PmiUsage,
    pub pmi_b: PmiUsage,
    /// Last row of the schedule.
    pub terminal: ScheduleRow,
}

impl ScheduleResult {
    /// Row for a 1-based month.
    pub fn row(&self, month: u32) -> Option<&ScheduleRow> {
        month
            .checked_sub(1)
            .and_then(|index| self.rows.get(index as usize))
    }

    pub fn pmi(&self, side: LoanSide) -> &PmiUsage {
        pick(side, &self.pmi_a, &self.pmi_b)
    }

    pub fn months(&self) -> u32 {
        self.terminal.month
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate both loans side by side through the longer term.
///
/// `monthly_return` is the reinvestment rate per month; `None` or a
/// non-finite value leaves every portfolio figure undefined. Returns `None`
/// when the longer term is shorter than one month or longer than
/// [`MAX_TERM_MONTHS`].
pub fn build_schedule(
    a: &SolvedLoan,
    b: &SolvedLoan,
    monthly_return: Option<Rate>,
) -> Option<ScheduleResult> {
    let mut simulation = Simulation::new(a, b, monthly_return, true)?;
    let rows: Vec<ScheduleRow> = simulation.by_ref().collect();
    let terminal = rows.last()?.clone();

    let [track_a, track_b] = simulation.tracks;
    Some(ScheduleResult {
        higher_payment: simulation.higher_payment,
        lower_payment: simulation.higher_payment.map(LoanSide::other),
        lower_interest: simulation.lower_interest,
        strategy: simulation.plan,
        pmi_a: track_a.pmi,
        pmi_b: track_b.pmi,
        terminal,
        rows,
    })
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct LoanTrack<'a> {
    loan: &'a SolvedLoan,
    balance: Money,
    pmi: PmiUsage,
}

#[derive(Debug, Clone, Copy)]
struct LoanMonth {
    payment: Money,
    principal_paid: Money,
    interest_paid: Money,
    pmi_paid: Money,
}

impl<'a> LoanTrack<'a> {
    fn new(loan: &'a SolvedLoan) -> Self {
        LoanTrack {
            loan,
            balance: loan.principal,
            pmi: PmiUsage::default(),
        }
    }

    fn advance(&mut self, month: u32) -> LoanMonth {
        let loan = self.loan;
        if !loan.is_active(month) {
            self.balance = 0.0;
            return LoanMonth {
                payment: 0.0,
                principal_paid: 0.0,
                interest_paid: 0.0,
                pmi_paid: 0.0,
            };
        }

        let pmi_paid = if loan.has_pmi() && self.balance > loan.pmi_threshold() {
            loan.monthly_pmi
        } else {
            0.0
        };
        if pmi_paid > 0.0 {
            self.pmi.months += 1;
            self.pmi.last_month = Some(month);
            self.pmi.total += pmi_paid;
        }

        let interest_paid = self.balance * loan.monthly_rate;
        let principal_paid = (loan.monthly_payment - interest_paid)
            .max(0.0)
            .min(self.balance);
        self.balance = (self.balance - principal_paid).max(0.0);

        LoanMonth {
            payment: loan.monthly_payment + pmi_paid,
            principal_paid,
            interest_paid,
            pmi_paid,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Portfolio {
    value: Money,
    contributed: Money,
}

impl Portfolio {
    fn seeded(seed: Money) -> Self {
        Portfolio {
            value: seed,
            contributed: seed,
        }
    }

    /// Ordinary annuity step: growth first, contribution at month end.
    fn grow(&mut self, monthly_return: Rate, contribution: Money) {
        self.value = self.value * (1.0 + monthly_return) + contribution;
        self.contributed += contribution;
    }

    fn gain(&self) -> Money {
        self.value - self.contributed
    }
}

/// Iterator over schedule rows. Trial simulations used by the whole-schedule
/// break-even search skip the per-row break-even solve; their rows carry no
/// break-even rate.
#[derive(Debug, Clone)]
pub(crate) struct Simulation<'a> {
    tracks: [LoanTrack<'a>; 2],
    plan: StrategyPlan,
    monthly_return: Option<Rate>,
    portfolios: [Portfolio; 2],
    higher_payment: Option<LoanSide>,
    lower_interest: Option<LoanSide>,
    delta_sum: Money,
    interest_delta_sum: Money,
    month: u32,
    last_month: u32,
    solve_break_even: bool,
}

impl<'a> Simulation<'a> {
    pub(crate) fn new(
        a: &'a SolvedLoan,
        b: &'a SolvedLoan,
        monthly_return: Option<Rate>,
        solve_break_even: bool,
    ) -> Option<Self> {
        let last_month = a.whole_months().max(b.whole_months());
        if last_month == 0 || last_month > MAX_TERM_MONTHS {
            return None;
        }

        let plan = StrategyPlan::new(a, b);
        Some(Simulation {
            tracks: [LoanTrack::new(a), LoanTrack::new(b)],
            plan,
            monthly_return: monthly_return.filter(|r| r.is_finite()),
            portfolios: [
                Portfolio::seeded(plan.seed(LoanSide::A)),
                Portfolio::seeded(plan.seed(LoanSide::B)),
            ],
            higher_payment: LoanSide::of_larger(a.monthly_payment, b.monthly_payment),
            lower_interest: LoanSide::of_smaller(a.total_interest, b.total_interest),
            delta_sum: 0.0,
            interest_delta_sum: 0.0,
            month: 0,
            last_month,
            solve_break_even,
        })
    }
}

impl Iterator for Simulation<'_> {
    type Item = ScheduleRow;

    fn next(&mut self) -> Option<ScheduleRow> {
        if self.month >= self.last_month {
            return None;
        }
        self.month += 1;
        let month = self.month;

        let months = [self.tracks[0].advance(month), self.tracks[1].advance(month)];
        let of = |side: LoanSide| months[side.index()];

        let higher = self.higher_payment.unwrap_or(LoanSide::B);
        self.delta_sum += of(higher).payment - of(higher.other()).payment;

        if let Some(lower) = self.lower_interest {
            let cost = |m: LoanMonth| m.interest_paid + m.pmi_paid;
            self.interest_delta_sum += cost(of(lower.other())) - cost(of(lower));
        }

        let (values, gains) = match self.monthly_return {
            Some(rate) => {
                for side in [LoanSide::A, LoanSide::B] {
                    let contribution = self.plan.contribution(side, month);
                    self.portfolios[side.index()].grow(rate, contribution);
                }
                let [pa, pb] = self.portfolios;
                (
                    [Some(pa.value), Some(pb.value)],
                    [Some(pa.gain()), Some(pb.gain())],
                )
            }
            None => ([None, None], [None, None]),
        };

        let break_even_rate = if self.solve_break_even {
            break_even_rate_at_month(&self.plan, month, self.interest_delta_sum, self.lower_interest)
        } else {
            None
        };

        let [ma, mb] = months;
        Some(ScheduleRow {
            month,
            payment_a: ma.payment,
            payment_b: mb.payment,
            principal_paid_a: ma.principal_paid,
            principal_paid_b: mb.principal_paid,
            interest_paid_a: ma.interest_paid,
            interest_paid_b: mb.interest_paid,
            balance_a: self.tracks[0].balance,
            balance_b: self.tracks[1].balance,
            delta_sum: self.delta_sum,
            interest_delta_sum: self.interest_delta_sum,
            portfolio_value_a: values[0],
            portfolio_gain_a: gains[0],
            portfolio_value_b: values[1],
            portfolio_gain_b: gains[1],
            break_even_rate,
            break_even: BreakEvenLabel::classify(self.interest_delta_sum, break_even_rate),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::{solve_loan, LoanInput};
    use approx::assert_relative_eq;

    fn solved(principal: f64, years: f64, rate: f64) -> SolvedLoan {
        solve_loan(&LoanInput {
            label: format!("{years}y"),
            principal: Some(principal),
            term_years: Some(years),
            annual_rate_percent: Some(rate),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_rows_cover_longer_term() {
        let a = solved(350_000.0, 30.0, 6.0);
        let b = solved(350_000.0, 15.0, 5.5);
        let schedule = build_schedule(&a, &b, None).unwrap();
        assert_eq!(schedule.rows.len(), 360);
        assert_eq!(schedule.months(), 360);
        assert_eq!(schedule.higher_payment, Some(LoanSide::B));
        assert_eq!(schedule.lower_payment, Some(LoanSide::A));
        assert_eq!(schedule.lower_interest, Some(LoanSide::B));
        assert_eq!(schedule.strategy.primary, LoanSide::A);
    }

    #[test]
    fn test_loan_pays_off_at_term() {
        let a = solved(350_000.0, 30.0, 6.0);
        let b = solved(350_000.0, 15.0, 5.5);
        let schedule = build_schedule(&a, &b, None).unwrap();

        let at_payoff = schedule.row(180).unwrap();
        assert!(at_payoff.balance_b < 1e-6);
        let after = schedule.row(181).unwrap();
        assert_eq!(after.payment_b, 0.0);
        assert_eq!(after.interest_paid_b, 0.0);
        assert_eq!(after.balance_b, 0.0);
        assert!(schedule.terminal.balance_a < 1e-6);
    }

    #[test]
    fn test_delta_sum_accumulates_payment_gap() {
        let a = solved(350_000.0, 30.0, 6.0);
        let b = solved(350_000.0, 15.0, 5.5);
        let schedule = build_schedule(&a, &b, None).unwrap();
        let gap = b.monthly_payment - a.monthly_payment;
        assert_relative_eq!(schedule.row(1).unwrap().delta_sum, gap, epsilon = 1e-9);
        assert_relative_eq!(
            schedule.row(180).unwrap().delta_sum,
            gap * 180.0,
            max_relative = 1e-12
        );
        // After B is paid off, A's payment counts against the gap.
        let after = schedule.row(181).unwrap();
        assert_relative_eq!(
            after.delta_sum,
            gap * 180.0 - a.monthly_payment,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_portfolios_undefined_without_rate() {
        let a = solved(350_000.0, 30.0, 6.0);
        let b = solved(350_000.0, 15.0, 5.5);
        let schedule = build_schedule(&a, &b, Some(f64::NAN)).unwrap();
        assert!(schedule.rows.iter().all(|r| r.portfolio_value_a.is_none()
            && r.portfolio_gain_b.is_none()));
    }

    #[test]
    fn test_portfolio_is_ordinary_annuity() {
        let a = solved(350_000.0, 30.0, 6.0);
        let b = solved(350_000.0, 15.0, 5.5);
        let r = 0.008;
        let schedule = build_schedule(&a, &b, Some(r)).unwrap();
        let delta = b.monthly_payment - a.monthly_payment;

        let row = schedule.row(120).unwrap();
        let expected = crate::annuity::annuity_future_value(delta, 120.0, r);
        assert_relative_eq!(row.portfolio_value_a.unwrap(), expected, max_relative = 1e-9);
        assert_relative_eq!(
            row.portfolio_gain_a.unwrap(),
            expected - delta * 120.0,
            max_relative = 1e-9
        );
        // B invests only after its own payoff.
        assert_eq!(row.portfolio_value_b, Some(0.0));
        let later = schedule.row(181).unwrap();
        assert_relative_eq!(later.portfolio_value_b.unwrap(), b.monthly_payment, epsilon = 1e-9);
    }

    #[test]
    fn test_seeds_from_closing_costs_and_principal_gap() {
        let mut a = solved(300_000.0, 30.0, 6.0);
        let mut b = solved(350_000.0, 30.0, 5.0);
        a.closing_costs = 4_000.0;
        b.closing_costs = 1_000.0;
        let plan = StrategyPlan::new(&a, &b);
        assert_eq!(plan.seed_a, 1_000.0);
        assert_eq!(plan.seed_b, 4_000.0 + 50_000.0);
    }

    #[test]
    fn test_strategy_follows_lower_payment() {
        let a = solved(350_000.0, 15.0, 5.5);
        let b = solved(350_000.0, 30.0, 6.0);
        let plan = StrategyPlan::new(&a, &b);
        assert_eq!(plan.primary, LoanSide::B);
        assert_eq!(plan.alternate_payment, a.monthly_payment);
        assert_eq!(plan.contribution(LoanSide::A, 180), 0.0);
        assert_eq!(plan.contribution(LoanSide::A, 181), a.monthly_payment);
        assert_eq!(plan.contribution_months(LoanSide::A, 200), 20);
        assert_eq!(plan.contribution_months(LoanSide::B, 200), 200);
    }

    #[test]
    fn test_pmi_usage_tracks_schedule() {
        let a = solve_loan(&LoanInput {
            label: "A".into(),
            principal: Some(300_000.0),
            term_years: Some(30.0),
            annual_rate_percent: Some(6.0),
            monthly_pmi: Some(120.0),
            ..Default::default()
        })
        .unwrap();
        let b = solved(300_000.0, 15.0, 5.5);
        let schedule = build_schedule(&a, &b, None).unwrap();
        let usage = schedule.pmi(LoanSide::A);

        assert_eq!(usage.last_month, Some(usage.months));
        assert_relative_eq!(usage.total, 120.0 * f64::from(usage.months), epsilon = 1e-9);
        assert_eq!(a.pmi_payoff_month, Some(usage.months));
        let first = schedule.row(1).unwrap();
        assert_relative_eq!(first.payment_a, a.monthly_payment + 120.0, epsilon = 1e-9);
        assert_eq!(schedule.pmi(LoanSide::B).months, 0);
    }

    #[test]
    fn test_term_solved_from_rounded_payment_runs_to_payoff() {
        let a = solve_loan(&LoanInput {
            label: "A".into(),
            principal: Some(350_000.0),
            annual_rate_percent: Some(6.0),
            monthly_payment: Some(2098.43),
            ..Default::default()
        })
        .unwrap();
        let b = solved(350_000.0, 15.0, 5.5);
        let schedule = build_schedule(&a, &b, None).unwrap();
        assert_eq!(schedule.rows.len(), 360);
        assert!(schedule.terminal.balance_a < 1e-6);
    }

    #[test]
    fn test_sub_month_terms_have_no_schedule() {
        let mut a = solved(1_000.0, 1.0, 5.0);
        let mut b = a.clone();
        a.term_months = 0.5;
        b.term_months = 0.9;
        assert!(build_schedule(&a, &b, None).is_none());
    }

    #[test]
    fn test_trial_simulation_skips_break_even() {
        let a = solved(350_000.0, 30.0, 6.0);
        let b = solved(350_000.0, 15.0, 5.5);
        let last = Simulation::new(&a, &b, Some(0.005), false)
            .unwrap()
            .last()
            .unwrap();
        let full = build_schedule(&a, &b, Some(0.005)).unwrap();
        assert_eq!(last.break_even_rate, None);
        assert_eq!(last.portfolio_value_a, full.terminal.portfolio_value_a);
        assert_eq!(last.interest_delta_sum, full.terminal.interest_delta_sum);
    }
}
