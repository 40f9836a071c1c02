//! Side-by-side comparison of two loans with the payment difference
//! reinvested.

pub mod break_even;
pub mod outcome;
pub mod schedule;

pub use break_even::{
    break_even_rate_at_month, break_even_rate_over_schedule, BreakEvenLabel,
    UNBOUNDED_RATE_PERCENT,
};
pub use outcome::{
    crossover_month, lowest_interest, summarize_options, summarize_outcome,
    ComparisonAssumptions, OptionSummary, OutcomeSummary,
};
pub use schedule::{build_schedule, PmiUsage, ScheduleResult, ScheduleRow, StrategyPlan};

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::annuity::{monthly_effective_rate, parse_number};
use crate::error::MortgageRoiError;
use crate::loan::input::text_or_number;
use crate::loan::{solve_loan, LoanErrorRecord, LoanInput, RawLoanInput, SolvedLoan};
use crate::types::{with_metadata, ComputationOutput, LoanSide, Rate};
use crate::MortgageRoiResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Two loan options as entered plus the expected reinvestment return.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub options: [RawLoanInput; 2],
    /// Expected annual return in percent; blank leaves every portfolio
    /// figure undefined.
    #[serde(default, deserialize_with = "text_or_number")]
    pub reinvestment_rate_percent: String,
    #[serde(default)]
    pub assumptions: ComparisonAssumptions,
}

impl ComparisonInput {
    pub fn reinvestment_rate(&self) -> Option<f64> {
        parse_number(&self.reinvestment_rate_percent)
    }

    /// Monthly rate compounding to the reinvestment rate over a year. `None`
    /// when blank, or when the rate is below -100% and has no monthly root.
    pub fn monthly_return(&self) -> Option<Rate> {
        self.reinvestment_rate()
            .map(|percent| monthly_effective_rate(percent / 100.0))
            .filter(|rate| rate.is_finite())
    }

    /// Parsed option, with a default label when none was given.
    pub fn loan_input(&self, side: LoanSide) -> LoanInput {
        let mut input = self.options[side.index()].parse();
        if input.label.trim().is_empty() {
            input.label = default_label(side).to_string();
        }
        input
    }

    /// Solve both options, failing on the first that cannot be solved.
    pub fn solve_pair(&self) -> MortgageRoiResult<(SolvedLoan, SolvedLoan)> {
        let solve = |side: LoanSide| {
            let input = self.loan_input(side);
            solve_loan(&input).map_err(|source| MortgageRoiError::Loan {
                label: input.label.clone(),
                source,
            })
        };
        Ok((solve(LoanSide::A)?, solve(LoanSide::B)?))
    }
}

fn default_label(side: LoanSide) -> &'static str {
    match side {
        LoanSide::A => "Option A",
        LoanSide::B => "Option B",
    }
}

/// Result of solving one option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoanOutcome {
    Solved(SolvedLoan),
    Failed(LoanErrorRecord),
}

impl LoanOutcome {
    pub fn solved(&self) -> Option<&SolvedLoan> {
        match self {
            LoanOutcome::Solved(loan) => Some(loan),
            LoanOutcome::Failed(_) => None,
        }
    }
}

/// Everything derived once both loans are solved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvedComparison {
    pub lowest_interest: Option<LoanSide>,
    /// Whole-schedule break-even return (annual effective percent).
    pub break_even_rate_percent: Option<f64>,
    pub options: [OptionSummary; 2],
    /// Absent when the reinvestment rate is undefined.
    pub outcome: Option<OutcomeSummary>,
    pub schedule: ScheduleResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonOutput {
    pub loans: [LoanOutcome; 2],
    pub reinvestment_rate_percent: Option<f64>,
    pub monthly_return: Option<Rate>,
    /// Absent unless both loans solved.
    pub comparison: Option<SolvedComparison>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Schedule, totals, break-even rate and outcome for two solved loans.
///
/// `None` only when neither loan runs for a full month.
pub fn compare_solved(
    a: &SolvedLoan,
    b: &SolvedLoan,
    monthly_return: Option<Rate>,
    assumptions: &ComparisonAssumptions,
) -> Option<SolvedComparison> {
    let schedule = build_schedule(a, b, monthly_return)?;
    let break_even_rate_percent = break_even_rate_over_schedule(a, b);

    Some(SolvedComparison {
        lowest_interest: lowest_interest(a, b),
        break_even_rate_percent,
        options: summarize_options(&schedule, a, b, assumptions, break_even_rate_percent),
        outcome: summarize_outcome(&schedule, a, b, assumptions),
        schedule,
    })
}

/// Solve both options and, when both succeed, compare them.
///
/// Loans that cannot be solved are reported in the output rather than as an
/// error; only invalid assumptions fail the call.
pub fn compare_options(
    input: &ComparisonInput,
) -> MortgageRoiResult<ComputationOutput<ComparisonOutput>> {
    let start = Instant::now();
    input.assumptions.validate()?;

    let mut warnings: Vec<String> = Vec::new();

    let sides = [LoanSide::A, LoanSide::B];
    let loans = sides.map(|side| {
        let loan_input = input.loan_input(side);
        if input.options[side.index()].has_partial_purchase() {
            warnings.push(format!(
                "{}: enter both purchase price and down payment to derive the principal",
                loan_input.label
            ));
        }
        match solve_loan(&loan_input) {
            Ok(loan) => LoanOutcome::Solved(loan),
            Err(e) => {
                warnings.push(format!("{}: {}", loan_input.label, e));
                LoanOutcome::Failed(LoanErrorRecord::from(&e))
            }
        }
    });

    let reinvestment_rate_percent = input.reinvestment_rate();
    let monthly_return = input.monthly_return();
    if monthly_return.is_none() {
        warnings.push(
            "Reinvestment rate is undefined; portfolio values and the outcome are omitted"
                .to_string(),
        );
    }

    let comparison = match (loans[0].solved(), loans[1].solved()) {
        (Some(a), Some(b)) => {
            let comparison = compare_solved(a, b, monthly_return, &input.assumptions);
            match &comparison {
                None => warnings.push("Neither loan runs for a full month".to_string()),
                Some(c) => {
                    if c.break_even_rate_percent.is_none() && c.schedule.higher_payment.is_some() {
                        warnings.push("No whole-schedule break-even rate was found".to_string());
                    }
                }
            }
            comparison
        }
        _ => {
            debug!("comparison skipped: at least one loan is unsolved");
            None
        }
    };

    let output = ComparisonOutput {
        loans,
        reinvestment_rate_percent,
        monthly_return,
        comparison,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Side-by-side amortisation with ordinary-annuity reinvestment of the payment difference",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
