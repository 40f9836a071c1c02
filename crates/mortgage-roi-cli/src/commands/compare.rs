use clap::Args;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tracing::debug;

use mortgage_roi_core::comparison::{
    self, break_even_rate_over_schedule, build_schedule, lowest_interest, BreakEvenLabel,
    ComparisonInput, ComparisonOutput, OutcomeSummary,
};
use mortgage_roi_core::loan::SolvedLoan;
use mortgage_roi_core::LoanSide;

use crate::input;
use crate::output::format::{format_currency, NumberFormat};

/// Arguments for a full two-option comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to a JSON or YAML comparison file
    #[arg(long)]
    pub input: Option<String>,

    /// Expected annual reinvestment return in percent (overrides the file)
    #[arg(long, allow_hyphen_values = true)]
    pub reinvestment_rate: Option<Decimal>,

    /// Capital gains tax rate on portfolio gains (e.g. 0.15)
    #[arg(long)]
    pub tax_rate: Option<Decimal>,
}

/// Arguments for the monthly ledger
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to a JSON or YAML comparison file
    #[arg(long)]
    pub input: Option<String>,

    /// Expected annual reinvestment return in percent (overrides the file)
    #[arg(long, allow_hyphen_values = true)]
    pub reinvestment_rate: Option<Decimal>,

    /// Only emit the last month of each year
    #[arg(long)]
    pub yearly: bool,
}

/// Arguments for the whole-schedule break-even rate
#[derive(Args)]
pub struct BreakEvenArgs {
    /// Path to a JSON or YAML comparison file
    #[arg(long)]
    pub input: Option<String>,
}

fn load(path: &Option<String>) -> Result<ComparisonInput, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_input(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(data)
    } else {
        Err("--input <file.json|file.yaml> or stdin required for comparisons".into())
    }
}

fn apply_overrides(
    input: &mut ComparisonInput,
    reinvestment_rate: Option<Decimal>,
    tax_rate: Option<Decimal>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(rate) = reinvestment_rate {
        input.reinvestment_rate_percent = rate.to_string();
    }
    if let Some(rate) = tax_rate {
        if rate < Decimal::ZERO || rate > dec!(1) {
            return Err("--tax-rate must be between 0 and 1".into());
        }
        input.assumptions.capital_gains_tax_rate =
            rate.to_f64().ok_or("--tax-rate is out of range")?;
    }
    Ok(())
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut input = load(&args.input)?;
    apply_overrides(&mut input, args.reinvestment_rate, args.tax_rate)?;

    let output = comparison::compare_options(&input)?;
    let fmt = NumberFormat::default();
    let lines = headline_lines(&output.result, &fmt);

    let mut value = serde_json::to_value(output)?;
    if let Some((headline, payoff)) = lines {
        value["result"]["headline"] = Value::String(headline);
        value["result"]["payoff_note"] = Value::String(payoff);
    }
    Ok(value)
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut input = load(&args.input)?;
    apply_overrides(&mut input, args.reinvestment_rate, None)?;

    let (a, b) = input.solve_pair()?;
    let schedule = build_schedule(&a, &b, input.monthly_return())
        .ok_or("Neither loan runs for a full month")?;
    debug!(months = schedule.rows.len(), "schedule built");

    let last = schedule.months();
    let rows: Vec<_> = schedule
        .rows
        .into_iter()
        .filter(|row| !args.yearly || row.month % 12 == 0 || row.month == last)
        .collect();
    Ok(serde_json::to_value(rows)?)
}

pub fn run_break_even(args: BreakEvenArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = load(&args.input)?;
    let (a, b) = input.solve_pair()?;
    Ok(break_even_value(&a, &b))
}

fn break_even_value(a: &SolvedLoan, b: &SolvedLoan) -> Value {
    let rate = break_even_rate_over_schedule(a, b);
    let lowest = lowest_interest(a, b).map(|side| label_of(side, a, b).to_string());
    json!({
        "result": {
            "break_even_rate_percent": rate,
            "break_even": BreakEvenLabel::for_schedule(rate).to_string(),
            "lowest_interest": lowest.unwrap_or_else(|| "either option".to_string()),
        }
    })
}

fn label_of<'a>(side: LoanSide, a: &'a SolvedLoan, b: &'a SolvedLoan) -> &'a str {
    match side {
        LoanSide::A => &a.label,
        LoanSide::B => &b.label,
    }
}

/// Winner sentence and payoff sentence, when an outcome exists.
pub fn headline_lines(output: &ComparisonOutput, fmt: &NumberFormat) -> Option<(String, String)> {
    let comparison = output.comparison.as_ref()?;
    let outcome = comparison.outcome.as_ref()?;
    let a = output.loans[0].solved()?;
    let b = output.loans[1].solved()?;
    Some((winner_sentence(outcome, a, b, fmt), payoff_sentence(outcome, fmt)))
}

fn winner_sentence(
    outcome: &OutcomeSummary,
    a: &SolvedLoan,
    b: &SolvedLoan,
    fmt: &NumberFormat,
) -> String {
    match outcome.winner {
        None => "Both strategies end with the same net wealth".to_string(),
        Some(side) => {
            let years = match side {
                LoanSide::A => a.term_years,
                LoanSide::B => b.term_years,
            };
            format!(
                "{} more wealth with {} after {} years",
                format_currency(Some(outcome.difference), fmt),
                label_of(side, a, b),
                years.round()
            )
        }
    }
}

fn payoff_sentence(outcome: &OutcomeSummary, fmt: &NumberFormat) -> String {
    format!(
        "Portfolio of {} after {} years against a remaining balance of {}; net {}",
        format_currency(Some(outcome.portfolio_total_at_payoff), fmt),
        outcome.payoff_years.round(),
        format_currency(Some(outcome.longer_loan_balance_at_payoff), fmt),
        format_currency(Some(outcome.net_gain_at_payoff()), fmt),
    )
}
