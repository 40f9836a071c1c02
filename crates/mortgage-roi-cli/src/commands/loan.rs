use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use mortgage_roi_core::loan::{self, LoanField, RawLoanInput, SolvedLoan};

use crate::input;
use crate::output::format::{format_currency, format_fixed, format_percent, NumberFormat};

/// Arguments for solving a single loan. Leave exactly one of principal,
/// years, rate and payment out.
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SolveArgs {
    /// Display name for the loan
    #[arg(long, default_value = "Loan")]
    pub label: String,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Term in years (may be fractional)
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Nominal annual rate in percent (6 = 6%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Monthly principal-and-interest payment
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Up-front closing costs
    #[arg(long)]
    pub closing_costs: Option<Decimal>,

    /// Monthly PMI while the balance is above 78% of principal
    #[arg(long)]
    pub pmi: Option<Decimal>,

    /// Purchase price; with --down-percent it replaces --principal
    #[arg(long)]
    pub purchase_price: Option<Decimal>,

    /// Down payment as a percent of the purchase price
    #[arg(long)]
    pub down_percent: Option<Decimal>,

    /// Path to a JSON or YAML loan file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

fn text(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl SolveArgs {
    fn to_raw(&self) -> RawLoanInput {
        RawLoanInput {
            label: self.label.clone(),
            principal: text(self.principal),
            years: text(self.years),
            rate: text(self.rate),
            payment: text(self.payment),
            closing_costs: text(self.closing_costs),
            pmi: text(self.pmi),
            purchase_price: text(self.purchase_price),
            down_percent: text(self.down_percent),
        }
    }
}

pub fn run_solve(args: SolveArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw: RawLoanInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        args.to_raw()
    };

    let parsed = raw.parse();
    let mut result = loan::analyze_loan(&parsed)?;
    if raw.has_partial_purchase() {
        result
            .warnings
            .push("Purchase price and down payment must both be given; principal left blank".into());
    }

    let headline = solved_headline(&result.result, &NumberFormat::default());
    let mut value = serde_json::to_value(result)?;
    value["result"]["headline"] = Value::String(headline);
    Ok(value)
}

/// One line naming the solved field and its value.
pub fn solved_headline(loan: &SolvedLoan, fmt: &NumberFormat) -> String {
    match loan.solved_for {
        LoanField::Payment => format!(
            "Monthly payment: {}",
            format_currency(Some(loan.monthly_payment), fmt)
        ),
        LoanField::Principal => format!(
            "Principal: {}",
            format_currency(Some(loan.principal), fmt)
        ),
        LoanField::Years => format!("Term: {} years", format_fixed(Some(loan.term_years), fmt)),
        LoanField::Rate => format!(
            "Rate: {}",
            format_percent(Some(loan.annual_rate_percent), fmt)
        ),
    }
}
