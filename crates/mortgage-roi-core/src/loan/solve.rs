use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::error::LoanSolveError;
use super::input::{LoanField, LoanInput, LoanUnknown};
use crate::annuity::{
    annual_percent_from_monthly_rate, monthly_rate_from_annual_percent, payment_from_rate,
    principal_from_payment,
};
use crate::error::MortgageRoiError;
use crate::solver::implied_monthly_rate;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::MortgageRoiResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// PMI is charged while the balance is above this share of the original principal.
pub const PMI_LTV_THRESHOLD: f64 = 0.78;

/// Longest term the solver accepts (100 years).
pub const MAX_TERM_MONTHS: u32 = 1200;

/// A term this close to a whole number of months is taken as that whole
/// number. Covers terms solved from a payment rounded to cents.
pub const TERM_SNAP_MONTHS: f64 = 0.01;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A fully determined fixed-rate loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvedLoan {
    pub label: String,
    /// The field that was blank and has been solved for.
    pub solved_for: LoanField,
    pub principal: Money,
    pub term_years: f64,
    /// `term_years × 12`; fractional when the term was solved for.
    pub term_months: f64,
    pub annual_rate_percent: f64,
    pub monthly_rate: Rate,
    /// Principal and interest only.
    pub monthly_payment: Money,
    pub payment_with_pmi: Money,
    pub monthly_pmi: Money,
    pub closing_costs: Money,
    /// First month whose closing balance is at or below 78% of principal.
    pub pmi_payoff_month: Option<u32>,
    /// PMI paid through `pmi_payoff_month`.
    pub pmi_total: Money,
    pub total_payment: Money,
    /// Total payment less principal, plus `pmi_total`.
    pub total_interest: Money,
}

impl SolvedLoan {
    pub fn has_pmi(&self) -> bool {
        self.monthly_pmi > 0.0
    }

    /// Balance above which PMI is still charged.
    pub fn pmi_threshold(&self) -> Money {
        self.principal * PMI_LTV_THRESHOLD
    }

    /// Whether `month` (1-based) falls within the loan term.
    pub fn is_active(&self, month: u32) -> bool {
        f64::from(month) <= self.term_months
    }

    /// Number of whole months in the term.
    pub fn whole_months(&self) -> u32 {
        self.term_months.floor() as u32
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Solve the one blank core field of `input` and derive the loan totals.
pub fn solve_loan(input: &LoanInput) -> Result<SolvedLoan, LoanSolveError> {
    let result = input.classify().and_then(|unknown| solve_unknown(input, unknown));
    if let Err(ref e) = result {
        debug!(label = %input.label, error = %e, "loan could not be solved");
    }
    result
}

/// [`solve_loan`] wrapped in the standard output envelope.
pub fn analyze_loan(input: &LoanInput) -> MortgageRoiResult<ComputationOutput<SolvedLoan>> {
    let start = Instant::now();

    let solved = solve_loan(input).map_err(|source| MortgageRoiError::Loan {
        label: input.label.clone(),
        source,
    })?;

    let mut warnings: Vec<String> = Vec::new();
    if solved.principal <= 0.0 {
        warnings.push(format!(
            "Principal {:.2} is not positive; PMI and amortisation are degenerate",
            solved.principal
        ));
    }
    if solved.annual_rate_percent < 0.0 {
        warnings.push(format!(
            "Negative interest rate {:.4}%",
            solved.annual_rate_percent
        ));
    }

    let methodology = match solved.solved_for {
        LoanField::Payment => "Level-payment annuity (payment from rate)",
        LoanField::Principal => "Level-payment annuity (principal from payment)",
        LoanField::Years => "Closed-form term from payment",
        LoanField::Rate => "Implied rate by bounded bisection",
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, solved))
}

// ---------------------------------------------------------------------------
// Solving
// ---------------------------------------------------------------------------

fn solve_unknown(input: &LoanInput, unknown: LoanUnknown) -> Result<SolvedLoan, LoanSolveError> {
    let missing_field = unknown.field();
    let invalid = || LoanSolveError::InvalidNumbers { missing_field };

    let (principal, term_years, annual_rate_percent) = match unknown {
        LoanUnknown::Payment {
            principal,
            years,
            rate_percent,
        } => (principal, years, rate_percent),
        LoanUnknown::Principal {
            years,
            rate_percent,
            payment,
        } => {
            let monthly_rate = monthly_rate_from_annual_percent(rate_percent);
            let principal =
                principal_from_payment(payment, monthly_rate, years * 12.0).ok_or_else(invalid)?;
            (principal, years, rate_percent)
        }
        LoanUnknown::Years {
            principal,
            rate_percent,
            payment,
        } => {
            let monthly_rate = monthly_rate_from_annual_percent(rate_percent);
            let years = solve_term_years(principal, monthly_rate, payment, missing_field)?;
            (principal, years, rate_percent)
        }
        LoanUnknown::Rate {
            principal,
            years,
            payment,
        } => {
            let monthly_rate =
                implied_monthly_rate(principal, years * 12.0, payment).ok_or_else(invalid)?;
            (principal, years, annual_percent_from_monthly_rate(monthly_rate))
        }
    };

    let term_months = snap_term_months(term_years * 12.0);
    let term_years = term_months / 12.0;
    let monthly_rate = monthly_rate_from_annual_percent(annual_rate_percent);
    let monthly_payment =
        payment_from_rate(principal, monthly_rate, term_months).ok_or_else(invalid)?;
    let total_payment = monthly_payment * term_months;

    let core = [
        principal,
        term_years,
        annual_rate_percent,
        monthly_payment,
        total_payment,
    ];
    if !core.iter().all(|v| v.is_finite()) {
        return Err(invalid());
    }
    if term_months > f64::from(MAX_TERM_MONTHS) {
        return Err(LoanSolveError::TermTooLong {
            months: term_months,
            limit: MAX_TERM_MONTHS,
            missing_field,
        });
    }

    let monthly_pmi = input.monthly_pmi_or_zero();
    let pmi_payoff_month = if monthly_pmi > 0.0 {
        pmi_payoff_month(principal, monthly_rate, monthly_payment, term_months)
    } else {
        None
    };
    let pmi_total = pmi_payoff_month.map_or(0.0, |m| monthly_pmi * f64::from(m));

    Ok(SolvedLoan {
        label: input.label.clone(),
        solved_for: missing_field,
        principal,
        term_years,
        term_months,
        annual_rate_percent,
        monthly_rate,
        monthly_payment,
        payment_with_pmi: monthly_payment + monthly_pmi,
        monthly_pmi,
        closing_costs: input.closing_costs_or_zero(),
        pmi_payoff_month,
        pmi_total,
        total_payment,
        total_interest: total_payment - principal + pmi_total,
    })
}

fn snap_term_months(months: f64) -> f64 {
    let whole = months.round();
    if (months - whole).abs() < TERM_SNAP_MONTHS {
        whole
    } else {
        months
    }
}

/// Term in years for a known payment, from
/// `n = −ln(1 − P·r/payment) / ln(1 + r)`.
fn solve_term_years(
    principal: Money,
    monthly_rate: Rate,
    payment: Money,
    missing_field: LoanField,
) -> Result<f64, LoanSolveError> {
    let years = if monthly_rate == 0.0 {
        principal / payment / 12.0
    } else {
        let inner = 1.0 - principal * monthly_rate / payment;
        if inner <= 0.0 {
            return Err(LoanSolveError::PaymentTooLow);
        }
        -inner.ln() / monthly_rate.ln_1p() / 12.0
    };

    if years.is_finite() {
        Ok(years)
    } else {
        Err(LoanSolveError::InvalidNumbers { missing_field })
    }
}

/// First month whose closing balance drops to 78% of principal or below,
/// simulating at most `term_months` months.
pub fn pmi_payoff_month(
    principal: Money,
    monthly_rate: Rate,
    monthly_payment: Money,
    term_months: f64,
) -> Option<u32> {
    if principal <= 0.0 {
        return None;
    }
    let threshold = principal * PMI_LTV_THRESHOLD;
    let mut balance = principal;
    let mut month: u32 = 1;
    while f64::from(month) <= term_months {
        let interest = balance * monthly_rate;
        let principal_paid = (monthly_payment - interest).min(balance);
        balance = (balance - principal_paid).max(0.0);
        if balance <= threshold {
            return Some(month);
        }
        month += 1;
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
