use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::input::LoanField;

/// Why a loan descriptor could not be turned into a [`super::SolvedLoan`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoanSolveError {
    /// Not exactly one of principal / years / rate / payment was left blank.
    #[error("Leave exactly one of the following fields blank: principal, years, rate, payment.")]
    WrongBlankCount { blank: Vec<LoanField> },

    /// Solving for the term, but the payment never covers the interest.
    #[error("Payment is too low for this loan.")]
    PaymentTooLow,

    /// Term is longer than the schedule engine simulates.
    #[error("Loan term of {months:.0} months exceeds the {limit}-month limit.")]
    TermTooLong {
        months: f64,
        limit: u32,
        missing_field: LoanField,
    },

    /// A solved value came out non-finite.
    #[error("Please enter valid numbers.")]
    InvalidNumbers { missing_field: LoanField },
}

impl LoanSolveError {
    /// The field the user left blank, when one can be identified.
    pub fn missing_field(&self) -> Option<LoanField> {
        match self {
            LoanSolveError::WrongBlankCount { blank } => blank.first().copied(),
            LoanSolveError::PaymentTooLow => Some(LoanField::Years),
            LoanSolveError::TermTooLong { missing_field, .. }
            | LoanSolveError::InvalidNumbers { missing_field } => Some(*missing_field),
        }
    }
}

/// Serialisable form of a [`LoanSolveError`] for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanErrorRecord {
    pub error_message: String,
    pub missing_field: Option<LoanField>,
}

impl From<&LoanSolveError> for LoanErrorRecord {
    fn from(e: &LoanSolveError) -> Self {
        LoanErrorRecord {
            error_message: e.to_string(),
            missing_field: e.missing_field(),
        }
    }
}
