use thiserror::Error;

use crate::loan::LoanSolveError;

#[derive(Debug, Error)]
pub enum MortgageRoiError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Loan '{label}' could not be solved: {source}")]
    Loan {
        label: String,
        #[source]
        source: LoanSolveError,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for MortgageRoiError {
    fn from(e: serde_json::Error) -> Self {
        MortgageRoiError::SerializationError(e.to_string())
    }
}
