//! Fixed-rate mortgage comparison: solve each loan for its one missing
//! field, then simulate both side by side month by month and work out the
//! reinvestment return at which the cheaper-interest loan stops winning.

pub mod annuity;
pub mod error;
pub mod loan;
pub mod solver;
pub mod types;

#[cfg(feature = "comparison")]
pub mod comparison;

pub use error::MortgageRoiError;
pub use types::*;

/// Standard result type for all mortgage-roi operations
pub type MortgageRoiResult<T> = Result<T, MortgageRoiError>;
