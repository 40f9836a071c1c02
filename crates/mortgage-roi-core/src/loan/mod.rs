//! Loan descriptors and the solver that fills in the one blank field.

pub mod error;
pub mod input;
pub mod solve;

pub use error::{LoanErrorRecord, LoanSolveError};
pub use input::{principal_from_purchase, LoanField, LoanInput, LoanUnknown, RawLoanInput};
pub use solve::{
    analyze_loan, pmi_payoff_month, solve_loan, SolvedLoan, MAX_TERM_MONTHS, PMI_LTV_THRESHOLD,
    TERM_SNAP_MONTHS,
};
