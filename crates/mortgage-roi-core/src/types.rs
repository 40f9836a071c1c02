use serde::{Deserialize, Serialize};

/// Monetary amounts. IEEE-754 so that runaway growth during bracket
/// expansion surfaces as a non-finite value instead of an overflow panic.
pub type Money = f64;

/// Rates expressed as decimals (0.005 = 0.5% per month) unless a field name
/// says `percent`.
pub type Rate = f64;

/// Which of the two compared options a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanSide {
    A,
    B,
}

impl LoanSide {
    pub fn other(self) -> Self {
        match self {
            LoanSide::A => LoanSide::B,
            LoanSide::B => LoanSide::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            LoanSide::A => 0,
            LoanSide::B => 1,
        }
    }

    /// Side holding the larger of two values, `None` on a tie.
    pub fn of_larger(a: f64, b: f64) -> Option<Self> {
        if a == b {
            None
        } else if a > b {
            Some(LoanSide::A)
        } else {
            Some(LoanSide::B)
        }
    }

    /// Side holding the smaller of two values, `None` on a tie.
    pub fn of_smaller(a: f64, b: f64) -> Option<Self> {
        LoanSide::of_larger(a, b).map(LoanSide::other)
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}
