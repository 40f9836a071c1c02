use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use mortgage_roi_core::comparison::{self, ComparisonInput};
use mortgage_roi_core::loan::{self, RawLoanInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Loan
// ---------------------------------------------------------------------------

#[napi]
pub fn solve_loan(input_json: String) -> NapiResult<String> {
    let input: RawLoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan::analyze_loan(&input.parse()).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_options(input_json: String) -> NapiResult<String> {
    let input: ComparisonInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = comparison::compare_options(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_schedule(input_json: String) -> NapiResult<String> {
    let input: ComparisonInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let (a, b) = input.solve_pair().map_err(to_napi_error)?;
    let schedule = comparison::build_schedule(&a, &b, input.monthly_return())
        .ok_or_else(|| to_napi_error("Neither loan runs for a full month"))?;
    serde_json::to_string(&schedule).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct BreakEvenInput {
    options: [RawLoanInput; 2],
}

#[napi]
pub fn break_even_rate(input_json: String) -> NapiResult<Option<f64>> {
    let input: BreakEvenInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let comparison_input = ComparisonInput {
        options: input.options,
        ..Default::default()
    };
    let (a, b) = comparison_input.solve_pair().map_err(to_napi_error)?;
    Ok(comparison::break_even_rate_over_schedule(&a, &b))
}
