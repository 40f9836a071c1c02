//! Annuity primitives shared by the loan solver and the schedule engine.
//!
//! Every function is total: an input that cannot produce a finite answer
//! yields `None` rather than NaN, except [`annuity_future_value`], which
//! treats a missing contribution as contributing nothing.

use crate::types::{Money, Rate};

const MONTHS_PER_YEAR: f64 = 12.0;

/// Parse user-entered text. Blank, unparsable or non-finite text is absent.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn has_periods(months: f64) -> bool {
    months.is_finite() && months > 0.0
}

/// Level payment that amortises `principal` over `months` at `monthly_rate`.
///
/// `P·r / (1 − (1+r)^−n)`, or `P/n` at a zero rate.
pub fn payment_from_rate(principal: Money, monthly_rate: Rate, months: f64) -> Option<Money> {
    if !has_periods(months) || !principal.is_finite() {
        return None;
    }
    let payment = if monthly_rate == 0.0 {
        principal / months
    } else {
        principal * monthly_rate / (1.0 - (1.0 + monthly_rate).powf(-months))
    };
    Some(payment).filter(|p| p.is_finite())
}

/// Principal a level `payment` amortises over `months` at `monthly_rate`.
pub fn principal_from_payment(payment: Money, monthly_rate: Rate, months: f64) -> Option<Money> {
    if !payment.is_finite() || !has_periods(months) {
        return None;
    }
    let principal = if monthly_rate == 0.0 {
        payment * months
    } else {
        payment * (1.0 - (1.0 + monthly_rate).powf(-months)) / monthly_rate
    };
    Some(principal).filter(|p| p.is_finite())
}

/// Future value of `months` end-of-period contributions of `payment`.
///
/// A non-finite payment or a non-positive period count contributes nothing
/// and returns `0.0`. The result may be infinite for extreme trial rates;
/// callers running a root search treat that as an unusable bracket.
pub fn annuity_future_value(payment: Money, months: f64, monthly_rate: Rate) -> Money {
    if !payment.is_finite() || !has_periods(months) {
        return 0.0;
    }
    if monthly_rate == 0.0 {
        return payment * months;
    }
    payment * (((1.0 + monthly_rate).powf(months) - 1.0) / monthly_rate)
}

/// Nominal annual percentage (6 = 6%) to the per-month rate used for amortisation.
pub fn monthly_rate_from_annual_percent(annual_percent: f64) -> Rate {
    annual_percent / 100.0 / MONTHS_PER_YEAR
}

/// Per-month amortisation rate back to a nominal annual percentage.
pub fn annual_percent_from_monthly_rate(monthly_rate: Rate) -> f64 {
    monthly_rate * MONTHS_PER_YEAR * 100.0
}

/// Monthly rate that compounds to `annual_rate` (decimal) over twelve months.
pub fn monthly_effective_rate(annual_rate: Rate) -> Rate {
    (1.0 + annual_rate).powf(1.0 / MONTHS_PER_YEAR) - 1.0
}

/// Effective annual rate (decimal) of a monthly compounding rate.
pub fn annualize_monthly_rate(monthly_rate: Rate) -> Rate {
    (1.0 + monthly_rate).powi(12) - 1.0
}
