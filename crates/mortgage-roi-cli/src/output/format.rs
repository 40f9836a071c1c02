use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Display conventions for numbers in human-readable output.
///
/// Passed by reference into the `format_*` functions; there is no shared
/// formatter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pub currency_symbol: &'static str,
    pub group_separator: char,
    pub decimal_places: u32,
    /// Shown for undefined or non-finite values.
    pub missing: &'static str,
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat {
            currency_symbol: "$",
            group_separator: ',',
            decimal_places: 2,
            missing: "—",
        }
    }
}

/// `$1,234.57`, or the missing marker.
pub fn format_currency(value: Option<f64>, fmt: &NumberFormat) -> String {
    match value.and_then(|v| round_to(v, fmt.decimal_places)) {
        Some(rounded) => {
            let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
                "-"
            } else {
                ""
            };
            format!(
                "{sign}{}{}",
                fmt.currency_symbol,
                group_digits(rounded.abs(), fmt)
            )
        }
        None => fmt.missing.to_string(),
    }
}

/// `6.25%` for a value already expressed in percent.
pub fn format_percent(value: Option<f64>, fmt: &NumberFormat) -> String {
    match value.and_then(|v| round_to(v, fmt.decimal_places)) {
        Some(rounded) => format!("{:.*}%", fmt.decimal_places as usize, rounded),
        None => fmt.missing.to_string(),
    }
}

/// Plain fixed-point number without grouping.
pub fn format_fixed(value: Option<f64>, fmt: &NumberFormat) -> String {
    match value.and_then(|v| round_to(v, fmt.decimal_places)) {
        Some(rounded) => format!("{:.*}", fmt.decimal_places as usize, rounded),
        None => fmt.missing.to_string(),
    }
}

fn round_to(value: f64, places: u32) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero))
}

fn group_digits(value: Decimal, fmt: &NumberFormat) -> String {
    let text = format!("{:.*}", fmt.decimal_places as usize, value);
    let (whole, fraction) = match text.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(fmt.group_separator);
        }
        grouped.push(ch);
    }
    if let Some(f) = fraction {
        grouped.push('.');
        grouped.push_str(f);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_grouping_and_rounding() {
        let fmt = NumberFormat::default();
        assert_eq!(format_currency(Some(2098.4268), &fmt), "$2,098.43");
        assert_eq!(format_currency(Some(1_234_567.006), &fmt), "$1,234,567.01");
        assert_eq!(format_currency(Some(12.0), &fmt), "$12.00");
        assert_eq!(format_currency(Some(-1500.5), &fmt), "-$1,500.50");
    }

    #[test]
    fn test_missing_values() {
        let fmt = NumberFormat::default();
        assert_eq!(format_currency(None, &fmt), "—");
        assert_eq!(format_percent(Some(f64::NAN), &fmt), "—");
        assert_eq!(format_fixed(Some(f64::INFINITY), &fmt), "—");
    }

    #[test]
    fn test_percent_and_fixed() {
        let fmt = NumberFormat::default();
        assert_eq!(format_percent(Some(8.957), &fmt), "8.96%");
        assert_eq!(format_fixed(Some(0.125), &fmt), "0.13");

        let whole = NumberFormat {
            decimal_places: 0,
            ..NumberFormat::default()
        };
        assert_eq!(format_currency(Some(350_000.4), &whole), "$350,000");
    }
}
