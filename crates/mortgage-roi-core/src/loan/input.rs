//! Loan descriptors: raw user text, parsed optional fields, and the
//! validated "which value is unknown" form the solver works from.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::error::LoanSolveError;
use crate::annuity::parse_number;
use crate::types::Money;

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// The four core loan fields, exactly one of which is solved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanField {
    Principal,
    Years,
    Rate,
    Payment,
}

impl LoanField {
    pub const CORE: [LoanField; 4] = [
        LoanField::Principal,
        LoanField::Years,
        LoanField::Rate,
        LoanField::Payment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LoanField::Principal => "principal",
            LoanField::Years => "years",
            LoanField::Rate => "rate",
            LoanField::Payment => "payment",
        }
    }
}

impl fmt::Display for LoanField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Parsed input
// ---------------------------------------------------------------------------

/// A loan option with any of its core fields possibly absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanInput {
    #[serde(default)]
    pub label: String,
    /// Amount borrowed.
    pub principal: Option<Money>,
    /// Term in years; may be fractional.
    pub term_years: Option<f64>,
    /// Nominal annual rate as a percentage (6 = 6%).
    pub annual_rate_percent: Option<f64>,
    /// Principal-and-interest payment, excluding PMI.
    pub monthly_payment: Option<Money>,
    /// Up-front costs; absent means none.
    pub closing_costs: Option<Money>,
    /// Monthly mortgage insurance while the balance is above 78% of principal.
    pub monthly_pmi: Option<Money>,
}

/// A [`LoanInput`] that passed validation: the unknown field plus the three
/// known values needed to solve for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoanUnknown {
    Principal {
        years: f64,
        rate_percent: f64,
        payment: Money,
    },
    Years {
        principal: Money,
        rate_percent: f64,
        payment: Money,
    },
    Rate {
        principal: Money,
        years: f64,
        payment: Money,
    },
    Payment {
        principal: Money,
        years: f64,
        rate_percent: f64,
    },
}

impl LoanUnknown {
    pub fn field(&self) -> LoanField {
        match self {
            LoanUnknown::Principal { .. } => LoanField::Principal,
            LoanUnknown::Years { .. } => LoanField::Years,
            LoanUnknown::Rate { .. } => LoanField::Rate,
            LoanUnknown::Payment { .. } => LoanField::Payment,
        }
    }
}

fn known(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl LoanInput {
    /// Core fields that are absent or non-finite, in display order.
    pub fn blank_fields(&self) -> Vec<LoanField> {
        LoanField::CORE
            .into_iter()
            .filter(|field| self.core_value(*field).is_none())
            .collect()
    }

    fn core_value(&self, field: LoanField) -> Option<f64> {
        known(match field {
            LoanField::Principal => self.principal,
            LoanField::Years => self.term_years,
            LoanField::Rate => self.annual_rate_percent,
            LoanField::Payment => self.monthly_payment,
        })
    }

    /// Check that exactly one core field is blank and name it.
    pub fn classify(&self) -> Result<LoanUnknown, LoanSolveError> {
        let principal = self.core_value(LoanField::Principal);
        let years = self.core_value(LoanField::Years);
        let rate = self.core_value(LoanField::Rate);
        let payment = self.core_value(LoanField::Payment);

        match (principal, years, rate, payment) {
            (None, Some(years), Some(rate_percent), Some(payment)) => Ok(LoanUnknown::Principal {
                years,
                rate_percent,
                payment,
            }),
            (Some(principal), None, Some(rate_percent), Some(payment)) => Ok(LoanUnknown::Years {
                principal,
                rate_percent,
                payment,
            }),
            (Some(principal), Some(years), None, Some(payment)) => Ok(LoanUnknown::Rate {
                principal,
                years,
                payment,
            }),
            (Some(principal), Some(years), Some(rate_percent), None) => Ok(LoanUnknown::Payment {
                principal,
                years,
                rate_percent,
            }),
            _ => Err(LoanSolveError::WrongBlankCount {
                blank: self.blank_fields(),
            }),
        }
    }

    /// Closing costs with absence read as zero.
    pub fn closing_costs_or_zero(&self) -> Money {
        known(self.closing_costs).unwrap_or(0.0)
    }

    /// PMI with absence and non-positive amounts read as no PMI.
    pub fn monthly_pmi_or_zero(&self) -> Money {
        known(self.monthly_pmi).unwrap_or(0.0).max(0.0)
    }
}

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// A loan option exactly as typed: every field is free text, blank means
/// absent. JSON numbers are accepted and read as their decimal text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLoanInput {
    pub label: String,
    #[serde(deserialize_with = "text_or_number")]
    pub principal: String,
    #[serde(deserialize_with = "text_or_number")]
    pub years: String,
    #[serde(deserialize_with = "text_or_number")]
    pub rate: String,
    #[serde(deserialize_with = "text_or_number")]
    pub payment: String,
    #[serde(deserialize_with = "text_or_number")]
    pub closing_costs: String,
    #[serde(deserialize_with = "text_or_number")]
    pub pmi: String,
    /// Optional purchase price; with `down_percent` it determines the principal.
    #[serde(deserialize_with = "text_or_number")]
    pub purchase_price: String,
    #[serde(deserialize_with = "text_or_number")]
    pub down_percent: String,
}

pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

/// Loan amount implied by a purchase price and a down payment percentage,
/// rounded to cents and floored at zero.
pub fn principal_from_purchase(purchase_price: Money, down_percent: f64) -> Money {
    let loan_amount = (purchase_price * (1.0 - down_percent / 100.0)).max(0.0);
    (loan_amount * 100.0).round() / 100.0
}

impl RawLoanInput {
    /// Exactly one of purchase price / down percent was entered, so neither
    /// the derived nor the typed principal is used.
    pub fn has_partial_purchase(&self) -> bool {
        parse_number(&self.purchase_price).is_some() != parse_number(&self.down_percent).is_some()
    }

    pub fn parse(&self) -> LoanInput {
        let principal = match (
            parse_number(&self.purchase_price),
            parse_number(&self.down_percent),
        ) {
            (Some(price), Some(down)) => Some(principal_from_purchase(price, down)),
            (None, None) => parse_number(&self.principal),
            _ => None,
        };

        LoanInput {
            label: self.label.clone(),
            principal,
            term_years: parse_number(&self.years),
            annual_rate_percent: parse_number(&self.rate),
            monthly_payment: parse_number(&self.payment),
            closing_costs: parse_number(&self.closing_costs),
            monthly_pmi: parse_number(&self.pmi),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(principal: &str, years: &str, rate: &str, payment: &str) -> RawLoanInput {
        RawLoanInput {
            label: "Option".into(),
            principal: principal.into(),
            years: years.into(),
            rate: rate.into(),
            payment: payment.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_each_unknown() {
        let cases = [
            (raw("", "30", "6", "2000"), LoanField::Principal),
            (raw("350000", "", "6", "2000"), LoanField::Years),
            (raw("350000", "30", "", "2000"), LoanField::Rate),
            (raw("350000", "30", "6", ""), LoanField::Payment),
        ];
        for (input, expected) in cases {
            let unknown = input.parse().classify().unwrap();
            assert_eq!(unknown.field(), expected);
        }
    }

    #[test]
    fn test_classify_wrong_blank_counts() {
        let none_blank = raw("350000", "30", "6", "2000").parse().classify();
        assert_eq!(
            none_blank,
            Err(LoanSolveError::WrongBlankCount { blank: vec![] })
        );

        let two_blank = raw("", "30", "", "2000").parse().classify();
        assert_eq!(
            two_blank,
            Err(LoanSolveError::WrongBlankCount {
                blank: vec![LoanField::Principal, LoanField::Rate],
            })
        );
    }

    #[test]
    fn test_non_numeric_text_is_blank() {
        let input = raw("n/a", "30", "6", "2000").parse();
        assert_eq!(input.principal, None);
        assert_eq!(input.blank_fields(), vec![LoanField::Principal]);
    }

    #[test]
    fn test_non_finite_values_are_blank() {
        let input = LoanInput {
            principal: Some(f64::NAN),
            term_years: Some(30.0),
            annual_rate_percent: Some(6.0),
            monthly_payment: Some(2000.0),
            ..Default::default()
        };
        assert_eq!(input.classify().unwrap().field(), LoanField::Principal);
    }

    #[test]
    fn test_purchase_price_sets_principal() {
        let mut input = raw("1", "30", "6", "");
        input.purchase_price = "400000".into();
        input.down_percent = "20".into();
        assert_eq!(input.parse().principal, Some(320_000.0));
        assert!(!input.has_partial_purchase());
    }

    #[test]
    fn test_partial_purchase_blanks_principal() {
        let mut input = raw("350000", "30", "6", "");
        input.purchase_price = "400000".into();
        assert!(input.has_partial_purchase());
        assert_eq!(input.parse().principal, None);
    }

    #[test]
    fn test_principal_from_purchase_floors_at_zero() {
        assert_eq!(principal_from_purchase(100_000.0, 120.0), 0.0);
        assert_eq!(principal_from_purchase(333_333.333, 10.0), 300_000.0);
    }

    #[test]
    fn test_raw_input_accepts_numbers_and_strings() {
        let json = r#"{"label":"A","principal":350000,"years":"30","rate":6,"payment":null}"#;
        let parsed: RawLoanInput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.principal, "350000");
        assert_eq!(parsed.rate, "6");
        assert_eq!(parsed.payment, "");
        assert_eq!(parsed.closing_costs, "");
    }

    #[test]
    fn test_pmi_and_closing_defaults() {
        let input = raw("350000", "30", "6", "").parse();
        assert_eq!(input.closing_costs_or_zero(), 0.0);
        assert_eq!(input.monthly_pmi_or_zero(), 0.0);

        let mut negative = raw("350000", "30", "6", "");
        negative.pmi = "-50".into();
        assert_eq!(negative.parse().monthly_pmi_or_zero(), 0.0);
    }
}
