use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::flatten;
use super::format::{format_currency, format_percent, NumberFormat};

/// How a numeric field is rendered, decided by its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Currency,
    Percent,
    Plain,
}

fn column_kind(key: &str) -> ColumnKind {
    let leaf = key.rsplit('.').next().unwrap_or(key);
    if leaf.ends_with("_percent") || leaf == "break_even_rate" {
        ColumnKind::Percent
    } else if leaf == "month"
        || leaf.ends_with("_month")
        || leaf.contains("_month_")
        || leaf.ends_with("months")
        || leaf.ends_with("years")
        || leaf.ends_with("_rate")
        || leaf == "monthly_return"
        || leaf.ends_with("_us")
    {
        ColumnKind::Plain
    } else {
        ColumnKind::Currency
    }
}

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    let fmt = NumberFormat::default();
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) if result.contains_key("comparison") => {
                print_comparison(result, &fmt);
                print_envelope(map);
            }
            Some(Value::Object(result)) => {
                print_fields(result, &fmt);
                print_envelope(map);
            }
            _ => print_fields(map, &fmt),
        },
        Value::Array(arr) => print_array_table(arr, &fmt),
        _ => println!("{}", value),
    }
}

fn print_comparison(result: &Map<String, Value>, fmt: &NumberFormat) {
    for key in ["headline", "payoff_note"] {
        if let Some(Value::String(line)) = result.get(key) {
            println!("{}", line);
        }
    }

    let options = result
        .get("comparison")
        .and_then(|c| c.get("options"))
        .and_then(Value::as_array);
    let Some([a, b]) = options.map(Vec::as_slice) else {
        // No comparison was possible; show the loan outcomes as entered.
        if let Some(Value::Array(loans)) = result.get("loans") {
            print_array_table(loans, fmt);
        }
        return;
    };

    let mut builder = Builder::default();
    builder.push_record([
        "Field".to_string(),
        label(a, "Option A"),
        label(b, "Option B"),
    ]);
    if let (Value::Object(map_a), Value::Object(map_b)) = (a, b) {
        for (key, val_a) in map_a {
            if key == "side" || key == "label" {
                continue;
            }
            let val_b = map_b.get(key).unwrap_or(&Value::Null);
            builder.push_record([key.clone(), cell(key, val_a, fmt), cell(key, val_b, fmt)]);
        }
    }
    println!("{}", Table::from(builder));

    if let Some(Value::Object(outcome)) = result.get("comparison").and_then(|c| c.get("outcome")) {
        println!();
        print_fields(outcome, fmt);
    }
}

fn label(option: &Value, fallback: &str) -> String {
    option
        .get("label")
        .and_then(Value::as_str)
        .unwrap_or(fallback)
        .to_string()
}

fn print_envelope(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_fields(map: &Map<String, Value>, fmt: &NumberFormat) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten(map) {
        builder.push_record([key.clone(), cell(&key, &val, fmt)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value], fmt: &NumberFormat) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = flatten(first).into_iter().map(|(k, _)| k).collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let flat = flatten(map);
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        flat.iter()
                            .find(|(k, _)| k == h)
                            .map(|(k, v)| cell(k, v, fmt))
                            .unwrap_or_default()
                    })
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", cell("", item, fmt));
        }
    }
}

fn cell(key: &str, value: &Value, fmt: &NumberFormat) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match column_kind(key) {
            ColumnKind::Currency => format_currency(n.as_f64(), fmt),
            ColumnKind::Percent => format_percent(n.as_f64(), fmt),
            ColumnKind::Plain => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => fmt.missing.to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(|v| cell(key, v, fmt)).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_kinds() {
        assert_eq!(column_kind("monthly_payment"), ColumnKind::Currency);
        assert_eq!(column_kind("outcome.difference"), ColumnKind::Currency);
        assert_eq!(column_kind("annual_rate_percent"), ColumnKind::Percent);
        assert_eq!(column_kind("break_even_rate"), ColumnKind::Percent);
        assert_eq!(column_kind("pmi_last_month"), ColumnKind::Plain);
        assert_eq!(column_kind("crossover_month_with_tax"), ColumnKind::Plain);
        assert_eq!(column_kind("term_years"), ColumnKind::Plain);
        assert_eq!(column_kind("capital_gains_tax_rate"), ColumnKind::Plain);
    }

    #[test]
    fn test_cells_use_number_format() {
        let fmt = NumberFormat::default();
        assert_eq!(cell("delta_sum", &json!(1234.5), &fmt), "$1,234.50");
        assert_eq!(cell("break_even_rate", &json!(6.789), &fmt), "6.79%");
        assert_eq!(cell("month", &json!(12), &fmt), "12");
        assert_eq!(cell("portfolio_value_a", &Value::Null, &fmt), "—");
    }
}
