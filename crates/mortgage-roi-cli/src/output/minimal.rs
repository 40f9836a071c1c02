use serde_json::Value;

/// Fields worth printing on their own, most useful first.
const PRIORITY_KEYS: [&str; 5] = [
    "headline",
    "break_even",
    "break_even_rate_percent",
    "monthly_payment",
    "winner",
];

/// Print just the key answer value from the output.
///
/// Looks for well-known fields in priority order, falling back to the first
/// field of the result. A schedule prints its final month.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let result_obj = match result_obj {
        Value::Array(rows) => match rows.last() {
            Some(last) => last,
            None => return "(empty)".to_string(),
        },
        other => other,
    };

    if let Value::Object(map) = result_obj {
        for key in &PRIORITY_KEYS {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    return format_minimal(val);
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    format_minimal(result_obj)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headline_wins() {
        let value = json!({ "result": { "monthly_payment": 2098.43, "headline": "Monthly payment: $2,098.43" } });
        assert_eq!(minimal_line(&value), "Monthly payment: $2,098.43");
    }

    #[test]
    fn test_schedule_prints_last_row() {
        let value = json!([
            { "month": 1, "break_even": "—" },
            { "month": 2, "break_even": "4.10%" },
        ]);
        assert_eq!(minimal_line(&value), "4.10%");
    }

    #[test]
    fn test_null_priority_falls_through() {
        let value = json!({ "result": { "break_even": null, "break_even_rate_percent": 5.5 } });
        assert_eq!(minimal_line(&value), "5.5");
    }
}
