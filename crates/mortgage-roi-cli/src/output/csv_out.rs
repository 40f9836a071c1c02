use serde_json::Value;
use std::io;

use super::flatten;

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    write_csv(&mut wtr, value);
    let _ = wtr.flush();
}

fn write_csv<W: io::Write>(wtr: &mut csv::Writer<W>, value: &Value) {
    match value {
        Value::Object(map) => {
            let body = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in flatten(body) {
                let _ = wtr.write_record([key.as_str(), &format_csv_value(&val)]);
            }
        }
        Value::Array(arr) => write_array_csv(wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = flatten(first).into_iter().map(|(k, _)| k).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let flat = flatten(map);
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        flat.iter()
                            .find(|(k, _)| k == h)
                            .map(|(_, v)| format_csv_value(v))
                            .unwrap_or_default()
                    })
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_csv(&mut wtr, value);
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_result_fields_are_flattened() {
        let out = render(&json!({
            "result": { "outcome": { "difference": 10.5 }, "lowest_interest": null },
            "warnings": [],
        }));
        assert!(out.starts_with("field,value\n"));
        assert!(out.contains("outcome.difference,10.5\n"));
        assert!(out.contains("lowest_interest,\n"));
    }

    #[test]
    fn test_rows_share_header() {
        let out = render(&json!([
            { "month": 1, "delta_sum": 5.0 },
            { "month": 2, "delta_sum": 10.0 },
        ]));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec!["delta_sum,month", "5.0,1", "10.0,2"]);
    }
}
