pub mod csv_out;
pub mod format;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Flatten nested objects into `parent.child` keys.
///
/// Arrays of objects (schedule rows) are not expanded; they collapse to a
/// row count so field/value listings stay readable.
pub fn flatten(map: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    flatten_into("", map, &mut out);
    out
}

fn flatten_into(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, Value)>) {
    for (key, val) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten_into(&path, inner, out),
            Value::Array(items) if items.iter().any(Value::is_object) => {
                out.push((path, Value::String(format!("[{} rows]", items.len()))));
            }
            other => out.push((path, other.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_dotted_keys() {
        let value = json!({
            "outcome": { "winner": "A", "difference": 12.5 },
            "rows": [{ "month": 1 }, { "month": 2 }],
            "lowest_interest": null,
        });
        let flat = flatten(value.as_object().unwrap());
        let keys: Vec<&str> = flat.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"outcome.winner"));
        assert!(keys.contains(&"outcome.difference"));
        let rows = flat.iter().find(|(k, _)| k == "rows").unwrap();
        assert_eq!(rows.1, json!("[2 rows]"));
    }
}
