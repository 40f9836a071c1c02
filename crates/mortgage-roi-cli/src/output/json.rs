use serde_json::Value;

/// Pretty-print JSON to stdout. Non-finite numbers were already
/// serialized as null by serde_json.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}
