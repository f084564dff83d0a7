use std::fs;
use std::io;
use std::path::Path;

use serde_json::{Value, json};

/// Reads a peak events feed from a JSON file.
///
/// Accepts either an Opendatasoft records response (`{"results": [...]}`) or
/// a bare array of records. The result is always in the response shape.
///
/// # Errors
///
/// Returns an `io::Error` if the file cannot be read, or one of kind
/// `InvalidData` if it is not JSON of either shape.
pub fn read_events_file(path: &Path) -> io::Result<Value> {
    let content = fs::read_to_string(path)?;
    parse_events_json(&content)
}

/// Parses a peak events feed from JSON text. See [`read_events_file`].
///
/// # Errors
///
/// Returns an `io::Error` of kind `InvalidData` on malformed input.
pub fn parse_events_json(content: &str) -> io::Result<Value> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    match value {
        Value::Array(records) => Ok(json!({ "results": records })),
        value if value.get("results").is_some_and(Value::is_array) => Ok(value),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "expected a JSON array or an object with a \"results\" array",
        )),
    }
}
