//! Parsing of caller-supplied parameter fields

use serde_json::Value;

use crate::errors::{K3Error, Result};

/// Parse a JSON parameter field supplied by the caller.
///
/// Empty (or whitespace-only) text yields `fallback`. Malformed JSON fails
/// with `K3Error::Parse` naming the field; it is never retried.
pub fn parse_json_field(name: &str, text: &str, fallback: Value) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(fallback);
    }
    serde_json::from_str(text)
        .map_err(|err| K3Error::Parse(format!("cannot parse JSON in field [{name}]: {err}")))
}

/// Split a comma-separated list, trimming entries and dropping blanks.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}
