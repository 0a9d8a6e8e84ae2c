//! Parsing for semicolon- or JSON-encoded key/value option strings.
//!
//! The same algorithm serves request headers and object metadata; `label`
//! names the option in diagnostics.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

/// Parse an optional `headers`/`metadata`-style option string.
///
/// Two encodings are accepted: a flat JSON object (`{"a":"1"}`) and
/// semicolon-separated pairs (`a=1; b=2`). Input that fails to parse as JSON
/// falls back to the semicolon form rather than failing the operation.
/// Returns `None` when the input is absent, blank, or yields no usable
/// pairs.
pub fn parse_key_values(label: &str, raw: Option<&str>) -> Option<HashMap<String, String>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.starts_with('{') {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(fields)) => {
                let mut pairs = HashMap::new();
                for (key, value) in fields {
                    match value {
                        Value::String(s) => {
                            pairs.insert(key, s);
                        }
                        Value::Number(_) | Value::Bool(_) => {
                            pairs.insert(key, value.to_string());
                        }
                        _ => warn!(option = label, key = %key, "skipping non-scalar value"),
                    }
                }
                return if pairs.is_empty() { None } else { Some(pairs) };
            }
            Ok(_) => {
                warn!(option = label, "JSON value is not an object, ignoring");
                return None;
            }
            Err(error) => {
                warn!(
                    option = label,
                    error = %error,
                    "not valid JSON, falling back to `k=v; k=v` parsing"
                );
            }
        }
    }

    let mut pairs = HashMap::new();
    for segment in raw.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let Some((key, value)) = segment.split_once('=') else {
            warn!(option = label, segment, "segment has no `=`, skipping");
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        pairs.insert(key.to_string(), value.trim().to_string());
    }
    if pairs.is_empty() { None } else { Some(pairs) }
}
