// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod cancel;
pub mod runs;
pub mod simulate;
pub mod stats;
pub mod submit;

/// Parse a `key=value` run parameter
///
/// Values that parse as JSON keep their type; anything else is a string.
pub fn parse_param(s: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid key=value: no `=` found in `{s}`"))?;
    if key.is_empty() {
        return Err(format!("invalid key=value: empty key in `{s}`"));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Collect parsed parameters into a JSON object
pub fn params_object(params: Vec<(String, serde_json::Value)>) -> serde_json::Value {
    serde_json::Value::Object(params.into_iter().collect())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
