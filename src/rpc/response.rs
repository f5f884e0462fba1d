//! Raw JSON-RPC response handling
//!
//! bitcoind writes amounts as bare JSON numbers (`"fee":0.00000141`).
//! Decoding those into `f64` loses satoshi precision, so every bare
//! numeric literal that directly follows an object key is rewritten into a
//! quoted string before the body is parsed. The rewrite is purely textual.
//! Numbers are never parsed on the way.
//!
//! The field readers below accept both shapes (number or numeric string)
//! since a value may arrive either way depending on field and node version.

use crate::errors::{RpcError, RpcResult};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref BARE_NUMBER_FIELD: Regex =
        Regex::new(r#""([\w-]+)"(\s*):(\s*)(-?[\d.eE+-]+)(\s*[,}\]])"#)
            .expect("numeric field pattern is valid");
}

/// Quote every bare numeric literal adjacent to a field name
///
/// ```
/// use bitcoind_adapter::rpc::response::quote_numeric_literals;
///
/// assert_eq!(
///     quote_numeric_literals(r#"{"fee":0.00000001,"n":[1,2]}"#),
///     r#"{"fee":"0.00000001","n":[1,2]}"#
/// );
/// ```
pub fn quote_numeric_literals(body: &str) -> String {
    BARE_NUMBER_FIELD
        .replace_all(body, r#""${1}"${2}:${3}"${4}"${5}"#)
        .into_owned()
}

/// Parse a raw node response body and extract `result`
///
/// Fails with [`RpcError::Node`] when the node reports a top-level `error`
/// or a non-empty `result.errors` array.
pub fn parse_response(command: &str, body: &str) -> RpcResult<Value> {
    let normalised = quote_numeric_literals(body);
    let mut response: Value = serde_json::from_str(&normalised).map_err(|e| {
        RpcError::DeserialisationFailed(format!("'{}' response is not JSON: {}", command, e))
    })?;

    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        return Err(RpcError::Node {
            command: command.to_string(),
            code: error.get("code").and_then(value_as_i64),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string()),
        });
    }

    let result = response
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| {
            RpcError::InvalidResponse(format!("'{}' response has no result", command))
        })?;

    if let Some(errors) = result
        .get("errors")
        .and_then(Value::as_array)
        .filter(|errors| !errors.is_empty())
    {
        let message = errors
            .iter()
            .map(|entry| {
                entry
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| entry.to_string())
            })
            .collect::<Vec<_>>()
            .join("; ");
        return Err(RpcError::Node {
            command: command.to_string(),
            code: None,
            message,
        });
    }

    Ok(result)
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn missing(field: &str) -> RpcError {
    RpcError::InvalidResponse(format!("missing or malformed field '{}'", field))
}

/// String field; numbers are returned in their textual form
pub fn field_str<'a>(value: &'a Value, field: &str) -> RpcResult<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| missing(field))
}

/// Numeric text of a field, whether it arrived quoted or as a number
pub fn field_number_text(value: &Value, field: &str) -> RpcResult<String> {
    match value.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(missing(field)),
    }
}

pub fn field_u64(value: &Value, field: &str) -> RpcResult<u64> {
    match value.get(field) {
        Some(Value::Number(n)) => n.as_u64().ok_or_else(|| missing(field)),
        Some(Value::String(s)) => s.parse().map_err(|_| missing(field)),
        _ => Err(missing(field)),
    }
}

pub fn field_i64(value: &Value, field: &str) -> RpcResult<i64> {
    value.get(field).and_then(value_as_i64).ok_or_else(|| missing(field))
}

pub fn field_bool(value: &Value, field: &str) -> RpcResult<bool> {
    value
        .get(field)
        .and_then(Value::as_bool)
        .ok_or_else(|| missing(field))
}

pub fn field_array<'a>(value: &'a Value, field: &str) -> RpcResult<&'a Vec<Value>> {
    value
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| missing(field))
}
