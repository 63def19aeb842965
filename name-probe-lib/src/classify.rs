//! Response classification.
//!
//! Maps one HTTP response from the probed endpoint to a [`CheckResult`].
//! Classification is a pure function; the side effects it asks for (backoff,
//! notification) are carried out by the worker that called it.

use crate::types::{CheckResult, CheckStatus, DEFAULT_RETRY_AFTER_SECS, MAX_RETRY_AFTER_SECS};
use serde_json::Value;

/// A classified response plus the backoff it requests, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub result: CheckResult,
    /// Seconds the whole pool should pause for (set only on throttling)
    pub backoff_secs: Option<f64>,
}

impl Classification {
    fn plain(result: CheckResult) -> Self {
        Self {
            result,
            backoff_secs: None,
        }
    }

    pub fn status(&self) -> CheckStatus {
        self.result.status
    }
}

/// Classify a raw response from the availability endpoint.
///
/// | response                        | status       |
/// |---------------------------------|--------------|
/// | 429                             | RATE_LIMITED |
/// | 401 / 403                       | ERROR        |
/// | other non-200                   | ERROR        |
/// | 200 with truthy `taken`         | TAKEN        |
/// | 200 with falsy/missing `taken`  | AVAILABLE    |
/// | 200 with a non-object body      | ERROR        |
pub fn classify_response(name: &str, status: u16, body: &str) -> Classification {
    match status {
        429 => {
            let retry_after = parse_retry_after(body);
            Classification {
                result: CheckResult::rate_limited(name, retry_after),
                backoff_secs: Some(retry_after),
            }
        }
        401 | 403 => Classification::plain(CheckResult::error(name, "Unauthorized (check token)")),
        200 => match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => {
                let taken = map.get("taken").map(is_truthy).unwrap_or(false);
                if taken {
                    Classification::plain(CheckResult::taken(name))
                } else {
                    Classification::plain(CheckResult::available(name))
                }
            }
            Ok(other) => Classification::plain(CheckResult::error(
                name,
                format!("Unexpected response body: expected object, got {}", kind(&other)),
            )),
            Err(e) => Classification::plain(CheckResult::error(
                name,
                format!("Invalid JSON response: {}", e),
            )),
        },
        other => Classification::plain(CheckResult::error(name, format!("HTTP {}", other))),
    }
}

/// Read `retry_after` from a throttle body.
///
/// Accepts a number or a numeric string. Anything missing, unparseable,
/// negative or non-finite yields the five second default. Values above
/// `MAX_RETRY_AFTER_SECS` are capped.
pub fn parse_retry_after(body: &str) -> f64 {
    let parsed = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| match value.get("retry_after")? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        });

    match parsed {
        Some(secs) if secs.is_finite() && secs >= 0.0 => secs.min(MAX_RETRY_AFTER_SECS),
        _ => DEFAULT_RETRY_AFTER_SECS,
    }
}

/// Loose truthiness: `false`, `null`, `0`, `""`, `[]` and `{}` are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
