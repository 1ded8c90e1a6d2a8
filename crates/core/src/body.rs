//! Request Body Parsing
//!
//! Turns the raw bytes of an inbound request into a JSON object, applying the
//! configured policy for bodies that are present but not valid JSON.

use serde_json::{Map, Value};
use std::{fmt, str::FromStr};
use tracing::debug;

/// Errors raised while parsing the request body.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// What to do with a non-empty body that fails to parse as JSON.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BodyPolicy {
    /// Treat the body as `{}` and carry on with defaults.
    #[default]
    FailOpen,
    /// Refuse the request with a client error.
    Reject,
}

impl FromStr for BodyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail-open" | "fail_open" | "open" => Ok(BodyPolicy::FailOpen),
            "reject" | "fail-closed" | "fail_closed" => Ok(BodyPolicy::Reject),
            other => Err(format!("'{}' is not a valid body policy", other)),
        }
    }
}

impl fmt::Display for BodyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyPolicy::FailOpen => write!(f, "fail-open"),
            BodyPolicy::Reject => write!(f, "reject"),
        }
    }
}

/// Parses a request body into a JSON object.
///
/// An absent or whitespace-only body is always `{}`. A body that parses to
/// something other than an object (array, string, `null`, ...) is also `{}`.
/// Only a non-empty body that is not valid JSON at all is subject to `policy`.
pub fn parse_body(bytes: &[u8], policy: BodyPolicy) -> Result<Map<String, Value>, BodyError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => {
            debug!(kind = json_kind(&other), "Non-object JSON body, using defaults");
            Ok(Map::new())
        }
        Err(e) => match policy {
            BodyPolicy::FailOpen => {
                debug!(error = %e, "Unparseable body, using defaults");
                Ok(Map::new())
            }
            BodyPolicy::Reject => Err(BodyError::InvalidJson(e)),
        },
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
