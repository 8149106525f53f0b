//! # Type Coercion
//!
//! Converts raw request strings into typed JSON values for a field.
//!
//! | semantic type | rule |
//! |---|---|
//! | string | identity |
//! | signed / unsigned integer | base-10 |
//! | float | base-10 float |
//! | boolean | `1 t T TRUE true True` / `0 f F FALSE false False` |
//! | duration | base-10 whole seconds |
//! | timestamp | all digits: unix seconds, else local `YYYY-MM-DD HH:MM:SS` |
//!
//! Scalar failures fall back to the zero value under
//! [`CoercionPolicy::Lenient`]; timestamp failures are always errors.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde_json::{json, Number, Value};
use tracing::{debug, warn};

use crate::schema::{FieldDescriptor, SemanticType};

use super::errors::{CoercionError, CoercionResult};

/// Local time layout accepted for timestamps
pub const TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// What to do when a scalar value does not parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoercionPolicy {
    /// Log and bind the zero value
    #[default]
    Lenient,
    /// Reject the request
    Strict,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Coercer {
    policy: CoercionPolicy,
}

impl Coercer {
    pub fn new(policy: CoercionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CoercionPolicy {
        self.policy
    }

    /// Coerce a bound request value, applying the configured policy
    pub fn coerce(&self, field: &FieldDescriptor, raw: &str) -> CoercionResult<Value> {
        if raw.is_empty() && field.semantic != SemanticType::Timestamp {
            debug!(field = %field.name, "Absent value, binding zero");
            return Ok(field.semantic.zero_value());
        }

        match parse(field, raw) {
            Ok(value) => Ok(value),
            Err(err @ CoercionError::Timestamp { .. }) => Err(err),
            Err(err) => match self.policy {
                CoercionPolicy::Lenient => {
                    warn!(field = %field.name, value = raw, error = %err, "Coercion failed, binding zero");
                    Ok(field.semantic.zero_value())
                }
                CoercionPolicy::Strict => Err(err),
            },
        }
    }

    /// Coerce a filter value; malformed input is never defaulted
    pub fn coerce_filter(&self, field: &FieldDescriptor, raw: &str) -> CoercionResult<Value> {
        parse(field, raw)
    }

    /// Coerce a per-request ownership scope value
    pub fn coerce_owner(&self, field: &FieldDescriptor, raw: &str) -> CoercionResult<Value> {
        match field.semantic {
            SemanticType::String
            | SemanticType::SignedInteger { .. }
            | SemanticType::UnsignedInteger { .. } => {
                parse(field, raw)
            }
            other => Err(CoercionError::UnsupportedOwnerType {
                field: field.name.clone(),
                semantic: other.type_name(),
            }),
        }
    }
}

fn parse(field: &FieldDescriptor, raw: &str) -> CoercionResult<Value> {
    let invalid = || CoercionError::Invalid {
        field: field.name.clone(),
        value: raw.to_string(),
        expected: field.semantic.type_name(),
    };

    match field.semantic {
        SemanticType::String => Ok(Value::String(raw.to_string())),
        SemanticType::SignedInteger { bits } => raw
            .parse::<i64>()
            .ok()
            .filter(|n| fits_signed(*n, bits))
            .map(Value::from)
            .ok_or_else(invalid),
        SemanticType::UnsignedInteger { bits } => raw
            .parse::<u64>()
            .ok()
            .filter(|n| fits_unsigned(*n, bits))
            .map(Value::from)
            .ok_or_else(invalid),
        SemanticType::Float => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(invalid),
        SemanticType::Boolean => parse_bool(raw).map(Value::Bool).ok_or_else(invalid),
        SemanticType::Duration => raw
            .parse::<u64>()
            .map(|secs| json!({ "secs": secs, "nanos": 0 }))
            .map_err(|_| invalid()),
        SemanticType::Timestamp => parse_timestamp(raw)
            .map(Value::String)
            .ok_or_else(|| CoercionError::Timestamp {
                field: field.name.clone(),
                value: raw.to_string(),
            }),
    }
}

/// Whether `n` is representable in a signed integer of `bits` width
fn fits_signed(n: i64, bits: u32) -> bool {
    if bits >= i64::BITS {
        return true;
    }
    let max = (1i64 << (bits - 1)) - 1;
    (-max - 1..=max).contains(&n)
}

/// Whether `n` is representable in an unsigned integer of `bits` width
fn fits_unsigned(n: u64, bits: u32) -> bool {
    bits >= u64::BITS || n >> bits == 0
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn is_numeric(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a timestamp into RFC 3339 in the local offset
fn parse_timestamp(raw: &str) -> Option<String> {
    if is_numeric(raw) {
        let secs: i64 = raw.parse().ok()?;
        let utc = DateTime::<Utc>::from_timestamp(secs, 0)?;
        return Some(utc.with_timezone(&Local).to_rfc3339());
    }

    let naive = NaiveDateTime::parse_from_str(raw, TIME_LAYOUT).ok()?;
    let local = Local.from_local_datetime(&naive).earliest()?;
    Some(local.to_rfc3339())
}
