//! Request context and input extraction
//!
//! [`ContextValues`] is a request extension populated by host middleware
//! (typically authentication) and read for ownership scoping.
//! [`read_values`] merges a create/update body with the query string.

use std::collections::HashMap;

use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use serde_json::Value;

use crate::coerce::RequestValues;

use super::errors::{RestError, RestResult};

/// Per-request values set by upstream middleware
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextValues(HashMap<String, String>);

impl ContextValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// Collect create/update input.
///
/// JSON objects contribute their scalar leaves (nested objects are
/// flattened by key), form bodies their pairs. Keys absent from the body
/// fall back to the query string.
pub fn read_values(headers: &HeaderMap, query: Option<&str>, body: &[u8]) -> RestResult<RequestValues> {
    let mut values = RequestValues::new();

    if !body.iter().all(u8::is_ascii_whitespace) {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if content_type.starts_with("application/x-www-form-urlencoded") {
            for (key, value) in url::form_urlencoded::parse(body) {
                values.insert(key, value);
            }
        } else {
            let parsed: Value = serde_json::from_slice(body)
                .map_err(|e| RestError::Parse(format!("Invalid JSON body: {}", e)))?;
            match parsed {
                Value::Object(map) => flatten_into(&mut values, map),
                _ => return Err(RestError::Parse("Request body must be a JSON object".to_string())),
            }
        }
    }

    if let Some(query) = query {
        values.fill_from(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        );
    }

    Ok(values)
}

fn flatten_into(values: &mut RequestValues, map: serde_json::Map<String, Value>) {
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::String(s) => values.insert(key, s),
            Value::Object(nested) => flatten_into(values, nested),
            other => values.insert(key, other.to_string()),
        }
    }
}
