//! # Response Formatting
//!
//! Payload types for generated endpoints.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// List response with page metadata and echoed parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResponse {
    pub page_size: u64,
    pub page: u64,
    /// Rows matching the filters, ignoring paging
    pub all: u64,
    pub data: Vec<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc_field: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Update/delete acknowledgement when no response shape is configured
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdResponse {
    pub id: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_response_omits_absent_echoes() {
        let response = ListResponse {
            page_size: 20,
            page: 1,
            all: 2,
            data: vec![json!({"id": 1}), json!({"id": 2})],
            desc_field: None,
            order: Some("name".to_string()),
            filter: None,
            search: None,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["all"], 2);
        assert_eq!(json["order"], "name");
        assert!(json.get("desc_field").is_none());
        assert!(json.get("filter").is_none());
        assert!(json.get("search").is_none());
    }
}
