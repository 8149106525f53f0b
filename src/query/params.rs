//! # List Parameter Parser
//!
//! Parses list query parameters (`page`, `page_size`, `order`,
//! `order_desc`, `search`, `filter_<column>`) into [`ListParams`].

use std::collections::{BTreeMap, HashMap};

use crate::schema::SchemaMetadata;

use super::errors::{QueryError, QueryResult};

/// Absolute cap on the page number
pub const ABSOLUTE_MAX_PAGE: u64 = 100;

/// Absolute cap on rows per page
pub const ABSOLUTE_MAX_PAGE_SIZE: u64 = 100;

/// Rows per page when not specified
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Prefix marking an equality filter parameter
pub const FILTER_PREFIX: &str = "filter_";

/// Token in the search term replaced by the SQL wildcard
pub const SEARCH_WILDCARD_TOKEN: &str = "__";

/// Paging limits for one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub max_page: u64,
    pub max_page_size: u64,
    pub default_page_size: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            max_page: ABSOLUTE_MAX_PAGE,
            max_page_size: ABSOLUTE_MAX_PAGE_SIZE,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageLimits {
    /// Build limits, clamping each value into `1..=absolute cap`
    pub fn new(max_page: u64, max_page_size: u64, default_page_size: u64) -> Self {
        let max_page = max_page.clamp(1, ABSOLUTE_MAX_PAGE);
        let max_page_size = max_page_size.clamp(1, ABSOLUTE_MAX_PAGE_SIZE);
        Self {
            max_page,
            max_page_size,
            default_page_size: default_page_size.clamp(1, max_page_size),
        }
    }
}

/// Parsed list request parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// 1-based page number
    pub page: u64,

    /// Rows per page
    pub page_size: u64,

    /// Ascending sort column
    pub order: Option<String>,

    /// Descending sort column, used only when `order` is absent
    pub order_desc: Option<String>,

    /// Recognized equality filters, column to raw value
    pub filters: BTreeMap<String, String>,

    /// Raw search term as supplied
    pub search: Option<String>,
}

impl ListParams {
    /// Parse list parameters against a resource schema.
    ///
    /// Filters on unknown columns are dropped; sorting on an unknown column
    /// is rejected.
    pub fn parse(
        params: &HashMap<String, String>,
        schema: &SchemaMetadata,
        limits: PageLimits,
    ) -> QueryResult<Self> {
        let page = parse_bounded(params.get("page"), 1, limits.max_page);
        let page_size = parse_bounded(
            params.get("page_size"),
            limits.default_page_size,
            limits.max_page_size,
        );

        let order = non_empty(params.get("order"));
        let order_desc = non_empty(params.get("order_desc"));
        for column in order.iter().chain(order_desc.iter()) {
            if schema.field_by_column(column).is_none() {
                return Err(QueryError::UnknownColumn {
                    table: schema.table.clone(),
                    column: column.clone(),
                });
            }
        }

        let filters = params
            .iter()
            .filter_map(|(key, value)| {
                let column = key.strip_prefix(FILTER_PREFIX)?;
                schema
                    .field_by_column(column)
                    .map(|_| (column.to_string(), value.clone()))
            })
            .collect();

        Ok(Self {
            page,
            page_size,
            order,
            order_desc,
            filters,
            search: non_empty(params.get("search")),
        })
    }

    /// LIKE pattern for the search term: `__` becomes `%`, wrapped for containment
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_ref()
            .map(|s| format!("%{}%", s.replace(SEARCH_WILDCARD_TOKEN, "%")))
    }

    /// True when no filter, sort or search is present
    pub fn is_plain(&self) -> bool {
        self.filters.is_empty()
            && self.order.is_none()
            && self.order_desc.is_none()
            && self.search.is_none()
    }

    /// Offset of the first row of the page
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }
}

/// Parse a positive integer, falling back to `default` and clamping to `max`
fn parse_bounded(raw: Option<&String>, default: u64, max: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v >= 1)
        .unwrap_or(default)
        .min(max)
}

fn non_empty(raw: Option<&String>) -> Option<String> {
    raw.filter(|v| !v.is_empty()).cloned()
}
