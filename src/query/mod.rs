//! # Query Builder
//!
//! Turns untyped list/get parameters into parameterized, table-scoped
//! queries against one resource.
//!
//! # Query Parameters
//!
//! - `page`, `page_size`: 1-based paging, clamped to the resource maxima
//! - `order=col` / `order_desc=col`: single-column sort
//! - `filter_<col>=value`: equality filter; unknown columns are ignored
//! - `search=term`: contains-match across the search columns, `__` is a wildcard

mod builder;
mod errors;
mod params;
mod predicate;

pub use builder::{ListPlan, OrderBy, OwnerScope, QueryBuilder, SelectQuery};
pub use errors::{QueryError, QueryResult};
pub use params::{
    ListParams, PageLimits, ABSOLUTE_MAX_PAGE, ABSOLUTE_MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE,
    FILTER_PREFIX,
};
pub use predicate::{quote, Predicate};

pub(crate) use predicate::compare_values;
