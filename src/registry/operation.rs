//! Generic CRUD operations

use std::fmt;
use std::str::FromStr;

use axum::routing::MethodFilter;

use super::errors::RegistryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::List,
        Operation::Get,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    /// Route relative to the resource mount: `/` or `/:id`
    pub fn route_path(&self) -> &'static str {
        match self {
            Operation::List | Operation::Create => "/",
            Operation::Get | Operation::Update | Operation::Delete => "/:id",
        }
    }

    pub fn method_filter(&self) -> MethodFilter {
        match self {
            Operation::List | Operation::Get => MethodFilter::GET,
            Operation::Create => MethodFilter::POST,
            Operation::Update => MethodFilter::PUT,
            Operation::Delete => MethodFilter::DELETE,
        }
    }

    pub fn http_method(&self) -> &'static str {
        match self {
            Operation::List | Operation::Get => "GET",
            Operation::Create => "POST",
            Operation::Update => "PUT",
            Operation::Delete => "DELETE",
        }
    }

    /// Operations addressing a single record by key
    pub fn is_keyed(&self) -> bool {
        self.route_path() == "/:id"
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RegistryError::UnknownOperation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("list".parse::<Operation>().unwrap(), Operation::List);
        assert_eq!(" DELETE ".parse::<Operation>().unwrap(), Operation::Delete);
        assert!("patch".parse::<Operation>().is_err());
    }

    #[test]
    fn test_routes() {
        assert_eq!(Operation::Create.route_path(), "/");
        assert_eq!(Operation::Update.route_path(), "/:id");
        assert!(Operation::Get.is_keyed());
        assert!(!Operation::List.is_keyed());
    }
}
