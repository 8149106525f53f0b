//! Column and table naming convention

use convert_case::{Case, Casing};

/// Convert an identifier to snake_case (`UserName` -> `user_name`, `HTTPCode` -> `http_code`)
pub fn snake_case(name: &str) -> String {
    name.to_case(Case::Snake)
}

/// Last path segment of a type name, without generic arguments
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
