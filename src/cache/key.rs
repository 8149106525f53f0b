//! Cache key derivation
//!
//! Keys hash the request URI together with the ownership column and scope
//! value, so two callers in different scopes never share an entry.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};

/// Prefix shared by every key this crate writes
pub const KEY_PREFIX: &str = "aerocrud";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `uri` on `resource`, scoped by `(owner_column, scope_value)`
    pub fn derive(resource: &str, uri: &str, owner_column: &str, scope_value: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(uri.as_bytes());
        hasher.update([0u8]);
        hasher.update(owner_column.as_bytes());
        hasher.update([0u8]);
        hasher.update(scope_value.as_bytes());

        let digest = URL_SAFE_NO_PAD.encode(hasher.finalize());
        Self(format!("{}:{}:{}", KEY_PREFIX, resource, digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
