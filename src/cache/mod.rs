//! # Cache
//!
//! Cache-aside support for generated resources: the key-value store
//! collaborator, key derivation, read-through lookup and population, and
//! the delayed double-delete used on update and delete.

mod errors;
mod key;
mod layer;
mod scheduler;
mod store;

pub use errors::{CacheError, CacheResult};
pub use key::{CacheKey, KEY_PREFIX};
pub use layer::CacheLayer;
pub use scheduler::InvalidationScheduler;
pub use store::{CacheStats, CacheStore, MemoryCache};
