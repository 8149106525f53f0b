//! # Type Coercion Engine
//!
//! Converts untyped request values into each field's semantic type and
//! binds them onto record instances through the static field table.

mod binding;
mod coercer;
mod errors;

pub use binding::{Binder, RequestValues};
pub use coercer::{Coercer, CoercionPolicy, TIME_LAYOUT};
pub use errors::{CoercionError, CoercionResult};
