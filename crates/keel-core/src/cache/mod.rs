//! Cache stores and key derivation.
//!
//! Two stores back the caching behavior: [`LocalCache`] holds typed
//! responses in-process, and implementations of [`SharedCache`] hold
//! serialized payloads in an external backend. [`derive_key`] turns a
//! request's declared name and dimension values into the store key.

mod key;
mod local;
mod shared;

pub use key::derive_key;
pub use local::LocalCache;
pub use shared::{CacheError, MemorySharedCache, SharedCache};
