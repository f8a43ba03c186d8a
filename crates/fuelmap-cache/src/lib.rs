//! Single-slot, file-backed cache of the last aggregation result.

pub mod error;
pub mod store;

pub use error::CacheError;
pub use store::{CacheEnvelope, CacheStore};
