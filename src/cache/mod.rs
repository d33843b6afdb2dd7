//! Single-value read-through cache
//!
//! This module provides [`SingleValueCache`], which holds one value addressed
//! by a key. The first call to [`SingleValueCache::ready`] loads the value
//! from the backing store, falling back to the fetcher on a miss; every caller
//! shares that one load. [`SingleValueCache::refresh`] always goes to the
//! fetcher and writes the result through to the store.

mod error;
mod single_value;

pub use error::{CacheError, SharedError};
pub use single_value::{CacheState, SingleValueCache};
