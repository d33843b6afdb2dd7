//! valuecache library
//!
//! A read-through cache for a single value: lazy at-most-once initialization
//! from a backing store with fallback to an authoritative fetcher, plus an
//! explicit refresh that writes through to the store.

pub mod cache;
pub mod cli;
pub mod fetch;
pub mod logging;
pub mod refresh;
pub mod store;

pub use cache::{CacheError, CacheState, SingleValueCache};
pub use fetch::{Fetcher, HttpFetcher};
pub use store::{BoxError, FileStore, MemoryStore, NullStore, Store};
