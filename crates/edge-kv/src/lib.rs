//! Key-value storage for visitor state.
//!
//! Components receive an `Arc<dyn KeyValueStore>` instead of reaching for
//! ambient storage. `Cache` layers JSON serialization on top, and
//! `Session<T>` keeps per-visitor state under `session:{id}`.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use edge_kv::{Cache, MemoryStore};
//!
//! let cache = Cache::new(Arc::new(MemoryStore::new()));
//! cache.set("newsletter:ada@example.com", &subscriber)?;
//! let found: Option<Subscriber> = cache.get("newsletter:ada@example.com")?;
//! ```

mod error;
mod kv;
mod session;
mod store;

pub use error::CacheError;
pub use kv::Cache;
pub use session::{Session, SessionData, SessionId};
pub use store::{KeyValueStore, MemoryStore};
