//! Critical/deferred page loading and section placement.
//!
//! This crate provides:
//! - `Deferred<T>` - Spawned, never-failing handle for below-the-fold data
//! - `PageLoader` / `load_page` - The critical/deferred split
//! - `OrderingStrategy` - In-order or out-of-order deferred delivery

mod deferred;
mod loader;
mod ordering;

pub use deferred::*;
pub use loader::*;
pub use ordering::*;
