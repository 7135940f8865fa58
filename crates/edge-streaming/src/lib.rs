//! Streaming primitives for shell-first SSR.
//!
//! This crate enforces shell-first streaming patterns:
//! - `StreamingSink` - Platform-controlled streaming
//! - `Shell` - Shell template abstraction
//! - `Section` - Deferred sections with a slot and pending fallback
//! - `escape_html` - Escaping for text and attribute values

mod escape;
mod section;
mod shell;
mod sink;

pub use escape::*;
pub use section::*;
pub use shell::*;
pub use sink::*;
