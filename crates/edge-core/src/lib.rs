//! Core request abstractions for the storefront edge renderer.
//!
//! This crate provides the fundamental types:
//! - `RequestContext` - Typed request parameters
//! - `Locale` - Country/language context for storefront queries
//! - `LifecyclePhase` / `TimingContext` - Request lifecycle tracking
//! - `WorkloadError` - Streaming and section errors

mod context;
mod error;
mod lifecycle;
mod locale;

pub use context::*;
pub use error::*;
pub use lifecycle::*;
pub use locale::*;
