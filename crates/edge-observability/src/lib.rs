//! Observability for the storefront edge renderer.
//!
//! This crate provides:
//! - `StructuredLogger` - Request-scoped structured logging over `tracing`
//! - `MetricsCollector` - Per-request timing and dependency metrics
//! - `TraceContext` - W3C trace context propagation

mod logging;
mod metrics;
mod span;

pub use logging::*;
pub use metrics::*;
pub use span::*;

pub use edge_core::{RequestId, TimingContext};
