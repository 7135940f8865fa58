//! Storefront data access with dependency tagging and timeouts.
//!
//! This crate provides:
//! - `StorefrontClient` - GraphQL query boundary, with an HTTPS implementation
//! - `GraphQlQuery` / `GraphQlResponse` - Wire types
//! - `DependencyTag` - Semantic dependency categories
//! - `TimeoutConfig` - Per-dependency timeouts
//! - `RetryPolicy` - Retry strategies

mod client;
mod dependency;
mod graphql;
mod retry;
mod timeout;

pub use client::*;
pub use dependency::*;
pub use graphql::*;
pub use retry::*;
pub use timeout::*;
