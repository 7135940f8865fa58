//! Wicked Works storefront home route.
//!
//! Collections are fetched before the response starts and stream with the
//! shell; recommended products are fetched concurrently and streamed when
//! they arrive. A failed recommendations fetch renders nothing, a failed
//! collections fetch renders an error page.

pub mod config;
pub mod error;
pub mod loader;
pub mod newsletter;
pub mod page;
pub mod sections;
pub mod server;
pub mod state;

pub use config::{ConfigError, StorefrontConfig};
pub use error::{PageError, PageFailure};
pub use loader::{HomeLoader, HomePage};
pub use server::{router, AppState};
