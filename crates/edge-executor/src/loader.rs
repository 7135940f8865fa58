//! Critical/deferred page data loading.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use edge_core::{LifecyclePhase, Locale, RequestId};
use edge_data::{DependencyTag, QueryError, StorefrontClient};
use edge_observability::StructuredLogger;

use crate::deferred::Deferred;

/// Per-request input to a page loader.
#[derive(Clone)]
pub struct PageRequest {
    pub request_id: RequestId,
    pub locale: Locale,
    pub client: Arc<dyn StorefrontClient>,
    pub logger: StructuredLogger,
}

impl PageRequest {
    pub fn new(
        request_id: RequestId,
        locale: Locale,
        client: Arc<dyn StorefrontClient>,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            request_id,
            locale,
            client,
            logger,
        }
    }

    /// `@inContext` variables for storefront queries.
    pub fn context_variables(&self) -> serde_json::Value {
        serde_json::json!({
            "country": self.locale.country,
            "language": self.locale.language,
        })
    }
}

/// The critical query failed; the page cannot be rendered.
#[derive(Debug, thiserror::Error)]
#[error("critical fetch '{dependency}' failed: {source}")]
pub struct CriticalFetchFailure {
    pub dependency: DependencyTag,
    #[source]
    pub source: QueryError,
}

impl CriticalFetchFailure {
    pub fn new(dependency: DependencyTag, source: QueryError) -> Self {
        Self { dependency, source }
    }

    /// Whether the upstream rejected the request itself.
    pub fn is_client_error(&self) -> bool {
        self.source.is_client_error()
    }
}

/// Loader output: resolved critical data plus a handle to deferred data.
#[derive(Debug)]
pub struct PageResult<C, D> {
    pub critical: C,
    pub deferred: Deferred<D>,
}

/// Splits a page's data into a critical tier and a deferred tier.
#[async_trait]
pub trait PageLoader: Send + Sync {
    type Critical: Send;
    type Deferred: Send + 'static;

    /// Start the deferred fetch. Must not wait for it.
    fn start_deferred(&self, request: &PageRequest) -> Deferred<Self::Deferred>;

    /// Fetch the data the response cannot start without.
    async fn load_critical(
        &self,
        request: &PageRequest,
    ) -> Result<Self::Critical, CriticalFetchFailure>;
}

/// Run a loader: start deferred, await critical, combine.
///
/// The result is only returned once critical data has resolved. When the
/// critical fetch fails the deferred task is cancelled.
pub async fn load_page<L>(
    loader: &L,
    request: &PageRequest,
) -> Result<PageResult<L::Critical, L::Deferred>, CriticalFetchFailure>
where
    L: PageLoader + ?Sized,
{
    let started = Instant::now();
    let logger = &request.logger;

    let deferred = loader.start_deferred(request);
    logger
        .debug_builder("Deferred fetch started")
        .field("phase", LifecyclePhase::Start.name())
        .field("deferred", deferred.name())
        .field("locale", request.locale.tag())
        .emit();

    logger
        .debug_builder("Awaiting critical data")
        .field("phase", LifecyclePhase::CriticalPending.name())
        .emit();

    match loader.load_critical(request).await {
        Ok(critical) => {
            logger
                .info_builder("Critical data resolved")
                .field("phase", LifecyclePhase::CriticalResolved.name())
                .duration_ms("elapsed_ms", started.elapsed())
                .emit();
            Ok(PageResult { critical, deferred })
        }
        Err(e) => {
            deferred.cancel();
            logger
                .error_builder("Critical fetch failed")
                .field("phase", LifecyclePhase::Error(e.to_string()).name())
                .field("dependency", e.dependency.name())
                .field("error", e.source.to_string())
                .duration_ms("elapsed_ms", started.elapsed())
                .emit();
            Err(e)
        }
    }
}
