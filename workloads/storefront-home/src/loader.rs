//! Home page data loader.

use async_trait::async_trait;
use edge_data::DependencyTag;
use edge_executor::{CriticalFetchFailure, Deferred, PageLoader, PageRequest, PageResult};
use storefront_catalog::{
    decode_collections, decode_recommended_products, Collection, RecommendedProduct,
    ALL_COLLECTIONS, RECOMMENDED_PRODUCTS,
};

/// Loader output for the home route.
pub type HomePage = PageResult<Vec<Collection>, Vec<RecommendedProduct>>;

/// Collections are critical; recommended products are deferred.
#[derive(Debug, Clone, Copy, Default)]
pub struct HomeLoader;

#[async_trait]
impl PageLoader for HomeLoader {
    type Critical = Vec<Collection>;
    type Deferred = Vec<RecommendedProduct>;

    fn start_deferred(&self, request: &PageRequest) -> Deferred<Vec<RecommendedProduct>> {
        let client = request.client.clone();
        let variables = request.context_variables();
        Deferred::spawn("recommended_products", request.logger.clone(), async move {
            let data = client.query(&RECOMMENDED_PRODUCTS, variables).await?;
            decode_recommended_products(data)
        })
    }

    async fn load_critical(
        &self,
        request: &PageRequest,
    ) -> Result<Vec<Collection>, CriticalFetchFailure> {
        let failure = |e| CriticalFetchFailure::new(DependencyTag::Catalog, e);
        let data = request
            .client
            .query(&ALL_COLLECTIONS, request.context_variables())
            .await
            .map_err(failure)?;
        decode_collections(data).map_err(failure)
    }
}
