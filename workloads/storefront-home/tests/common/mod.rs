//! Scripted storefront client, failing store and payload fixtures shared
//! by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use edge_data::{GraphQlQuery, QueryError, StorefrontClient};
use edge_kv::{CacheError, KeyValueStore};
use serde_json::{json, Value};
use tokio::sync::oneshot;

// === Fake client ===

#[derive(Default)]
pub struct FakeClient {
    outcomes: HashMap<&'static str, Result<Value, QueryError>>,
    gates: Mutex<HashMap<&'static str, oneshot::Receiver<()>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, query: GraphQlQuery, data: Value) -> Self {
        self.outcomes.insert(query.name, Ok(data));
        self
    }

    pub fn fail(mut self, query: GraphQlQuery, error: QueryError) -> Self {
        self.outcomes.insert(query.name, Err(error));
        self
    }

    /// Hold `query` until the returned sender fires.
    pub fn gate(&self, query: GraphQlQuery) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(query.name, rx);
        tx
    }

    pub fn called(&self, query: GraphQlQuery) -> bool {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .any(|(name, _)| name == query.name)
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorefrontClient for FakeClient {
    async fn query(&self, query: &GraphQlQuery, variables: Value) -> Result<Value, QueryError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.name.to_string(), variables));

        let gate = self.gates.lock().unwrap().remove(query.name);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        self.outcomes
            .get(query.name)
            .cloned()
            .unwrap_or_else(|| Err(QueryError::Request(format!("unscripted {}", query.name))))
    }
}

// === Failing store ===

/// Store whose every operation fails, as an unreachable backend would.
#[derive(Debug, Default)]
pub struct FailingStore;

impl FailingStore {
    fn down() -> CacheError {
        CacheError::StoreError("store unavailable".into())
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(Self::down())
    }

    fn set(&self, _key: &str, _value: &[u8]) -> Result<(), CacheError> {
        Err(Self::down())
    }

    fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(Self::down())
    }

    fn keys_with_prefix(&self, _prefix: &str) -> Result<Vec<String>, CacheError> {
        Err(Self::down())
    }
}

// === Fixtures ===

pub fn collections_json(n: usize) -> Value {
    let nodes: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "id": format!("gid://shopify/Collection/{}", i),
                "title": format!("Collection {}", i),
                "handle": format!("collection-{}", i),
                "description": "Curated pieces",
                "image": null,
                "products": { "nodes": [ { "id": format!("gid://shopify/Product/{}", i) } ] }
            })
        })
        .collect();
    json!({ "collections": { "nodes": nodes } })
}

pub fn products_json(n: usize) -> Value {
    let nodes: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "id": format!("gid://shopify/Product/{}", i),
                "title": format!("Product {}", i),
                "handle": format!("product-{}", i),
                "availableForSale": i % 2 == 0,
                "priceRange": { "minVariantPrice": { "amount": "29.99", "currencyCode": "USD" } },
                "featuredImage": null
            })
        })
        .collect();
    json!({ "products": { "nodes": nodes } })
}
