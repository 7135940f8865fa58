//! Storefront API client with dependency tagging.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;

use crate::dependency::DependencyTag;
use crate::graphql::{GraphQlQuery, GraphQlRequest, GraphQlResponse};
use crate::retry::RetryPolicy;
use crate::timeout::{with_timeout, TimeoutConfig};

/// Error type for storefront queries.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("Request error: {0}")]
    Request(String),
}

impl QueryError {
    /// Whether the upstream rejected the request itself (bad variables,
    /// token or query) rather than failing to serve it.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::GraphQl(_) => true,
            Self::Http { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }
}

/// Executes GraphQL queries against the commerce backend.
#[async_trait]
pub trait StorefrontClient: Send + Sync {
    /// Run `query` with `variables` and return the response's `data` object.
    async fn query(
        &self,
        query: &GraphQlQuery,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value, QueryError>;
}

/// Storefront API access token.
#[derive(Clone, PartialEq, Eq)]
pub enum StorefrontToken {
    /// Public token, safe to expose to browsers.
    Public(String),
    /// Private token for server-side requests.
    Private(String),
}

impl StorefrontToken {
    /// Header name and value to authenticate with.
    pub fn header(&self) -> (&'static str, &str) {
        match self {
            Self::Public(token) => ("X-Shopify-Storefront-Access-Token", token),
            Self::Private(token) => ("Shopify-Storefront-Private-Token", token),
        }
    }
}

impl std::fmt::Debug for StorefrontToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public(_) => write!(f, "Public(****)"),
            Self::Private(_) => write!(f, "Private(****)"),
        }
    }
}

/// Fetch policy combining timeout and retry configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchPolicy {
    pub timeout: TimeoutConfig,
    pub retry: RetryPolicy,
}

impl FetchPolicy {
    /// Create a new fetch policy.
    pub fn new(timeout: TimeoutConfig, retry: RetryPolicy) -> Self {
        Self { timeout, retry }
    }

    /// Create from a dependency tag's defaults.
    pub fn from_tag(tag: DependencyTag) -> Self {
        let retries = tag.default_max_retries();
        let retry = if retries == 0 {
            RetryPolicy::none()
        } else {
            RetryPolicy::new(retries)
        };
        Self {
            timeout: TimeoutConfig::from_total(tag.default_timeout()),
            retry,
        }
    }
}

/// Storefront API client over HTTPS.
///
/// Each query runs under its tag's fetch policy: the total timeout bounds
/// every attempt together, and retries only fire on transient failures.
pub struct HttpStorefrontClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<StorefrontToken>,
    policies: HashMap<DependencyTag, FetchPolicy>,
}

impl HttpStorefrontClient {
    /// Create a client for `https://{domain}/api/{version}/graphql.json`.
    pub fn new(domain: &str, api_version: &str, token: Option<StorefrontToken>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint_url(domain, api_version),
            token,
            policies: HashMap::new(),
        }
    }

    /// Override the fetch policy for a dependency tag.
    pub fn with_policy(mut self, tag: DependencyTag, policy: FetchPolicy) -> Self {
        self.policies.insert(tag, policy);
        self
    }

    /// The GraphQL endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Effective policy for a tag.
    pub fn policy_for(&self, tag: DependencyTag) -> FetchPolicy {
        self.policies
            .get(&tag)
            .cloned()
            .unwrap_or_else(|| FetchPolicy::from_tag(tag))
    }

    async fn send_once(
        &self,
        query: &GraphQlQuery,
        variables: &serde_json::Value,
        policy: &FetchPolicy,
    ) -> Result<serde_json::Value, QueryError> {
        let body = GraphQlRequest {
            query: query.document,
            operation_name: query.name,
            variables,
        };

        let mut request = self
            .http
            .post(&self.endpoint)
            .timeout(policy.timeout.total)
            .json(&body);
        if let Some(token) = &self.token {
            let (name, value) = token.header();
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| map_reqwest_error(e, policy))?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(QueryError::Http {
                status,
                url: self.endpoint.clone(),
            });
        }

        let envelope: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| QueryError::Deserialization(e.to_string()))?;
        envelope.into_data()
    }
}

#[async_trait]
impl StorefrontClient for HttpStorefrontClient {
    async fn query(
        &self,
        query: &GraphQlQuery,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value, QueryError> {
        let policy = self.policy_for(query.tag);
        let started = Instant::now();

        let attempts = async {
            let mut attempt = 0;
            loop {
                match self.send_once(query, &variables, &policy).await {
                    Ok(data) => return Ok(data),
                    Err(e) if policy.retry.should_retry(&e, attempt) => {
                        tracing::debug!(
                            query = query.name,
                            tag = %query.tag,
                            attempt,
                            error = %e,
                            "retrying storefront query"
                        );
                        tokio::time::sleep(policy.retry.backoff.delay_for_attempt(attempt)).await;
                        attempt += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        let result = with_timeout(policy.timeout.total, attempts)
            .await
            .map_err(|e| QueryError::Timeout(e.to_string()))
            .and_then(|r| r);

        tracing::debug!(
            query = query.name,
            tag = %query.tag,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "storefront query finished"
        );
        result
    }
}

/// Build the Storefront API GraphQL endpoint for a shop domain.
pub fn endpoint_url(domain: &str, api_version: &str) -> String {
    let domain = domain
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    format!("https://{}/api/{}/graphql.json", domain, api_version)
}

fn map_reqwest_error(e: reqwest::Error, policy: &FetchPolicy) -> QueryError {
    if e.is_timeout() {
        QueryError::Timeout(format!("after {:?}", policy.timeout.total))
    } else if e.is_connect() {
        QueryError::Connection(e.to_string())
    } else {
        QueryError::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_endpoint_url() {
        assert_eq!(
            endpoint_url("wicked-works.myshopify.com", "2025-01"),
            "https://wicked-works.myshopify.com/api/2025-01/graphql.json"
        );
        assert_eq!(
            endpoint_url("https://shop.test/", "2024-10"),
            "https://shop.test/api/2024-10/graphql.json"
        );
    }

    #[test]
    fn test_token_headers() {
        let public = StorefrontToken::Public("pub".into());
        assert_eq!(public.header(), ("X-Shopify-Storefront-Access-Token", "pub"));
        let private = StorefrontToken::Private("priv".into());
        assert_eq!(private.header(), ("Shopify-Storefront-Private-Token", "priv"));
        assert_eq!(format!("{:?}", private), "Private(****)");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(QueryError::GraphQl(vec!["x".into()]).is_client_error());
        assert!(QueryError::Http { status: 401, url: String::new() }.is_client_error());
        assert!(!QueryError::Http { status: 502, url: String::new() }.is_client_error());
        assert!(!QueryError::Timeout("2s".into()).is_client_error());
    }

    #[test]
    fn test_policy_override() {
        let client = HttpStorefrontClient::new("shop.test", "2025-01", None).with_policy(
            DependencyTag::Recommendations,
            FetchPolicy::new(TimeoutConfig::from_millis(250), RetryPolicy::none()),
        );
        assert_eq!(
            client.policy_for(DependencyTag::Recommendations).timeout.total,
            Duration::from_millis(250)
        );
        assert_eq!(
            client.policy_for(DependencyTag::Catalog),
            FetchPolicy::from_tag(DependencyTag::Catalog)
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_fails() {
        let client = HttpStorefrontClient::new("127.0.0.1:9", "2025-01", None).with_policy(
            DependencyTag::Catalog,
            FetchPolicy::new(TimeoutConfig::from_millis(500), RetryPolicy::none()),
        );
        let query = GraphQlQuery::new("Shop", "query Shop { shop { name } }", DependencyTag::Catalog);
        let result = client.query(&query, serde_json::json!({})).await;
        assert!(result.is_err());
    }
}
