//! GraphQL wire types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::QueryError;
use crate::dependency::DependencyTag;

/// A named GraphQL document bound to a dependency tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphQlQuery {
    /// Operation name, used for logging and test fixtures.
    pub name: &'static str,
    /// Query document text.
    pub document: &'static str,
    /// Dependency the query belongs to.
    pub tag: DependencyTag,
}

impl GraphQlQuery {
    pub const fn new(name: &'static str, document: &'static str, tag: DependencyTag) -> Self {
        Self {
            name,
            document,
            tag,
        }
    }
}

/// Request body POSTed to the GraphQL endpoint.
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    #[serde(rename = "operationName")]
    pub operation_name: &'a str,
    pub variables: &'a serde_json::Value,
}

/// A single error entry from a GraphQL response.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

/// Response envelope: `{ "data": ..., "errors": [...] }`.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

impl GraphQlResponse {
    /// Extract `data`, treating any reported error as a failure.
    ///
    /// Partial data accompanied by errors is discarded.
    pub fn into_data(self) -> Result<serde_json::Value, QueryError> {
        if !self.errors.is_empty() {
            return Err(QueryError::GraphQl(
                self.errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        match self.data {
            Some(serde_json::Value::Null) | None => Err(QueryError::Deserialization(
                "response has neither data nor errors".to_string(),
            )),
            Some(data) => Ok(data),
        }
    }
}

/// Decode a query's `data` payload into a typed response.
pub fn decode<T: DeserializeOwned>(data: serde_json::Value) -> Result<T, QueryError> {
    serde_json::from_value(data).map_err(|e| QueryError::Deserialization(e.to_string()))
}
