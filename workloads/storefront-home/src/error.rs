//! Request-boundary errors.

use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use edge_core::RequestId;
use edge_executor::CriticalFetchFailure;
use edge_kv::CacheError;

use crate::sections::render_error_page;

/// Failure that ends a request with an error page.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Critical(#[from] CriticalFetchFailure),

    #[error("invalid theme '{0}'")]
    InvalidTheme(String),

    #[error("visitor storage failed: {0}")]
    Storage(#[from] CacheError),
}

impl PageError {
    /// Upstream rejections and bad input are 400; everything else is 500.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Critical(failure) if failure.is_client_error() => StatusCode::BAD_REQUEST,
            Self::InvalidTheme(_) => StatusCode::BAD_REQUEST,
            Self::Critical(_) | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A `PageError` tagged with the request it ended.
#[derive(Debug)]
pub struct PageFailure {
    pub request_id: RequestId,
    pub error: PageError,
}

impl PageFailure {
    pub fn new(request_id: RequestId, error: impl Into<PageError>) -> Self {
        Self {
            request_id,
            error: error.into(),
        }
    }
}

impl IntoResponse for PageFailure {
    fn into_response(self) -> Response {
        let status = self.error.status();
        let body = render_error_page(status.as_u16(), self.request_id.as_str());
        (
            status,
            [
                (header::CACHE_CONTROL, "no-store".to_string()),
                (
                    header::HeaderName::from_static("x-request-id"),
                    self.request_id.to_string(),
                ),
            ],
            Html(body),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_data::{DependencyTag, QueryError};

    fn critical(source: QueryError) -> PageError {
        PageError::Critical(CriticalFetchFailure::new(DependencyTag::Catalog, source))
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            critical(QueryError::GraphQl(vec!["bad country".into()])).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            critical(QueryError::Http {
                status: 401,
                url: "u".into()
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            critical(QueryError::Http {
                status: 502,
                url: "u".into()
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            critical(QueryError::Timeout("2s".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            critical(QueryError::Deserialization("eof".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            PageError::InvalidTheme("sepia".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_failure_response() {
        let failure = PageFailure::new(
            RequestId::from_string("req-1"),
            PageError::InvalidTheme("sepia".into()),
        );
        let response = failure.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["x-request-id"], "req-1");
    }
}
