//! Request context with typed parameters.

use std::collections::HashMap;

use crate::lifecycle::TimingContext;
use crate::locale::Locale;

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Query string parameters.
pub type QueryParams = HashMap<String, String>;

/// HTTP headers, keyed by lowercase name.
pub type Headers = HashMap<String, String>;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    /// Convert from an `http` method. Extension methods are not routed.
    pub fn from_http(method: &http::Method) -> Option<Self> {
        match *method {
            http::Method::GET => Some(Self::Get),
            http::Method::POST => Some(Self::Post),
            http::Method::PUT => Some(Self::Put),
            http::Method::DELETE => Some(Self::Delete),
            http::Method::PATCH => Some(Self::Patch),
            http::Method::HEAD => Some(Self::Head),
            http::Method::OPTIONS => Some(Self::Options),
            _ => None,
        }
    }
}

/// Typed request context passed to loaders and renderers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Request path.
    pub path: String,
    /// Query string parameters.
    pub query: QueryParams,
    /// HTTP headers.
    pub headers: Headers,
    /// Country/language context for storefront queries.
    pub locale: Locale,
    /// Timing context for observability.
    pub timing: TimingContext,
}

impl RequestContext {
    /// Create a new request context.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::generate(),
            method,
            path: path.into(),
            query: HashMap::new(),
            headers: HashMap::new(),
            locale: Locale::default(),
            timing: TimingContext::new(),
        }
    }

    /// Build a context from incoming request parts.
    ///
    /// Header values that are not valid UTF-8 are dropped.
    pub fn from_parts(parts: &http::request::Parts) -> Self {
        let method = Method::from_http(&parts.method).unwrap_or(Method::Get);
        let mut ctx = Self::new(method, parts.uri.path());
        for (name, value) in &parts.headers {
            if let Ok(value) = value.to_str() {
                ctx.headers
                    .insert(name.as_str().to_ascii_lowercase(), value.to_string());
            }
        }
        ctx
    }

    /// Replace the request ID.
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Set query parameters.
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Set the locale.
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Get a query parameter by name.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(|s| s.as_str())
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    /// Get a cookie value by name from the `Cookie` header.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        let header = self.header("cookie")?;
        header.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then_some(value)
        })
    }
}
