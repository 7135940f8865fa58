//! Server configuration.

use std::time::Duration;

use anyhow::{Context, Result};
use edge_core::Locale;
use edge_data::{
    BackoffStrategy, DependencyTag, FetchPolicy, RetryPolicy, StorefrontToken, TimeoutConfig,
};
use edge_executor::OrderingStrategy;
use serde::Deserialize;

/// Configuration file for the storefront server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorefrontConfig {
    /// Storefront API connection.
    #[serde(default)]
    pub storefront: ShopConfig,

    /// HTTP listener.
    #[serde(default)]
    pub server: ServerConfig,

    /// Locale used when the request carries none.
    #[serde(default)]
    pub locale: LocaleConfig,

    /// Critical/deferred loading.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Theme and intro state.
    #[serde(default)]
    pub visitor: VisitorConfig,
}

/// Problems found by [`StorefrontConfig::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("storefront.domain is not set (config or PUBLIC_STORE_DOMAIN)")]
    MissingDomain,

    #[error("storefront.api_version is empty")]
    MissingApiVersion,

    #[error("invalid default locale {country}/{language}")]
    InvalidLocale { country: String, language: String },

    #[error("loader.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("visitor.session_cookie is not a valid cookie name: '{0}'")]
    InvalidCookieName(String),

    #[error("visitor.{0} must be greater than zero")]
    ZeroVisitorLimit(&'static str),
}

impl StorefrontConfig {
    /// Load config from a file. Paths ending in `.json` are parsed as JSON,
    /// anything else as TOML.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_env_from<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(domain) = non_empty("PUBLIC_STORE_DOMAIN") {
            self.storefront.domain = domain;
        }
        if let Some(token) = non_empty("PUBLIC_STOREFRONT_API_TOKEN") {
            self.storefront.public_access_token = Some(token);
        }
        if let Some(token) = non_empty("PRIVATE_STOREFRONT_API_TOKEN") {
            self.storefront.private_access_token = Some(token);
        }
        if let Some(bind) = non_empty("STOREFRONT_BIND") {
            self.server.bind = bind;
        }
    }

    /// Check the config is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storefront.domain.trim().is_empty() {
            return Err(ConfigError::MissingDomain);
        }
        if self.storefront.api_version.trim().is_empty() {
            return Err(ConfigError::MissingApiVersion);
        }
        self.locale.resolve()?;
        if self.loader.critical_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("critical_timeout_ms"));
        }
        if self.loader.deferred_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("deferred_timeout_ms"));
        }
        let cookie = &self.visitor.session_cookie;
        if cookie.is_empty()
            || !cookie
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(ConfigError::InvalidCookieName(cookie.clone()));
        }
        if self.visitor.session_ttl_secs == 0 {
            return Err(ConfigError::ZeroVisitorLimit("session_ttl_secs"));
        }
        if self.visitor.max_sessions == 0 {
            return Err(ConfigError::ZeroVisitorLimit("max_sessions"));
        }
        Ok(())
    }
}

/// Storefront API connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopConfig {
    /// Shop domain, e.g. `wicked-works.myshopify.com`.
    #[serde(default)]
    pub domain: String,

    /// Storefront API version.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default)]
    pub public_access_token: Option<String>,

    #[serde(default)]
    pub private_access_token: Option<String>,
}

fn default_api_version() -> String {
    "2025-01".to_string()
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            api_version: default_api_version(),
            public_access_token: None,
            private_access_token: None,
        }
    }
}

impl ShopConfig {
    /// Token to authenticate with. The private token wins when both are set.
    pub fn token(&self) -> Option<StorefrontToken> {
        self.private_access_token
            .clone()
            .map(StorefrontToken::Private)
            .or_else(|| self.public_access_token.clone().map(StorefrontToken::Public))
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Default buyer locale.
#[derive(Debug, Clone, Deserialize)]
pub struct LocaleConfig {
    #[serde(default = "default_country")]
    pub country: String,

    #[serde(default = "default_language")]
    pub language: String,
}

fn default_country() -> String {
    "US".to_string()
}

fn default_language() -> String {
    "EN".to_string()
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            country: default_country(),
            language: default_language(),
        }
    }
}

impl LocaleConfig {
    /// Normalised locale, or an error for malformed codes.
    pub fn resolve(&self) -> Result<Locale, ConfigError> {
        Locale::new(&self.country, &self.language).ok_or_else(|| ConfigError::InvalidLocale {
            country: self.country.clone(),
            language: self.language.clone(),
        })
    }
}

/// Fetch budgets and section ordering.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// Total budget for the critical collections query, retries included.
    #[serde(default = "default_critical_timeout_ms")]
    pub critical_timeout_ms: u64,

    /// Total budget for the deferred recommendations query.
    #[serde(default = "default_deferred_timeout_ms")]
    pub deferred_timeout_ms: u64,

    #[serde(default)]
    pub ordering: OrderingStrategy,
}

fn default_critical_timeout_ms() -> u64 {
    DependencyTag::Catalog.default_timeout().as_millis() as u64
}

fn default_deferred_timeout_ms() -> u64 {
    DependencyTag::Recommendations.default_timeout().as_millis() as u64
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            critical_timeout_ms: default_critical_timeout_ms(),
            deferred_timeout_ms: default_deferred_timeout_ms(),
            ordering: OrderingStrategy::default(),
        }
    }
}

impl LoaderConfig {
    /// Policy for the critical catalog query.
    pub fn critical_policy(&self) -> FetchPolicy {
        let tag = DependencyTag::Catalog;
        FetchPolicy::new(
            TimeoutConfig::from_millis(self.critical_timeout_ms),
            RetryPolicy::new(tag.default_max_retries()).with_backoff(BackoffStrategy::Fixed(
                Duration::from_millis(50),
            )),
        )
    }

    /// Policy for the deferred recommendations query. Single attempt.
    pub fn deferred_policy(&self) -> FetchPolicy {
        FetchPolicy::new(
            TimeoutConfig::from_millis(self.deferred_timeout_ms),
            RetryPolicy::none(),
        )
    }
}

/// Visitor session settings.
#[derive(Debug, Clone, Deserialize)]
pub struct VisitorConfig {
    /// How long the first-visit preloader stays up.
    #[serde(default = "default_intro_duration_ms")]
    pub intro_duration_ms: u64,

    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,

    /// Idle time after which a visitor session may be dropped.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Upper bound on sessions held by the in-memory store.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl VisitorConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

fn default_intro_duration_ms() -> u64 {
    3500
}

fn default_session_cookie() -> String {
    "ww_session".to_string()
}

fn default_session_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_max_sessions() -> usize {
    10_000
}

impl Default for VisitorConfig {
    fn default() -> Self {
        Self {
            intro_duration_ms: default_intro_duration_ms(),
            session_cookie: default_session_cookie(),
            session_ttl_secs: default_session_ttl_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}
