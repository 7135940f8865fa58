//! Newsletter sign-up.

use chrono::{DateTime, Utc};
use edge_kv::{cache_key, Cache, CacheError};
use serde::{Deserialize, Serialize};

const MAX_EMAIL_LEN: usize = 254;

/// State of the sign-up form as rendered by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NewsletterStatus {
    #[default]
    Idle,
    Success,
    Error,
}

/// Rejected email address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailError {
    #[error("email is empty")]
    Empty,

    #[error("email is longer than {MAX_EMAIL_LEN} characters")]
    TooLong,

    #[error("email is malformed")]
    Malformed,
}

/// Validate and normalise an address. Returns the trimmed, lower-cased form.
pub fn validate_email(raw: &str) -> Result<String, EmailError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(EmailError::Empty);
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(EmailError::TooLong);
    }
    let (local, domain) = email.split_once('@').ok_or(EmailError::Malformed)?;
    let valid = !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !domain.ends_with('.');
    if !valid {
        return Err(EmailError::Malformed);
    }
    Ok(email.to_lowercase())
}

/// A stored subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
}

/// Subscriber list in the key-value store.
#[derive(Clone)]
pub struct NewsletterList {
    cache: Cache,
}

impl NewsletterList {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    /// Add an already validated address. Returns `false` if it was already
    /// subscribed; the original record is kept.
    pub fn subscribe(&self, email: &str) -> Result<bool, CacheError> {
        let key = cache_key!("newsletter", email);
        if self.cache.exists(&key)? {
            return Ok(false);
        }
        let subscriber = Subscriber {
            email: email.to_string(),
            subscribed_at: Utc::now(),
        };
        self.cache.set(&key, &subscriber)?;
        Ok(true)
    }

    pub fn get(&self, email: &str) -> Result<Option<Subscriber>, CacheError> {
        self.cache.get(&cache_key!("newsletter", email))
    }

    pub fn count(&self) -> Result<usize, CacheError> {
        Ok(self.cache.keys("newsletter:")?.len())
    }
}
