//! Dependency tagging for semantic categorization.

use std::time::Duration;

/// Storefront data dependencies with semantic meaning.
///
/// Each tag carries a default timeout, retry budget and render tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyTag {
    /// Catalog collections shown above the fold.
    Catalog,
    /// Product recommendations shown below the fold.
    Recommendations,
    /// Custom dependency with name.
    Custom(&'static str),
}

impl DependencyTag {
    /// Get the default timeout for this dependency type.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::Catalog => Duration::from_millis(2000),
            Self::Recommendations => Duration::from_millis(4000),
            Self::Custom(_) => Duration::from_millis(1000),
        }
    }

    /// Get the default max retries for this dependency type.
    ///
    /// Recommendations get a single attempt.
    pub fn default_max_retries(&self) -> u32 {
        match self {
            Self::Catalog => 1,
            Self::Recommendations | Self::Custom(_) => 0,
        }
    }

    /// Check if this dependency is critical (must resolve before the response starts).
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Catalog)
    }

    /// Get the name of this dependency.
    pub fn name(&self) -> &str {
        match self {
            Self::Catalog => "catalog",
            Self::Recommendations => "recommendations",
            Self::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for DependencyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
