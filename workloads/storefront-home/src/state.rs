//! Visitor state: theme preference and the seen-intro flag.
//!
//! State is loaded per request from the session store and handed to the
//! renderers explicitly.

use std::time::Duration;

use edge_core::RequestContext;
use edge_kv::{Cache, CacheError, Session, SessionId};
use serde::{Deserialize, Serialize};

/// Client hint carrying the browser's colour scheme.
pub const COLOR_SCHEME_HINT: &str = "sec-ch-prefers-color-scheme";

/// Stored theme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    pub const ALL: [ThemePreference; 3] = [Self::Light, Self::Dark, Self::System];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    /// Accessible label for the switcher button.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Light => "Light mode",
            Self::Dark => "Dark mode",
            Self::System => "System theme",
        }
    }

    /// Concrete theme to render. `System` follows the client hint and
    /// falls back to dark.
    pub fn resolve(&self, client_hint: Option<&str>) -> ResolvedTheme {
        match self {
            Self::Light => ResolvedTheme::Light,
            Self::Dark => ResolvedTheme::Dark,
            Self::System => match client_hint.map(str::trim) {
                Some(hint) if hint.eq_ignore_ascii_case("light") => ResolvedTheme::Light,
                _ => ResolvedTheme::Dark,
            },
        }
    }
}

impl std::str::FromStr for ThemePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(other.to_string()),
        }
    }
}

/// Theme actually applied to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTheme {
    Light,
    Dark,
}

impl ResolvedTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// Per-session visitor state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorState {
    #[serde(default)]
    pub theme: ThemePreference,
    #[serde(default)]
    pub shown_intro: bool,
}

/// A visitor resolved from the request cookie.
#[derive(Debug, Clone)]
pub struct Visitor {
    pub id: SessionId,
    pub state: VisitorState,
    /// The cookie was missing or invalid; a fresh id was generated.
    pub is_new: bool,
}

/// Visitor sessions keyed by the session cookie.
#[derive(Clone)]
pub struct VisitorStore {
    sessions: Session<VisitorState>,
    cookie_name: String,
}

impl VisitorStore {
    /// Sessions expire after `ttl` without a write.
    pub fn new(cache: Cache, cookie_name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            sessions: Session::new(cache).with_ttl(ttl),
            cookie_name: cookie_name.into(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Look up the visitor for a request. Nothing is written.
    pub fn load(&self, ctx: &RequestContext) -> Result<Visitor, CacheError> {
        match ctx.cookie(&self.cookie_name).and_then(SessionId::parse) {
            Some(id) => {
                let state = self.sessions.get_or_default(&id)?;
                Ok(Visitor {
                    id,
                    state,
                    is_new: false,
                })
            }
            None => Ok(Visitor {
                id: SessionId::generate(),
                state: VisitorState::default(),
                is_new: true,
            }),
        }
    }

    /// Record that the intro has played for this session.
    pub fn mark_intro_shown(&self, id: &SessionId) -> Result<VisitorState, CacheError> {
        self.sessions.update(id, |state| state.shown_intro = true)
    }

    /// Store a theme preference for this session.
    pub fn set_theme(
        &self,
        id: &SessionId,
        theme: ThemePreference,
    ) -> Result<VisitorState, CacheError> {
        self.sessions.update(id, |state| state.theme = theme)
    }

    /// `Set-Cookie` value carrying the session id.
    pub fn set_cookie(&self, id: &SessionId) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            self.cookie_name, id
        )
    }
}
