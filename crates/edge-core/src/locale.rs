//! Country/language context for storefront queries.

use serde::{Deserialize, Serialize};

/// Buyer locale sent with every storefront query via `@inContext`.
///
/// Codes are stored upper-case, e.g. `US` / `EN` or `BR` / `PT_BR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locale {
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    /// Storefront language code.
    pub language: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            country: "US".to_string(),
            language: "EN".to_string(),
        }
    }
}

impl Locale {
    /// Create a locale, returning `None` if either code is malformed.
    pub fn new(country: &str, language: &str) -> Option<Self> {
        Some(Self {
            country: parse_country(country)?,
            language: parse_language(language)?,
        })
    }

    /// Resolve the locale for a request.
    ///
    /// Precedence per field: explicit query value, then the first
    /// `Accept-Language` tag, then `default`. Malformed values are skipped.
    pub fn resolve(
        country: Option<&str>,
        language: Option<&str>,
        accept_language: Option<&str>,
        default: &Locale,
    ) -> Self {
        let (accept_lang, accept_country) = accept_language
            .and_then(parse_accept_language)
            .map(|(lang, country)| (Some(lang), country))
            .unwrap_or((None, None));

        let country = country
            .and_then(parse_country)
            .or(accept_country)
            .unwrap_or_else(|| default.country.clone());
        let language = language
            .and_then(parse_language)
            .or(accept_lang)
            .unwrap_or_else(|| default.language.clone());

        Self { country, language }
    }

    /// Tag form used in cache keys and logs, e.g. `EN-US`.
    pub fn tag(&self) -> String {
        format!("{}-{}", self.language, self.country)
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Parse a two-letter country code.
pub fn parse_country(code: &str) -> Option<String> {
    let code = code.trim();
    (code.len() == 2 && code.bytes().all(|b| b.is_ascii_alphabetic()))
        .then(|| code.to_ascii_uppercase())
}

/// Parse a language code: `en`, or a regional variant like `pt_br` / `pt-BR`.
pub fn parse_language(code: &str) -> Option<String> {
    let code = code.trim().replace('-', "_");
    let valid = match code.split_once('_') {
        None => code.len() == 2 && code.bytes().all(|b| b.is_ascii_alphabetic()),
        Some((lang, region)) => {
            lang.len() == 2
                && region.len() == 2
                && lang.bytes().chain(region.bytes()).all(|b| b.is_ascii_alphabetic())
        }
    };
    valid.then(|| code.to_ascii_uppercase())
}

/// Take the first `Accept-Language` entry and split it into language and region.
fn parse_accept_language(header: &str) -> Option<(String, Option<String>)> {
    let first = header.split(',').next()?.split(';').next()?.trim();
    let mut parts = first.split(['-', '_']);
    let language = parse_language(parts.next()?)?;
    let country = parts.next().and_then(parse_country);
    Some((language, country))
}
