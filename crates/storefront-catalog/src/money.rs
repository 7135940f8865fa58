//! Money type for representing monetary values.
//!
//! Amounts are kept in the currency's minor unit. The storefront sends
//! decimal strings (`"29.99"`), which are parsed exactly without going
//! through floating point.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Currencies with a known display symbol; anything else keeps its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    USD,
    EUR,
    GBP,
    JPY,
    CAD,
    AUD,
    /// Any other ISO 4217 code, upper-case ASCII.
    Other([u8; 3]),
}

impl Currency {
    /// Get the currency code (e.g., "USD").
    pub fn code(&self) -> &str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            // Constructed only from validated ASCII.
            Currency::Other(code) => std::str::from_utf8(code).unwrap_or("XXX"),
        }
    }

    /// Get the currency symbol, if it has one.
    pub fn symbol(&self) -> Option<&'static str> {
        match self {
            Currency::USD => Some("$"),
            Currency::EUR => Some("\u{20ac}"),
            Currency::GBP => Some("\u{00a3}"),
            Currency::JPY => Some("\u{00a5}"),
            Currency::CAD => Some("CA$"),
            Currency::AUD => Some("A$"),
            Currency::Other(_) => None,
        }
    }

    /// Get the number of decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            Currency::Other(code) if matches!(code, b"KRW" | b"VND" | b"CLP" | b"ISK") => 0,
            _ => 2,
        }
    }

    /// Parse a three-letter currency code.
    pub fn from_code(code: &str) -> Result<Self, MoneyError> {
        let upper = code.trim().to_ascii_uppercase();
        Ok(match upper.as_str() {
            "USD" => Currency::USD,
            "EUR" => Currency::EUR,
            "GBP" => Currency::GBP,
            "JPY" => Currency::JPY,
            "CAD" => Currency::CAD,
            "AUD" => Currency::AUD,
            other => {
                let bytes: [u8; 3] = other
                    .as_bytes()
                    .try_into()
                    .map_err(|_| MoneyError::InvalidCurrency(code.to_string()))?;
                if !bytes.iter().all(u8::is_ascii_uppercase) {
                    return Err(MoneyError::InvalidCurrency(code.to_string()));
                }
                Currency::Other(bytes)
            }
        })
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors parsing storefront money values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),
}

/// A monetary value with currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Money {
    /// Amount in smallest currency unit (e.g., cents).
    pub amount_minor: i64,
    pub currency: Currency,
}

impl Money {
    /// Create a new Money value from minor units.
    pub fn new(amount_minor: i64, currency: Currency) -> Self {
        Self {
            amount_minor,
            currency,
        }
    }

    /// Parse a decimal amount string in the given currency.
    ///
    /// Digits beyond the currency's precision are rounded half-up.
    pub fn parse(amount: &str, currency_code: &str) -> Result<Self, MoneyError> {
        let currency = Currency::from_code(currency_code)?;
        let invalid = || MoneyError::InvalidAmount(amount.to_string());

        let trimmed = amount.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let places = currency.decimal_places() as usize;
        let mut minor: i64 = whole.parse().map_err(|_| invalid())?;
        for i in 0..places {
            let digit = frac.as_bytes().get(i).map(|b| (b - b'0') as i64).unwrap_or(0);
            minor = minor
                .checked_mul(10)
                .and_then(|m| m.checked_add(digit))
                .ok_or_else(invalid)?;
        }
        if frac.as_bytes().get(places).is_some_and(|b| *b >= b'5') {
            minor = minor.checked_add(1).ok_or_else(invalid)?;
        }

        Ok(Self::new(if negative { -minor } else { minor }, currency))
    }

    /// Format as a display string: `$29.99`, or `29.99 SEK` without a symbol.
    pub fn display(&self) -> String {
        let amount = self.display_amount();
        match self.currency.symbol() {
            Some(symbol) if self.amount_minor < 0 => {
                format!("-{}{}", symbol, amount.trim_start_matches('-'))
            }
            Some(symbol) => format!("{}{}", symbol, amount),
            None => format!("{} {}", amount, self.currency.code()),
        }
    }

    /// Format without symbol (e.g., "29.99").
    pub fn display_amount(&self) -> String {
        let places = self.currency.decimal_places();
        let sign = if self.amount_minor < 0 { "-" } else { "" };
        let abs = self.amount_minor.unsigned_abs();
        if places == 0 {
            return format!("{}{}", sign, abs);
        }
        let divisor = 10u64.pow(places);
        format!(
            "{}{}.{:0width$}",
            sign,
            abs / divisor,
            abs % divisor,
            width = places as usize
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Wire shape of the storefront `MoneyV2` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    pub amount: String,
    pub currency_code: String,
}

impl TryFrom<MoneyV2> for Money {
    type Error = MoneyError;

    fn try_from(value: MoneyV2) -> Result<Self, Self::Error> {
        Money::parse(&value.amount, &value.currency_code)
    }
}
