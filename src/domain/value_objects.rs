//! # Domain Value Objects
//!
//! Immutable value types shared by the harvested records.
//! Every constructor validates its input and returns a [`RecordError`]
//! instead of producing a half-valid value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Record validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("field '{0}' cannot be empty")]
    EmptyField(&'static str),
    #[error("URL '{url}' is invalid: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("URL '{0}' must be an absolute http(s) URL with a host")]
    RelativeUrl(String),
    #[error("rating {0} is outside the 0-5 star range")]
    RatingOutOfRange(i64),
    #[error("price '{0}' is not a valid non-negative number")]
    InvalidPrice(String),
    #[error("server name '{0}' given without a server id")]
    ServerNameWithoutId(String),
}

/// Absolute `http`/`https` URL with a host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AbsoluteUrl(Url);

impl AbsoluteUrl {
    /// Parses and validates an absolute URL
    ///
    /// # Errors
    /// Returns error if the text is empty, malformed, relative, or not http(s)
    pub fn parse(raw: &str) -> Result<Self, RecordError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RecordError::EmptyField("url"));
        }

        let parsed = Url::parse(raw).map_err(|e| match e {
            url::ParseError::RelativeUrlWithoutBase => RecordError::RelativeUrl(raw.to_string()),
            other => RecordError::InvalidUrl {
                url: raw.to_string(),
                reason: other.to_string(),
            },
        })?;

        Self::from_url(parsed)
    }

    /// Wraps an already parsed URL after checking scheme and host
    ///
    /// # Errors
    /// Returns error if the URL is not http(s) or has no host
    pub fn from_url(url: Url) -> Result<Self, RecordError> {
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(RecordError::RelativeUrl(url.to_string()));
        }
        Ok(Self(url))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub const fn as_url(&self) -> &Url {
        &self.0
    }

    /// Host name, used as the rate limiting key
    #[must_use]
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    /// Path plus query, relative to the origin
    #[must_use]
    pub fn path_and_query(&self) -> String {
        match self.0.query() {
            Some(query) => format!("{}?{}", self.0.path(), query),
            None => self.0.path().to_string(),
        }
    }
}

impl fmt::Display for AbsoluteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AbsoluteUrl {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AbsoluteUrl {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AbsoluteUrl> for String {
    fn from(value: AbsoluteUrl) -> Self {
        value.0.into()
    }
}

/// Seller rating in whole stars, 0 through 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct RatingStars(u8);

impl RatingStars {
    pub const MAX: u8 = 5;

    /// # Errors
    /// Returns error if the value is outside `0..=5`
    pub fn new(stars: i64) -> Result<Self, RecordError> {
        u8::try_from(stars)
            .ok()
            .filter(|s| *s <= Self::MAX)
            .map(Self)
            .ok_or(RecordError::RatingOutOfRange(stars))
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for RatingStars {
    type Error = RecordError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingStars> for u8 {
    fn from(value: RatingStars) -> Self {
        value.0
    }
}

/// Non-negative amount with its currency label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    #[serde(rename = "priceValue")]
    value: Decimal,
    #[serde(rename = "priceCurrency")]
    currency: String,
}

impl Price {
    /// Builds a price from the raw amount text and currency label.
    ///
    /// Grouping whitespace inside the amount (`"1 250.50"`) is ignored.
    ///
    /// # Errors
    /// Returns error if the amount is unparsable or negative, or the currency is blank
    pub fn parse(amount: &str, currency: &str) -> Result<Self, RecordError> {
        let compact: String = amount.chars().filter(|c| !c.is_whitespace()).collect();
        let value = Decimal::from_str(&compact)
            .ok()
            .filter(|v| !v.is_sign_negative() || v.is_zero())
            .ok_or_else(|| RecordError::InvalidPrice(amount.trim().to_string()))?;

        let currency = currency.trim();
        if currency.is_empty() {
            return Err(RecordError::EmptyField("price_currency"));
        }

        Ok(Self {
            value,
            currency: currency.to_string(),
        })
    }

    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.value
    }

    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }
}

/// Rejects blank text for a required field, returning it trimmed
pub(crate) fn non_empty(field: &'static str, text: &str) -> Result<String, RecordError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(RecordError::EmptyField(field))
    } else {
        Ok(trimmed.to_string())
    }
}
