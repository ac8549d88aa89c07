//! Parsing error types for the HTML extraction pipeline
//!
//! Errors carry the field or selector involved so a skipped offer can be
//! logged with its cause.

use crate::domain::RecordError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Required field '{field}' not found in HTML")]
    RequiredFieldMissing {
        field: String,
        context: Option<String>,
    },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid pattern: {pattern} - {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Field '{field}' has unusable value '{value}': {reason}")]
    FieldParseFailed {
        field: String,
        value: String,
        reason: String,
    },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed { url: String, reason: String },

    #[error("Record validation failed: {0}")]
    Record(#[from] RecordError),
}

impl ParsingError {
    /// Create a required field missing error with context
    pub fn required_field_missing(field: &str, context: Option<&str>) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
            context: context.map(ToString::to_string),
        }
    }

    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn field_parse_failed(field: &str, value: &str, reason: impl ToString) -> Self {
        Self::FieldParseFailed {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Per-unit failures (one offer, one field) are recoverable; broken
    /// selector or pattern configuration is not.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::RequiredFieldMissing { .. }
            | Self::FieldParseFailed { .. }
            | Self::UrlResolutionFailed { .. }
            | Self::Record(_) => true,
            Self::InvalidSelector { .. } | Self::InvalidPattern { .. } => false,
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_are_recoverable() {
        assert!(ParsingError::required_field_missing("price", Some("offer")).is_recoverable());
        assert!(ParsingError::from(RecordError::RatingOutOfRange(9)).is_recoverable());
        assert!(!ParsingError::invalid_selector("..", "empty").is_recoverable());
    }

    #[test]
    fn messages_name_the_field() {
        let err = ParsingError::required_field_missing("seller.username", None);
        assert_eq!(err.to_string(), "Required field 'seller.username' not found in HTML");
    }
}
