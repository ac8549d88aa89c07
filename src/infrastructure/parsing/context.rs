//! Parsing context shared by the extractors
//!
//! Holds the origin used to resolve relative links and the placeholder
//! avatar path that must not be reported as a real thumbnail.

use super::{ParsingError, ParsingResult};
use crate::domain::AbsoluteUrl;
use crate::infrastructure::config::funpay;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseContext {
    /// Base URL for resolving relative links
    pub base_url: Url,

    /// Avatar path the site serves for sellers without a picture
    pub placeholder_avatar_path: String,
}

impl ParseContext {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            placeholder_avatar_path: funpay::PLACEHOLDER_AVATAR_PATH.to_string(),
        }
    }

    /// Resolves an href (absolute or relative) into an [`AbsoluteUrl`]
    pub fn resolve(&self, href: &str) -> ParsingResult<AbsoluteUrl> {
        let href = href.trim();
        if href.is_empty() {
            return Err(ParsingError::UrlResolutionFailed {
                url: href.to_string(),
                reason: "empty href".to_string(),
            });
        }

        let joined = self
            .base_url
            .join(href)
            .map_err(|e| ParsingError::UrlResolutionFailed {
                url: href.to_string(),
                reason: e.to_string(),
            })?;

        Ok(AbsoluteUrl::from_url(joined)?)
    }

    /// `true` when the resolved url points at the placeholder avatar
    #[must_use]
    pub fn is_placeholder_avatar(&self, url: &AbsoluteUrl) -> bool {
        url.as_url().path() == self.placeholder_avatar_path
    }
}
