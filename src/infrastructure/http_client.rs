//! HTTP fetch collaborator
//!
//! [`PageFetcher`] is the seam between the harvester and the network: given a
//! path relative to a fixed origin it returns the page body. [`HttpClient`]
//! does this over reqwest with a session header profile, the currency cookie
//! and a governor quota as a hard ceiling on request rate. Non-success status
//! codes are returned as ordinary bodies.

use crate::infrastructure::config::{Currency, HttpClientConfig, funpay};
use crate::infrastructure::headers::HeaderProfile;
use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::Client;
use reqwest::cookie::Jar;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Cannot build request URL from '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("No page stored for path '{0}'")]
    NotFound(String),

    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

/// Returns the body text for a path relative to the fetcher's origin
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Origin every path is resolved against
    fn base_url(&self) -> &Url;

    async fn fetch(&self, path: &str) -> Result<String, FetchError>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    fn base_url(&self) -> &Url {
        (**self).base_url()
    }

    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        (**self).fetch(path).await
    }
}

/// Resolves a request path (absolute path, bare path or empty) against `base`
pub fn join_path(base: &Url, path: &str) -> Result<Url, FetchError> {
    base.join(path).map_err(|e| FetchError::InvalidPath {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// reqwest backed fetcher for one origin
pub struct HttpClient {
    client: Client,
    base_url: Url,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    profile: HeaderProfile,
}

impl HttpClient {
    /// Builds a client with a fresh random header profile
    pub fn new(
        base_url: Url,
        currency: Currency,
        config: &HttpClientConfig,
    ) -> Result<Self, FetchError> {
        let mut profile = HeaderProfile::generate(&mut fastrand::Rng::new());
        if let Some(user_agent) = &config.user_agent_override {
            profile = profile.with_user_agent(user_agent);
        }
        Self::with_profile(base_url, currency, config, profile)
    }

    pub fn with_profile(
        base_url: Url,
        currency: Currency,
        config: &HttpClientConfig,
        profile: HeaderProfile,
    ) -> Result<Self, FetchError> {
        let headers = profile
            .to_header_map()
            .map_err(|e| FetchError::Setup(format!("{e:#}")))?;

        let jar = Arc::new(Jar::default());
        jar.add_cookie_str(
            &format!("{}={}", funpay::CURRENCY_COOKIE, currency.cookie_value()),
            &base_url,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .cookie_provider(jar)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .map_err(|e| FetchError::Setup(format!("Failed to create HTTP client: {e}")))?;

        let per_second = NonZeroU32::new(config.max_requests_per_second)
            .ok_or_else(|| FetchError::Setup("Rate limit must be greater than 0".to_string()))?;
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        tracing::debug!(
            user_agent = profile.user_agent(),
            currency = currency.cookie_value(),
            "HTTP session prepared"
        );

        Ok(Self {
            client,
            base_url,
            rate_limiter,
            profile,
        })
    }

    #[must_use]
    pub const fn profile(&self) -> &HeaderProfile {
        &self.profile
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let url = join_path(&self.base_url, path)?;
        self.rate_limiter.until_ready().await;

        tracing::info!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Non-success status {} for {}", status, url);
        }

        let body = response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;

        tracing::debug!("Fetched {} ({}, {} bytes)", url, status, body.len());
        Ok(body)
    }
}

/// In-memory fetcher serving stored pages by path
///
/// Paths are normalised through the base URL, so `""` and `"/"` address the
/// same page. Every request is recorded.
pub struct StaticPageFetcher {
    base_url: Url,
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl StaticPageFetcher {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            pages: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Stores `body` under `path`
    pub fn with_page(mut self, path: &str, body: impl Into<String>) -> Result<Self, FetchError> {
        let key = join_path(&self.base_url, path)?.to_string();
        self.pages.insert(key, body.into());
        Ok(self)
    }

    /// Paths requested so far, in order
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PageFetcher for StaticPageFetcher {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());

        let key = join_path(&self.base_url, path)?.to_string();
        self.pages
            .get(&key)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(path.to_string()))
    }
}
