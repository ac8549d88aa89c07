//! Browser-like request headers for a harvesting session
//!
//! A profile is generated once per session: a user agent drawn from a small
//! browser/OS table, the matching `Accept` headers, and a fixed overlay of
//! fetch-metadata headers.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Chrome,
    Firefox,
    Opera,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

const BROWSERS: [Browser; 3] = [Browser::Chrome, Browser::Firefox, Browser::Opera];
const PLATFORMS: [Platform; 3] = [Platform::Windows, Platform::MacOs, Platform::Linux];

pub const ACCEPT_LANGUAGE: &str = "en-GB,en;q=0.5";
pub const REFERER: &str = "https://www.google.com/";

/// Headers applied on top of the generated profile, in this order
pub const STATIC_OVERLAY: [(&str, &str); 7] = [
    ("sec-gpc", "1"),
    ("connection", "keep-alive"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
    ("priority", "u=0, i"),
];

impl Platform {
    const fn os_token(self) -> &'static str {
        match self {
            Self::Windows => "Windows NT 10.0; Win64; x64",
            Self::MacOs => "Macintosh; Intel Mac OS X 10_15_7",
            Self::Linux => "X11; Linux x86_64",
        }
    }
}

impl Browser {
    fn user_agent(self, platform: Platform, major: u32) -> String {
        let os = platform.os_token();
        match self {
            Self::Chrome => format!(
                "Mozilla/5.0 ({os}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{major}.0.0.0 Safari/537.36"
            ),
            Self::Firefox => {
                format!("Mozilla/5.0 ({os}; rv:{major}.0) Gecko/20100101 Firefox/{major}.0")
            }
            Self::Opera => format!(
                "Mozilla/5.0 ({os}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{chrome}.0.0.0 Safari/537.36 OPR/{major}.0.0.0",
                chrome = major + 15
            ),
        }
    }

    const fn version_range(self) -> (u32, u32) {
        match self {
            Self::Chrome => (120, 131),
            Self::Firefox => (121, 133),
            Self::Opera => (105, 115),
        }
    }

    const fn accept(self) -> &'static str {
        match self {
            Self::Firefox => {
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
            }
            Self::Chrome | Self::Opera => {
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8"
            }
        }
    }
}

/// Session header bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderProfile {
    pub browser: Browser,
    pub platform: Platform,
    entries: Vec<(String, String)>,
}

impl HeaderProfile {
    /// Draws a random browser/OS pair and builds the full header list
    pub fn generate(rng: &mut fastrand::Rng) -> Self {
        let browser = BROWSERS[rng.usize(..BROWSERS.len())];
        let platform = PLATFORMS[rng.usize(..PLATFORMS.len())];
        let (low, high) = browser.version_range();
        Self::build(browser, platform, rng.u32(low..=high))
    }

    #[must_use]
    pub fn build(browser: Browser, platform: Platform, major: u32) -> Self {
        let mut profile = Self {
            browser,
            platform,
            entries: Vec::new(),
        };
        profile.set("user-agent", &browser.user_agent(platform, major));
        profile.set("accept", browser.accept());
        profile.set("accept-encoding", "gzip, deflate, br");
        profile.set("accept-language", ACCEPT_LANGUAGE);
        profile.set("referer", REFERER);
        profile.set("upgrade-insecure-requests", "1");
        for (name, value) in STATIC_OVERLAY {
            profile.set(name, value);
        }
        profile
    }

    /// Replaces the user agent, keeping every other header
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.set("user-agent", user_agent);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.get("user-agent").unwrap_or_default()
    }

    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Converts the profile into a reqwest header map
    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("Invalid header name: {name}"))?;
            let header_value = HeaderValue::from_str(value)
                .with_context(|| format!("Invalid value for header {name}"))?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }

    fn set(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name, value.to_string())),
        }
    }
}
