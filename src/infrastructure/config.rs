//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults (see [`defaults`])
//! 2. Optional config file (TOML/JSON/YAML, picked by extension)
//! 3. Environment overlay, `FUNPAY__<SECTION>__<KEY>`

use crate::infrastructure::parsing::config::ParsingSelectors;
use crate::infrastructure::rate_limiter::CooldownPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

impl ConfigError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Site constants
pub mod funpay {
    /// Origin every request path is resolved against
    pub const BASE_URL: &str = "https://funpay.com";

    /// Host name used as the pacing key
    pub const DOMAIN: &str = "funpay.com";

    /// Landing page path tried first for categories
    pub const PRIMARY_LANDING_PATH: &str = "";

    /// Alternate landing page, used once when the primary yields nothing
    pub const ALTERNATE_LANDING_PATH: &str = "/en/";

    /// Avatar shown for sellers without a picture
    pub const PLACEHOLDER_AVATAR_PATH: &str = "/img/layout/avatar.png";

    /// Cookie that selects the display currency
    pub const CURRENCY_COOKIE: &str = "cy";
}

pub mod defaults {
    /// Lower bound of the random gap between requests to one domain
    pub const RANDOM_INTERVAL_MIN_SECS: f64 = 5.0;

    /// Upper bound of the random gap between requests to one domain
    pub const RANDOM_INTERVAL_MAX_SECS: f64 = 15.0;

    /// Inactivity after which a domain's pacing entry is dropped
    pub const CACHE_TTL_SECS: f64 = 30.0;

    /// Pause before retrying the alternate landing page
    pub const FALLBACK_PAUSE_MIN_MS: u64 = 200;
    pub const FALLBACK_PAUSE_MAX_MS: u64 = 1000;

    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Transport-level ceiling, far above the cooldown cadence
    pub const MAX_REQUESTS_PER_SECOND: u32 = 2;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_FILE_NAME: &str = "funpay-harvester.log";

    pub const OUTPUT_PATH: &str = "offers.csv";
    pub const CSV_DELIMITER: &str = ",";

    pub const CONFIG_DIR_NAME: &str = "funpay-harvester";
    pub const CONFIG_FILE_NAME: &str = "config.toml";
    pub const ENV_PREFIX: &str = "FUNPAY";
}

/// Display currency selected through the site cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Rub,
}

impl Currency {
    #[must_use]
    pub const fn cookie_value(self) -> &'static str {
        match self {
            Self::Usd => "usd",
            Self::Eur => "eur",
            Self::Rub => "rub",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cookie_value())
    }
}

impl FromStr for Currency {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "usd" => Ok(Self::Usd),
            "eur" => Ok(Self::Eur),
            "rub" => Ok(Self::Rub),
            other => Err(ConfigError::validation(format!(
                "unsupported currency '{other}', expected usd, eur or rub"
            ))),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub http: HttpClientConfig,
    pub logging: LoggingConfig,
    pub export: ExportConfig,
}

/// Harvesting behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub base_url: String,
    pub currency: Currency,

    /// Fixed gap between requests; random within the interval when unset
    pub min_interval_secs: Option<f64>,
    pub random_interval_min_secs: f64,
    pub random_interval_max_secs: f64,
    pub cache_ttl_secs: f64,

    pub fallback_pause_min_ms: u64,
    pub fallback_pause_max_ms: u64,

    pub selectors: ParsingSelectors,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: funpay::BASE_URL.to_string(),
            currency: Currency::default(),
            min_interval_secs: None,
            random_interval_min_secs: defaults::RANDOM_INTERVAL_MIN_SECS,
            random_interval_max_secs: defaults::RANDOM_INTERVAL_MAX_SECS,
            cache_ttl_secs: defaults::CACHE_TTL_SECS,
            fallback_pause_min_ms: defaults::FALLBACK_PAUSE_MIN_MS,
            fallback_pause_max_ms: defaults::FALLBACK_PAUSE_MAX_MS,
            selectors: ParsingSelectors::default(),
        }
    }
}

impl ScraperConfig {
    /// Parsed base origin
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url).map_err(|e| {
            ConfigError::validation(format!("base_url '{}' is invalid: {e}", self.base_url))
        })
    }

    /// Pacing policy; call after [`AppConfig::validate`]
    #[must_use]
    pub fn cooldown_policy(&self) -> CooldownPolicy {
        CooldownPolicy {
            min_interval: self.min_interval_secs.map(secs),
            random_interval: (
                secs(self.random_interval_min_secs),
                secs(self.random_interval_max_secs),
            ),
            cache_ttl: secs(self.cache_ttl_secs),
        }
    }

    #[must_use]
    pub const fn fallback_pause(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.fallback_pause_min_ms),
            Duration::from_millis(self.fallback_pause_max_ms),
        )
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    /// Fixed user agent instead of a generated one
    pub user_agent_override: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            user_agent_override: None,
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    pub console_output: bool,
    pub file_output: bool,

    /// Directory for the log file; the platform data dir when unset
    pub log_dir: Option<PathBuf>,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
            file_name: defaults::LOG_FILE_NAME.to_string(),
        }
    }
}

/// Delimited output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_path: PathBuf,
    /// Single ASCII character
    pub delimiter: String,
    pub include_header: bool,
    /// Prefix files with a UTF-8 byte order mark for spreadsheet tools
    pub write_bom: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(defaults::OUTPUT_PATH),
            delimiter: defaults::CSV_DELIMITER.to_string(),
            include_header: true,
            write_bom: true,
        }
    }
}

impl ExportConfig {
    /// Delimiter as the byte the csv writer expects
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        match self.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(ConfigError::validation(format!(
                "delimiter '{}' must be a single ASCII character",
                self.delimiter
            ))),
        }
    }
}

impl AppConfig {
    /// Loads defaults, then `path` (or the per-user config file if present), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?);

        match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                builder = builder.add_source(config::File::from(path));
            }
            None => {
                if let Some(default_path) = Self::default_config_path().filter(|p| p.exists()) {
                    info!("Loading configuration from {}", default_path.display());
                    builder = builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/funpay-harvester/config.toml`
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(defaults::CONFIG_DIR_NAME)
                .join(defaults::CONFIG_FILE_NAME)
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let scraper = &self.scraper;

        let base = scraper.base_url()?;
        if base.host_str().is_none() {
            return Err(ConfigError::validation("base_url must include a host"));
        }

        if let Some(interval) = scraper.min_interval_secs {
            if !(interval.is_finite() && interval >= 0.0) {
                return Err(ConfigError::validation(
                    "min_interval_secs must be a non-negative number",
                ));
            }
        }

        let (low, high) = (scraper.random_interval_min_secs, scraper.random_interval_max_secs);
        if !(low.is_finite() && high.is_finite() && low >= 0.0) || low > high {
            return Err(ConfigError::validation(format!(
                "random interval [{low}, {high}] must be non-negative and ordered"
            )));
        }

        if !(scraper.cache_ttl_secs.is_finite() && scraper.cache_ttl_secs > 0.0) {
            return Err(ConfigError::validation("cache_ttl_secs must be greater than 0"));
        }

        if scraper.fallback_pause_min_ms > scraper.fallback_pause_max_ms {
            return Err(ConfigError::validation(
                "fallback_pause_min_ms cannot be greater than fallback_pause_max_ms",
            ));
        }

        if self.http.max_requests_per_second == 0 {
            return Err(ConfigError::validation(
                "max_requests_per_second must be greater than 0",
            ));
        }

        if self.http.timeout_seconds == 0 {
            return Err(ConfigError::validation("timeout_seconds must be greater than 0"));
        }

        self.export.delimiter_byte()?;

        Ok(())
    }
}
