//! Infrastructure layer for HTTP access, HTML parsing, pacing and output
//!
//! Everything that touches the network, the filesystem or the process
//! environment lives here; the domain records stay free of it.

pub mod config;
pub mod csv_export;
pub mod headers;
pub mod http_client;
pub mod logging;
pub mod parsing;
pub mod parsing_error;
pub mod rate_limiter;

// Re-export commonly used types
pub use config::{AppConfig, ConfigError, Currency};
pub use csv_export::{CsvExporter, ExportError};
pub use http_client::{FetchError, HttpClient, PageFetcher, StaticPageFetcher};
pub use parsing::{CategoryListParser, HtmlParser, OfferListParser, OfferListReport, SellerParser};
pub use rate_limiter::{CooldownManager, CooldownPolicy};
