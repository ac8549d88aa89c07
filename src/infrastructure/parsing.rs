//! HTML extraction pipeline
//!
//! Two stages per page: a selector query picks the recurring blocks
//! (category cards, offer rows), then named-field helpers in [`fields`]
//! read each value from a block. Selectors are compiled once when a parser
//! is built.

pub mod category_parser;
pub mod config;
pub mod context;
pub mod error;
pub mod fields;
pub mod offer_list_parser;
pub mod seller_parser;

// Re-export public types
pub use category_parser::CategoryListParser;
pub use config::ParsingSelectors;
pub use context::ParseContext;
pub use error::{ParsingError, ParsingResult};
pub use offer_list_parser::{OfferListParser, OfferListReport, SkippedOffer};
pub use seller_parser::SellerParser;

use scraper::Selector;
use tracing::{debug, warn};

/// Document-level parser
pub trait HtmlParser {
    type Output;

    fn parse(&self, html: &str) -> ParsingResult<Self::Output>;
}

/// Compiles one selector, failing on invalid CSS
pub fn compile_selector(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, e))
}

/// Compiles an ordered fallback list, skipping entries that fail.
/// Errors only when nothing compiles.
pub fn compile_selectors(selectors: &[String]) -> ParsingResult<Vec<Selector>> {
    let mut compiled = Vec::with_capacity(selectors.len());
    let mut errors = Vec::new();

    for selector in selectors {
        match compile_selector(selector) {
            Ok(parsed) => compiled.push(parsed),
            Err(e) => {
                warn!("Failed to compile selector '{}': {}", selector, e);
                errors.push(e.to_string());
            }
        }
    }

    if compiled.is_empty() {
        return Err(ParsingError::invalid_selector(
            &selectors.join(" | "),
            if errors.is_empty() {
                "no selectors configured".to_string()
            } else {
                errors.join(", ")
            },
        ));
    }

    if !errors.is_empty() {
        debug!("Some selectors failed to compile: {}", errors.join(", "));
    }

    Ok(compiled)
}
