//! Offer listing parser
//!
//! A listing page carries every offer of a subcategory in one response,
//! including rows the site hides visually. Each row is extracted on its own:
//! a row that fails is logged and skipped, the rest of the page still comes
//! back. Sellers are parsed once per call and shared between their offers.

use super::config::OfferSelectors;
use super::context::ParseContext;
use super::fields::{
    element_text, first_text_node, optional_attr, optional_text, required_attr, required_element,
    required_text,
};
use super::seller_parser::SellerParser;
use super::{HtmlParser, ParsingError, ParsingResult, compile_selector, compile_selectors};
use crate::domain::{Offer, OfferDraft, Price, SellerPreview};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

const ATTR_URL: &str = "href";
const ATTR_PLATFORM: &str = "data-f-platform";
const ATTR_SERVER: &str = "data-server";
const ATTR_AUTO_DELIVERY: &str = "data-auto";
const ATTR_FEATURE_TYPE1: &str = "data-f-type";
const ATTR_FEATURE_TYPE2: &str = "data-f-type2";

/// One row that could not be turned into an offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedOffer {
    /// Position of the row among all matched rows
    pub index: usize,
    pub reason: ParsingError,
}

/// Outcome of one extraction call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferListReport {
    /// Offers in document order
    pub offers: Vec<Offer>,
    pub skipped: Vec<SkippedOffer>,
    /// Distinct seller blocks actually parsed
    pub sellers_parsed: usize,
}

impl OfferListReport {
    #[must_use]
    pub fn rows_seen(&self) -> usize {
        self.offers.len() + self.skipped.len()
    }
}

/// Seller records seen during one call, keyed by profile url
type SellerCache = HashMap<String, Arc<SellerPreview>>;

pub struct OfferListParser {
    context: ParseContext,
    row_selectors: Vec<Selector>,
    server_name: Selector,
    description: Selector,
    price_block: Selector,
    price_currency: Selector,
    user_block: Selector,
    seller_parser: SellerParser,
}

impl OfferListParser {
    pub fn new(
        context: ParseContext,
        selectors: &OfferSelectors,
        seller_parser: SellerParser,
    ) -> ParsingResult<Self> {
        Ok(Self {
            context,
            row_selectors: compile_selectors(&selectors.row)?,
            server_name: compile_selector(&selectors.server_name)?,
            description: compile_selector(&selectors.description)?,
            price_block: compile_selector(&selectors.price_block)?,
            price_currency: compile_selector(&selectors.price_currency)?,
            user_block: compile_selector(&selectors.user_block)?,
            seller_parser,
        })
    }

    /// Extracts every offer row, recording the rows that were skipped
    #[must_use]
    pub fn parse_report(&self, html: &str) -> OfferListReport {
        let document = Html::parse_document(html);
        let rows = self.select_rows(&document);

        let mut report = OfferListReport::default();
        let mut sellers = SellerCache::new();

        for (index, row) in rows.into_iter().enumerate() {
            match self.extract_offer(row, &mut sellers, &mut report.sellers_parsed) {
                Ok(offer) => report.offers.push(offer),
                Err(reason) => {
                    warn!(index, error = %reason, "Skipping offer row");
                    report.skipped.push(SkippedOffer { index, reason });
                }
            }
        }

        debug!(
            offers = report.offers.len(),
            skipped = report.skipped.len(),
            sellers = report.sellers_parsed,
            "Offer listing parsed"
        );
        report
    }

    /// Rows from the first selector that matches anything
    fn select_rows<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        for (i, selector) in self.row_selectors.iter().enumerate() {
            let rows: Vec<ElementRef<'a>> = document.select(selector).collect();
            if !rows.is_empty() {
                debug!("Found {} offer rows using row selector {}", rows.len(), i);
                return rows;
            }
        }
        debug!("No offer rows found");
        Vec::new()
    }

    fn extract_offer(
        &self,
        row: ElementRef<'_>,
        sellers: &mut SellerCache,
        sellers_parsed: &mut usize,
    ) -> ParsingResult<Offer> {
        let url = self.context.resolve(required_attr(row, ATTR_URL, "offer.url")?)?;

        let server_id = optional_attr(row, ATTR_SERVER);
        let server_name = if server_id.is_some() {
            optional_text(row, &self.server_name)
        } else {
            None
        };

        let description = required_text(row, &self.description, "offer.description")?;
        let price = self.extract_price(row)?;

        let user_block = required_element(row, &self.user_block, "offer.seller")?;
        let seller = self.resolve_seller(user_block, sellers, sellers_parsed)?;

        let draft = OfferDraft {
            url: Some(url),
            description,
            price: Some(price),
            auto_delivery: Offer::auto_delivery_from_attr(row.value().attr(ATTR_AUTO_DELIVERY)),
            platform: optional_attr(row, ATTR_PLATFORM),
            server_id,
            server_name,
            feature_type1: optional_attr(row, ATTR_FEATURE_TYPE1),
            feature_type2: optional_attr(row, ATTR_FEATURE_TYPE2),
        };

        Ok(draft.build(seller)?)
    }

    /// Amount is the first text node of the price block, currency its nested label.
    /// A rejected price skips the row before its seller is parsed.
    fn extract_price(&self, row: ElementRef<'_>) -> ParsingResult<Price> {
        let block = required_element(row, &self.price_block, "offer.price")?;
        let amount = first_text_node(block).ok_or_else(|| {
            ParsingError::required_field_missing("offer.price_value", Some("price block"))
        })?;
        let currency = required_element(block, &self.price_currency, "offer.price_currency")?;
        Ok(Price::parse(&amount, &element_text(currency))?)
    }

    fn resolve_seller(
        &self,
        block: ElementRef<'_>,
        sellers: &mut SellerCache,
        sellers_parsed: &mut usize,
    ) -> ParsingResult<Arc<SellerPreview>> {
        let url = self.seller_parser.profile_url(block)?;
        if let Some(seller) = sellers.get(url.as_str()) {
            return Ok(Arc::clone(seller));
        }

        let key = url.as_str().to_string();
        let seller = Arc::new(self.seller_parser.parse_block_with_url(block, url)?);
        *sellers_parsed += 1;
        sellers.insert(key, Arc::clone(&seller));
        Ok(seller)
    }
}

impl HtmlParser for OfferListParser {
    type Output = Vec<Offer>;

    /// Never fails for a page: rows that cannot be read are skipped
    fn parse(&self, html: &str) -> ParsingResult<Self::Output> {
        Ok(self.parse_report(html).offers)
    }
}
