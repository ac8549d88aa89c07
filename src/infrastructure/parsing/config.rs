//! Parsing configuration for HTML extraction
//!
//! Centralized CSS selectors for the landing page, the offer listing and the
//! seller block. Container selectors are ordered fallbacks: the first one
//! that matches anything wins.

use serde::{Deserialize, Serialize};

/// Main selector configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingSelectors {
    pub category: CategorySelectors,
    pub offer: OfferSelectors,
    pub seller: SellerSelectors,
}

/// Landing page category cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorySelectors {
    /// Category card containers - multiple fallbacks
    pub card: Vec<String>,

    /// Heading carrying the numeric id attribute
    pub title: String,

    /// Link inside the heading (title text + href)
    pub title_link: String,

    /// Subcategory links inside a card
    pub subcategory_link: String,

    /// Attribute on the heading holding the category id
    pub id_attribute: String,
}

impl Default for CategorySelectors {
    fn default() -> Self {
        Self {
            card: vec![
                ".promo-games-all .promo-game-list .row.row-10.flex div.col-md-3.col-xs-6 .promo-game-item"
                    .to_string(),
                ".promo-game-list .promo-game-item".to_string(),
            ],
            title: ".game-title".to_string(),
            title_link: "a".to_string(),
            subcategory_link: "ul li a".to_string(),
            id_attribute: "data-id".to_string(),
        }
    }
}

/// Offer rows of a subcategory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferSelectors {
    /// Offer row containers - multiple fallbacks
    pub row: Vec<String>,

    pub server_name: String,
    pub description: String,

    /// Element whose first text node is the amount
    pub price_block: String,

    /// Currency label nested in the price block
    pub price_currency: String,

    /// Seller block handed to the seller parser
    pub user_block: String,
}

impl Default for OfferSelectors {
    fn default() -> Self {
        Self {
            row: vec![
                ".cd-forward .content-with-cd-wide.showcase .tc.table-hover.table-clickable.tc-short.showcase-table.tc-lazyload.tc-sortable .tc-item"
                    .to_string(),
                ".showcase-table .tc-item".to_string(),
            ],
            server_name: ".tc-server.hidden-xs".to_string(),
            description: ".tc-desc .tc-desc-text".to_string(),
            price_block: ".tc-price div".to_string(),
            price_currency: "span".to_string(),
            user_block: ".tc-user > div".to_string(),
        }
    }
}

/// Seller block inside an offer row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SellerSelectors {
    /// Avatar container holding the profile url and the inline style
    pub avatar: String,
    pub profile_url_attribute: String,

    /// Regex with one capture group for the `background-image` url
    pub avatar_url_pattern: String,

    pub username: String,
    pub reviews: String,
    pub rating: String,
    pub reviews_counter: String,
    pub account_age: String,
}

impl Default for SellerSelectors {
    fn default() -> Self {
        Self {
            avatar: ".media-left .avatar-photo".to_string(),
            profile_url_attribute: "data-href".to_string(),
            avatar_url_pattern: r"url\((.*?)\)".to_string(),
            username: ".media-body .media-user-name".to_string(),
            reviews: ".media-body .media-user-reviews".to_string(),
            rating: ".media-body .media-user-reviews div".to_string(),
            reviews_counter: ".media-body .media-user-reviews .rating-mini-count".to_string(),
            account_age: ".media-body .media-user-info".to_string(),
        }
    }
}
