//! Category records harvested from the landing page.

use super::value_objects::AbsoluteUrl;
use serde::{Deserialize, Serialize};

/// Leaf navigation entry owned by one [`Category`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    title: String,
    url: AbsoluteUrl,
}

impl SubCategory {
    /// Title is trimmed and may end up empty, e.g. for icon-only links
    #[must_use]
    pub fn new(title: &str, url: AbsoluteUrl) -> Self {
        Self {
            title: title.trim().to_string(),
            url,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub const fn url(&self) -> &AbsoluteUrl {
        &self.url
    }
}

/// Game/category card with its ordered subcategories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    title: String,
    id: u64,
    url: AbsoluteUrl,
    subcategories: Vec<SubCategory>,
}

impl Category {
    #[must_use]
    pub fn new(title: &str, id: u64, url: AbsoluteUrl, subcategories: Vec<SubCategory>) -> Self {
        Self {
            title: title.trim().to_string(),
            id,
            url,
            subcategories,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub const fn url(&self) -> &AbsoluteUrl {
        &self.url
    }

    #[must_use]
    pub fn subcategories(&self) -> &[SubCategory] {
        &self.subcategories
    }
}
