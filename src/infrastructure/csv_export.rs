//! Delimited text output for harvested records
//!
//! Offers are flattened into one row each, seller fields carrying a
//! `seller_` prefix. Categories produce one row per subcategory. The header
//! row comes from the row struct field names.

use crate::domain::{Category, Offer, SubCategory};
use crate::infrastructure::config::{ConfigError, ExportConfig};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::info;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export")]
    Empty,

    #[error("Invalid export settings: {0}")]
    Settings(#[from] ConfigError),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error while exporting: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
pub struct OfferCsvRow<'a> {
    pub url: &'a str,
    pub description: &'a str,
    pub price_value: String,
    pub price_currency: &'a str,
    pub auto_delivery: bool,
    pub platform: Option<&'a str>,
    pub server_id: Option<&'a str>,
    pub server_name: Option<&'a str>,
    pub feature_type1: Option<&'a str>,
    pub feature_type2: Option<&'a str>,
    pub seller_url: &'a str,
    pub seller_username: &'a str,
    pub seller_thumb_avatar_url: Option<&'a str>,
    pub seller_rating_stars: Option<u8>,
    pub seller_reviews_count: Option<u32>,
    pub seller_account_age: &'a str,
}

impl<'a> From<&'a Offer> for OfferCsvRow<'a> {
    fn from(offer: &'a Offer) -> Self {
        let seller = offer.seller();
        Self {
            url: offer.url().as_str(),
            description: offer.description(),
            price_value: offer.price_value().to_string(),
            price_currency: offer.price_currency(),
            auto_delivery: offer.auto_delivery(),
            platform: offer.platform(),
            server_id: offer.server_id(),
            server_name: offer.server_name(),
            feature_type1: offer.feature_type1(),
            feature_type2: offer.feature_type2(),
            seller_url: seller.url().as_str(),
            seller_username: seller.username(),
            seller_thumb_avatar_url: seller.thumb_avatar_url().map(|u| u.as_str()),
            seller_rating_stars: seller.rating_stars().map(u8::from),
            seller_reviews_count: seller.reviews_count(),
            seller_account_age: seller.account_age(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryCsvRow<'a> {
    pub category_id: u64,
    pub category_title: &'a str,
    pub category_url: &'a str,
    pub subcategory_title: Option<&'a str>,
    pub subcategory_url: Option<&'a str>,
}

/// Rows for one category; a category without subcategories still gets one
#[must_use]
pub fn category_rows(category: &Category) -> Vec<CategoryCsvRow<'_>> {
    if category.subcategories().is_empty() {
        return vec![category_row(category, None)];
    }

    category
        .subcategories()
        .iter()
        .map(|sub| category_row(category, Some(sub)))
        .collect()
}

fn category_row<'a>(category: &'a Category, sub: Option<&'a SubCategory>) -> CategoryCsvRow<'a> {
    CategoryCsvRow {
        category_id: category.id(),
        category_title: category.title(),
        category_url: category.url().as_str(),
        subcategory_title: sub.map(SubCategory::title),
        subcategory_url: sub.map(|s| s.url().as_str()),
    }
}

/// Writes record rows as delimited text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvExporter {
    delimiter: u8,
    include_header: bool,
    write_bom: bool,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            delimiter: b',',
            include_header: true,
            write_bom: true,
        }
    }
}

impl CsvExporter {
    pub fn from_config(config: &ExportConfig) -> Result<Self, ExportError> {
        Ok(Self {
            delimiter: config.delimiter_byte()?,
            include_header: config.include_header,
            write_bom: config.write_bom,
        })
    }

    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub const fn with_header(mut self, include_header: bool) -> Self {
        self.include_header = include_header;
        self
    }

    #[must_use]
    pub const fn with_bom(mut self, write_bom: bool) -> Self {
        self.write_bom = write_bom;
        self
    }

    /// Offers as a string without byte order mark; `""` for no offers
    pub fn offers_to_string(&self, offers: &[Offer]) -> Result<String, ExportError> {
        if offers.is_empty() {
            return Ok(String::new());
        }
        let mut buffer = Vec::new();
        self.write_rows(&mut buffer, offers.iter().map(OfferCsvRow::from))?;
        String::from_utf8(buffer).map_err(|e| ExportError::Io(std::io::Error::other(e)))
    }

    /// Writes offers to `path`, returning the number of rows written
    pub fn save_offers(&self, offers: &[Offer], path: &Path) -> Result<usize, ExportError> {
        if offers.is_empty() {
            return Err(ExportError::Empty);
        }
        self.save(path, offers.iter().map(OfferCsvRow::from))
    }

    /// Writes categories (one row per subcategory) to `path`
    pub fn save_categories(
        &self,
        categories: &[Category],
        path: &Path,
    ) -> Result<usize, ExportError> {
        if categories.is_empty() {
            return Err(ExportError::Empty);
        }
        self.save(path, categories.iter().flat_map(category_rows))
    }

    fn save<T: Serialize>(
        &self,
        path: &Path,
        rows: impl IntoIterator<Item = T>,
    ) -> Result<usize, ExportError> {
        let mut file = BufWriter::new(File::create(path)?);
        if self.write_bom {
            file.write_all(UTF8_BOM)?;
        }
        let written = self.write_rows(&mut file, rows)?;
        file.flush()?;
        info!("Exported {} rows to {}", written, path.display());
        Ok(written)
    }

    /// Serializes rows into `writer`, returning the row count
    pub fn write_rows<T: Serialize, W: Write>(
        &self,
        writer: W,
        rows: impl IntoIterator<Item = T>,
    ) -> Result<usize, ExportError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.include_header)
            .from_writer(writer);

        let mut count = 0;
        for row in rows {
            csv_writer.serialize(row)?;
            count += 1;
        }
        csv_writer.flush()?;
        Ok(count)
    }
}
