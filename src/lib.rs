//! FunPay Harvester - category and offer scraping for funpay.com
//!
//! Reads the landing page category grid and subcategory offer listings,
//! pacing every request per domain and sharing seller records between
//! offers of the same page.

// Module declarations
pub mod domain;
pub mod application;
pub mod infrastructure;

pub use application::{FunPayHarvester, HarvestError};
pub use domain::{Category, Offer, SellerPreview, SubCategory};
