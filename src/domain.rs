//! Domain module - harvested records and their value objects
//!
//! Records are immutable once built; every constructor validates its
//! fields and reports a [`RecordError`] on bad input.

pub mod category;
pub mod offer;
pub mod value_objects;

pub use category::{Category, SubCategory};
pub use offer::{AUTO_DELIVERY_SENTINEL, Offer, OfferDraft, SellerPreview};
pub use value_objects::{AbsoluteUrl, Price, RatingStars, RecordError};
