//! Offer and seller records harvested from a subcategory listing page.

use super::value_objects::{AbsoluteUrl, Price, RatingStars, RecordError, non_empty};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Attribute value that marks an offer as delivered automatically
pub const AUTO_DELIVERY_SENTINEL: &str = "1";

/// Seller summary shown next to each offer.
///
/// The profile url is the identity key: offers of one listing page that
/// point at the same profile share a single `Arc<SellerPreview>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerPreview {
    url: AbsoluteUrl,
    username: String,
    thumb_avatar_url: Option<AbsoluteUrl>,
    rating_stars: Option<RatingStars>,
    reviews_count: Option<u32>,
    account_age: String,
}

impl SellerPreview {
    /// # Errors
    /// Returns error if the username is blank
    pub fn new(url: AbsoluteUrl, username: &str, account_age: &str) -> Result<Self, RecordError> {
        Ok(Self {
            url,
            username: non_empty("seller.username", username)?,
            thumb_avatar_url: None,
            rating_stars: None,
            reviews_count: None,
            account_age: account_age.trim().to_string(),
        })
    }

    #[must_use]
    pub fn with_thumb_avatar(mut self, thumb: Option<AbsoluteUrl>) -> Self {
        self.thumb_avatar_url = thumb;
        self
    }

    #[must_use]
    pub const fn with_rating(mut self, rating: Option<RatingStars>) -> Self {
        self.rating_stars = rating;
        self
    }

    #[must_use]
    pub const fn with_reviews_count(mut self, count: Option<u32>) -> Self {
        self.reviews_count = count;
        self
    }

    #[must_use]
    pub const fn url(&self) -> &AbsoluteUrl {
        &self.url
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub const fn thumb_avatar_url(&self) -> Option<&AbsoluteUrl> {
        self.thumb_avatar_url.as_ref()
    }

    #[must_use]
    pub const fn rating_stars(&self) -> Option<RatingStars> {
        self.rating_stars
    }

    #[must_use]
    pub const fn reviews_count(&self) -> Option<u32> {
        self.reviews_count
    }

    #[must_use]
    pub fn account_age(&self) -> &str {
        &self.account_age
    }
}

/// Field values collected from one offer block before validation
#[derive(Debug, Clone, Default)]
pub struct OfferDraft {
    pub url: Option<AbsoluteUrl>,
    pub description: String,
    pub price: Option<Price>,
    pub auto_delivery: bool,
    pub platform: Option<String>,
    pub server_id: Option<String>,
    pub server_name: Option<String>,
    pub feature_type1: Option<String>,
    pub feature_type2: Option<String>,
}

impl OfferDraft {
    /// Validates the collected fields and attaches the seller
    ///
    /// # Errors
    /// Returns error if the url or price is missing, or a server name is
    /// present without a server id
    pub fn build(self, seller: Arc<SellerPreview>) -> Result<Offer, RecordError> {
        let url = self.url.ok_or(RecordError::EmptyField("offer.url"))?;
        let price = self.price.ok_or(RecordError::EmptyField("offer.price"))?;

        if self.server_id.is_none() {
            if let Some(name) = self.server_name {
                return Err(RecordError::ServerNameWithoutId(name));
            }
        }

        Ok(Offer {
            url,
            description: self.description.trim().to_string(),
            seller,
            price,
            auto_delivery: self.auto_delivery,
            platform: self.platform,
            server_id: self.server_id,
            server_name: self.server_name,
            feature_type1: self.feature_type1,
            feature_type2: self.feature_type2,
        })
    }
}

/// One marketplace offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    url: AbsoluteUrl,
    description: String,
    seller: Arc<SellerPreview>,
    #[serde(flatten)]
    price: Price,
    auto_delivery: bool,
    platform: Option<String>,
    server_id: Option<String>,
    server_name: Option<String>,
    feature_type1: Option<String>,
    feature_type2: Option<String>,
}

impl Offer {
    /// `true` only for the exact sentinel value, anything else (or absence) is `false`
    #[must_use]
    pub fn auto_delivery_from_attr(value: Option<&str>) -> bool {
        value == Some(AUTO_DELIVERY_SENTINEL)
    }

    #[must_use]
    pub const fn url(&self) -> &AbsoluteUrl {
        &self.url
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn seller(&self) -> &Arc<SellerPreview> {
        &self.seller
    }

    #[must_use]
    pub const fn price_value(&self) -> Decimal {
        self.price.value()
    }

    #[must_use]
    pub fn price_currency(&self) -> &str {
        self.price.currency()
    }

    #[must_use]
    pub const fn auto_delivery(&self) -> bool {
        self.auto_delivery
    }

    #[must_use]
    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    #[must_use]
    pub fn server_id(&self) -> Option<&str> {
        self.server_id.as_deref()
    }

    #[must_use]
    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    #[must_use]
    pub fn feature_type1(&self) -> Option<&str> {
        self.feature_type1.as_deref()
    }

    #[must_use]
    pub fn feature_type2(&self) -> Option<&str> {
        self.feature_type2.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn seller() -> Arc<SellerPreview> {
        let url = AbsoluteUrl::parse("https://funpay.com/users/42/").unwrap();
        Arc::new(SellerPreview::new(url, "trader", "3 years on site").unwrap())
    }

    fn draft() -> OfferDraft {
        OfferDraft {
            url: Some(AbsoluteUrl::parse("https://funpay.com/lots/offer?id=1").unwrap()),
            description: " Gold, fast ".to_string(),
            price: Some(Price::parse("12.34", "$").unwrap()),
            ..OfferDraft::default()
        }
    }

    #[rstest]
    #[case(Some("1"), true)]
    #[case(Some("0"), false)]
    #[case(Some(""), false)]
    #[case(Some("true"), false)]
    #[case(None, false)]
    fn auto_delivery_sentinel(#[case] attr: Option<&str>, #[case] expected: bool) {
        assert_eq!(Offer::auto_delivery_from_attr(attr), expected);
    }

    #[test]
    fn draft_builds_offer() {
        let offer = draft().build(seller()).unwrap();
        assert_eq!(offer.price_value(), Decimal::new(1234, 2));
        assert_eq!(offer.price_currency(), "$");
        assert_eq!(offer.description(), "Gold, fast");
        assert_eq!(offer.seller().username(), "trader");
    }

    #[test]
    fn server_name_requires_server_id() {
        let mut bad = draft();
        bad.server_name = Some("EU West".to_string());
        assert_eq!(
            bad.build(seller()),
            Err(RecordError::ServerNameWithoutId("EU West".to_string()))
        );

        let mut good = draft();
        good.server_id = Some("7".to_string());
        good.server_name = Some("EU West".to_string());
        let offer = good.build(seller()).unwrap();
        assert_eq!(offer.server_name(), Some("EU West"));
    }

    #[test]
    fn missing_price_is_rejected() {
        let mut bad = draft();
        bad.price = None;
        assert_eq!(bad.build(seller()), Err(RecordError::EmptyField("offer.price")));
    }

    #[test]
    fn missing_url_is_rejected() {
        let mut bad = draft();
        bad.url = None;
        assert_eq!(bad.build(seller()), Err(RecordError::EmptyField("offer.url")));
    }

    #[test]
    fn offer_serializes_flat_price() {
        let offer = draft().build(seller()).unwrap();
        let json = serde_json::to_value(&offer).unwrap();
        assert_eq!(json["priceValue"], "12.34");
        assert_eq!(json["priceCurrency"], "$");
        assert_eq!(json["autoDelivery"], false);
        assert_eq!(json["seller"]["username"], "trader");
    }
}
