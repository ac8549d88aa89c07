//! Seller block parser
//!
//! Pure function of one seller fragment: identical markup always gives an
//! identical [`SellerPreview`].

use super::config::SellerSelectors;
use super::context::ParseContext;
use super::fields::{
    background_image_url, element_text, first_numeric_token, is_purely_numeric,
    last_class_suffix, optional_attr, required_attr, required_element, required_text,
    select_first,
};
use super::{HtmlParser, ParsingError, ParsingResult, compile_selector};
use crate::domain::{AbsoluteUrl, RatingStars, SellerPreview};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

pub struct SellerParser {
    context: ParseContext,
    avatar: Selector,
    profile_url_attribute: String,
    avatar_url_pattern: Regex,
    username: Selector,
    reviews: Selector,
    rating: Selector,
    reviews_counter: Selector,
    account_age: Selector,
}

impl SellerParser {
    pub fn new(context: ParseContext, selectors: &SellerSelectors) -> ParsingResult<Self> {
        let avatar_url_pattern =
            Regex::new(&selectors.avatar_url_pattern).map_err(|e| ParsingError::InvalidPattern {
                pattern: selectors.avatar_url_pattern.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            context,
            avatar: compile_selector(&selectors.avatar)?,
            profile_url_attribute: selectors.profile_url_attribute.clone(),
            avatar_url_pattern,
            username: compile_selector(&selectors.username)?,
            reviews: compile_selector(&selectors.reviews)?,
            rating: compile_selector(&selectors.rating)?,
            reviews_counter: compile_selector(&selectors.reviews_counter)?,
            account_age: compile_selector(&selectors.account_age)?,
        })
    }

    /// Profile url of a seller block, the dedup identity key
    pub fn profile_url(&self, block: ElementRef<'_>) -> ParsingResult<AbsoluteUrl> {
        let avatar = required_element(block, &self.avatar, "seller.avatar")?;
        let href = required_attr(avatar, &self.profile_url_attribute, "seller.url")?;
        self.context.resolve(href)
    }

    /// Parses a full seller block
    pub fn parse_block(&self, block: ElementRef<'_>) -> ParsingResult<SellerPreview> {
        let url = self.profile_url(block)?;
        self.parse_block_with_url(block, url)
    }

    /// Parses the remaining fields once the profile url is known
    pub fn parse_block_with_url(
        &self,
        block: ElementRef<'_>,
        url: AbsoluteUrl,
    ) -> ParsingResult<SellerPreview> {
        let username = required_text(block, &self.username, "seller.username")?;
        let account_age = required_text(block, &self.account_age, "seller.account_age")?;

        let seller = SellerPreview::new(url, &username, &account_age)?
            .with_thumb_avatar(self.thumb_avatar(block)?)
            .with_rating(self.rating(block)?)
            .with_reviews_count(self.reviews_count(block)?);

        Ok(seller)
    }

    fn thumb_avatar(&self, block: ElementRef<'_>) -> ParsingResult<Option<AbsoluteUrl>> {
        let style = select_first(block, &self.avatar)
            .and_then(|avatar| optional_attr(avatar, "style"));
        let Some(style) = style else {
            return Ok(None);
        };
        let Some(raw) = background_image_url(&style, &self.avatar_url_pattern) else {
            return Ok(None);
        };

        let thumb = self.context.resolve(raw)?;
        Ok((!self.context.is_placeholder_avatar(&thumb)).then_some(thumb))
    }

    fn rating(&self, block: ElementRef<'_>) -> ParsingResult<Option<RatingStars>> {
        let Some(indicator) = select_first(block, &self.rating) else {
            return Ok(None);
        };

        let suffix = last_class_suffix(indicator).unwrap_or_default();
        let stars: i64 = suffix
            .parse()
            .map_err(|e| ParsingError::field_parse_failed("seller.rating_stars", suffix, e))?;

        Ok(Some(RatingStars::new(stars)?))
    }

    /// Counter element when purely numeric, else the first numeric token of
    /// the reviews container text. Best effort: the fallback is a heuristic.
    fn reviews_count(&self, block: ElementRef<'_>) -> ParsingResult<Option<u32>> {
        let counter = select_first(block, &self.reviews_counter)
            .map(element_text)
            .filter(|text| is_purely_numeric(text));

        let raw = match counter {
            Some(text) => Some(text),
            None => select_first(block, &self.reviews)
                .map(element_text)
                .and_then(|text| first_numeric_token(&text).map(ToString::to_string)),
        };

        raw.map(|digits| {
            digits
                .parse::<u32>()
                .map_err(|e| ParsingError::field_parse_failed("seller.reviews_count", &digits, e))
        })
        .transpose()
    }
}

impl HtmlParser for SellerParser {
    type Output = SellerPreview;

    /// Parses a standalone seller fragment
    fn parse(&self, html: &str) -> ParsingResult<Self::Output> {
        let fragment = Html::parse_fragment(html);
        self.parse_block(fragment.root_element())
    }
}
