//! Landing page category parser
//!
//! Cards are read in document order. A card that is found but cannot give
//! its id or url fails the whole call; a page without any card gives an
//! empty list so the caller can try the alternate landing page.

use super::config::CategorySelectors;
use super::context::ParseContext;
use super::fields::{element_text, required_attr, required_element};
use super::{HtmlParser, ParsingError, ParsingResult, compile_selector, compile_selectors};
use crate::domain::{Category, SubCategory};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

pub struct CategoryListParser {
    context: ParseContext,
    card_selectors: Vec<Selector>,
    title: Selector,
    title_link: Selector,
    subcategory_link: Selector,
    id_attribute: String,
}

impl CategoryListParser {
    pub fn new(context: ParseContext, selectors: &CategorySelectors) -> ParsingResult<Self> {
        Ok(Self {
            context,
            card_selectors: compile_selectors(&selectors.card)?,
            title: compile_selector(&selectors.title)?,
            title_link: compile_selector(&selectors.title_link)?,
            subcategory_link: compile_selector(&selectors.subcategory_link)?,
            id_attribute: selectors.id_attribute.clone(),
        })
    }

    fn extract_category(&self, card: ElementRef<'_>) -> ParsingResult<Category> {
        let heading = required_element(card, &self.title, "category.title")?;

        let raw_id = required_attr(heading, &self.id_attribute, "category.id")?;
        let id: u64 = raw_id
            .parse()
            .map_err(|e| ParsingError::field_parse_failed("category.id", raw_id, e))?;

        let link = required_element(heading, &self.title_link, "category.url")?;
        let url = self.context.resolve(required_attr(link, "href", "category.url")?)?;
        let title = element_text(link);

        let subcategories = card
            .select(&self.subcategory_link)
            .map(|sub| self.extract_subcategory(sub))
            .collect::<ParsingResult<Vec<_>>>()?;

        Ok(Category::new(&title, id, url, subcategories))
    }

    fn extract_subcategory(&self, link: ElementRef<'_>) -> ParsingResult<SubCategory> {
        let url = self.context.resolve(required_attr(link, "href", "subcategory.url")?)?;
        Ok(SubCategory::new(&element_text(link), url))
    }
}

impl HtmlParser for CategoryListParser {
    type Output = Vec<Category>;

    fn parse(&self, html: &str) -> ParsingResult<Self::Output> {
        let document = Html::parse_document(html);

        let Some((index, cards)) = self
            .card_selectors
            .iter()
            .enumerate()
            .map(|(i, selector)| (i, document.select(selector).collect::<Vec<_>>()))
            .find(|(_, cards)| !cards.is_empty())
        else {
            debug!("No category cards found");
            return Ok(Vec::new());
        };

        debug!("Found {} category cards using card selector {}", cards.len(), index);
        cards.into_iter().map(|card| self.extract_category(card)).collect()
    }
}
