//! Named-field extraction helpers
//!
//! Each helper reads one value from an already selected block and fails
//! independently, naming the field it was looking for.

use super::{ParsingError, ParsingResult};
use regex::Regex;
use scraper::{ElementRef, Node, Selector};

/// Text of the element with runs of whitespace collapsed to one space
#[must_use]
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

/// First descendant matching `selector`
#[must_use]
pub fn select_first<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    element.select(selector).next()
}

pub fn required_element<'a>(
    element: ElementRef<'a>,
    selector: &Selector,
    field: &str,
) -> ParsingResult<ElementRef<'a>> {
    select_first(element, selector)
        .ok_or_else(|| ParsingError::required_field_missing(field, Some(element.value().name())))
}

pub fn required_text(
    element: ElementRef<'_>,
    selector: &Selector,
    field: &str,
) -> ParsingResult<String> {
    required_element(element, selector, field).map(element_text)
}

#[must_use]
pub fn optional_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    select_first(element, selector)
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// Attribute on the element itself; must be present and non-blank
pub fn required_attr<'a>(
    element: ElementRef<'a>,
    name: &str,
    field: &str,
) -> ParsingResult<&'a str> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ParsingError::required_field_missing(field, Some(name)))
}

/// Attribute on the element itself, trimmed; blank counts as absent
#[must_use]
pub fn optional_attr(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

/// First non-blank text node that is a direct child of the element, trimmed
#[must_use]
pub fn first_text_node(element: ElementRef<'_>) -> Option<String> {
    element.children().find_map(|child| match child.value() {
        Node::Text(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    })
}

/// Non-empty and made only of ASCII digits
#[must_use]
pub fn is_purely_numeric(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// First whitespace-delimited token that is purely numeric
#[must_use]
pub fn first_numeric_token(text: &str) -> Option<&str> {
    text.split_whitespace().find(|token| is_purely_numeric(token))
}

/// Part after the last `-` of the element's last class token
/// (`"rating-stars rating-4"` gives `"4"`)
#[must_use]
pub fn last_class_suffix(element: ElementRef<'_>) -> Option<&str> {
    element
        .value()
        .attr("class")?
        .split_whitespace()
        .last()?
        .rsplit('-')
        .next()
}

/// Capture group 1 of `pattern` in an inline style, unquoted
#[must_use]
pub fn background_image_url<'a>(style: &'a str, pattern: &Regex) -> Option<&'a str> {
    let captured = pattern.captures(style)?.get(1)?.as_str().trim();
    let unquoted = captured.trim_matches(|c| c == '\'' || c == '"').trim();
    (!unquoted.is_empty()).then_some(unquoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use scraper::Html;

    fn with_root<R>(markup: &str, check: impl FnOnce(ElementRef<'_>) -> R) -> R {
        let fragment = Html::parse_fragment(markup);
        check(fragment.root_element())
    }

    fn selector(css: &str) -> Selector {
        Selector::parse(css).unwrap()
    }

    #[test]
    fn element_text_collapses_whitespace() {
        with_root("<p>  Fast \n delivery <b>24/7</b> </p>", |root| {
            let p = select_first(root, &selector("p")).unwrap();
            assert_eq!(element_text(p), "Fast delivery 24/7");
        });
    }

    #[test]
    fn required_text_names_missing_field() {
        with_root("<div></div>", |root| {
            let err = required_text(root, &selector(".tc-desc-text"), "description").unwrap_err();
            assert!(matches!(
                err,
                ParsingError::RequiredFieldMissing { ref field, .. } if field == "description"
            ));
        });
    }

    #[test]
    fn attributes_treat_blank_as_absent() {
        with_root(r#"<a data-server=" " data-f-platform=" pc "></a>"#, |root| {
            let a = select_first(root, &selector("a")).unwrap();
            assert_eq!(optional_attr(a, "data-server"), None);
            assert_eq!(optional_attr(a, "data-f-platform").as_deref(), Some("pc"));
            assert!(required_attr(a, "href", "offer.url").is_err());
        });
    }

    #[test]
    fn first_text_node_skips_nested_elements() {
        with_root("<div>\n 12.34 <span class=\"unit\">$</span></div>", |root| {
            let div = select_first(root, &selector("div")).unwrap();
            assert_eq!(first_text_node(div).as_deref(), Some("12.34"));
        });
        with_root("<div><span>$</span></div>", |root| {
            let div = select_first(root, &selector("div")).unwrap();
            assert_eq!(first_text_node(div), None);
        });
    }

    #[rstest]
    #[case("120", true)]
    #[case("0", true)]
    #[case("", false)]
    #[case("12a", false)]
    #[case("4.9", false)]
    #[case("-3", false)]
    fn numeric_check(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_purely_numeric(text), expected);
    }

    #[test]
    fn numeric_token_scan() {
        assert_eq!(first_numeric_token("4.9 out of 5, 215 reviews"), Some("215"));
        assert_eq!(first_numeric_token("no reviews"), None);
    }

    #[rstest]
    #[case(r#"<div class="rating-stars rating-4"></div>"#, Some("4"))]
    #[case(r#"<div class="rating-5"></div>"#, Some("5"))]
    #[case(r#"<div class="stars"></div>"#, Some("stars"))]
    #[case("<div></div>", None)]
    fn class_suffix(#[case] markup: &str, #[case] expected: Option<&str>) {
        with_root(markup, |root| {
            let div = select_first(root, &selector("div")).unwrap();
            assert_eq!(last_class_suffix(div), expected);
        });
    }

    #[rstest]
    #[case("background-image: url(/img/layout/avatar.png);", Some("/img/layout/avatar.png"))]
    #[case("background-image: url('https://s.funpay.com/a.jpg')", Some("https://s.funpay.com/a.jpg"))]
    #[case("color: red", None)]
    #[case("background-image: url()", None)]
    fn style_url(#[case] style: &str, #[case] expected: Option<&str>) {
        let pattern = Regex::new(r"url\((.*?)\)").unwrap();
        assert_eq!(background_image_url(style, &pattern), expected);
    }
}
