//! Offer listing extraction against a saved subcategory page
use funpay_harvester_lib::domain::{AbsoluteUrl, RatingStars};
use funpay_harvester_lib::infrastructure::parsing::{
    HtmlParser, OfferListParser, OfferListReport, ParseContext, ParsingError, ParsingSelectors,
    SellerParser,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use url::Url;

const LISTING: &str = include_str!("fixtures/offers.html");

fn parser() -> OfferListParser {
    let selectors = ParsingSelectors::default();
    let context = ParseContext::new(Url::parse("https://funpay.com").unwrap());
    let sellers = SellerParser::new(context.clone(), &selectors.seller).unwrap();
    OfferListParser::new(context, &selectors.offer, sellers).unwrap()
}

fn report() -> OfferListReport {
    parser().parse_report(LISTING)
}

#[test]
fn every_readable_row_becomes_an_offer_in_document_order() {
    let report = report();
    let ids: Vec<&str> = report
        .offers
        .iter()
        .map(|offer| offer.url().as_str().rsplit('=').next().unwrap())
        .collect();

    assert_eq!(ids, vec!["1001", "1002", "1003", "1005"]);
    assert_eq!(report.rows_seen(), 5);
}

#[test]
fn broken_row_is_skipped_without_losing_the_rest() {
    let report = report();

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].index, 3);
    assert!(matches!(report.skipped[0].reason, ParsingError::Record(_)));
}

#[test]
fn first_offer_carries_all_fields() {
    let report = report();
    let offer = &report.offers[0];

    assert_eq!(offer.url().as_str(), "https://funpay.com/en/lots/offer?id=1001");
    assert_eq!(offer.description(), "Arcana bundle, instant delivery");
    assert_eq!(offer.price_value(), Decimal::new(1234, 2));
    assert_eq!(offer.price_currency(), "$");
    assert!(offer.auto_delivery());
    assert_eq!(offer.platform(), Some("pc"));
    assert_eq!(offer.server_id(), Some("1"));
    assert_eq!(offer.server_name(), Some("EU West"));
    assert_eq!(offer.feature_type1(), None);

    let seller = offer.seller();
    assert_eq!(seller.url().as_str(), "https://funpay.com/en/users/100/");
    assert_eq!(seller.username(), "NightTrader");
    assert_eq!(
        seller.thumb_avatar_url().map(AbsoluteUrl::as_str),
        Some("https://sfunpay.com/s/avatar/1q/ab/1qab.jpg")
    );
    assert_eq!(seller.rating_stars().map(RatingStars::value), Some(5));
    assert_eq!(seller.reviews_count(), Some(318));
    assert_eq!(seller.account_age(), "on site for 3 years");
}

#[test]
fn relative_links_whitespace_and_grouped_digits_are_normalised() {
    let report = report();
    let offer = &report.offers[1];

    assert_eq!(offer.url().as_str(), "https://funpay.com/en/lots/offer?id=1002");
    assert_eq!(offer.description(), "Courier set");
    assert_eq!(offer.price_value(), Decimal::new(125_050, 2));
    assert_eq!(offer.price_currency(), "₽");
    assert!(!offer.auto_delivery());
    assert_eq!(offer.server_id(), None);
    assert_eq!(offer.server_name(), None);
}

#[test]
fn hidden_rows_and_placeholder_avatars() {
    let report = report();
    let hidden = &report.offers[2];

    assert_eq!(hidden.description(), "Hidden offer");
    assert!(!hidden.auto_delivery());
    assert_eq!(hidden.seller().thumb_avatar_url(), None);
    assert_eq!(hidden.seller().rating_stars(), None);
    assert_eq!(hidden.seller().reviews_count(), None);

    let account = &report.offers[3];
    assert_eq!(account.feature_type1(), Some("account"));
    assert_eq!(account.feature_type2(), Some("full access"));
}

#[test]
fn sellers_are_shared_between_their_offers() {
    let report = report();
    let offers = &report.offers;

    assert!(Arc::ptr_eq(offers[0].seller(), offers[1].seller()));
    assert!(Arc::ptr_eq(offers[2].seller(), offers[3].seller()));
    assert!(!Arc::ptr_eq(offers[0].seller(), offers[2].seller()));
    assert_eq!(report.sellers_parsed, 2);
}

#[test]
fn seller_cache_does_not_outlive_a_call() {
    let parser = parser();
    let first = parser.parse(LISTING).unwrap();
    let second = parser.parse(LISTING).unwrap();

    assert_eq!(first, second);
    assert!(!Arc::ptr_eq(first[0].seller(), second[0].seller()));
}

#[test]
fn many_rows_for_one_seller_parse_it_once() {
    let row = |id: usize| {
        format!(
            r#"<a href="/lots/offer?id={id}" class="tc-item">
                 <div class="tc-desc"><div class="tc-desc-text">Gold x{id}</div></div>
                 <div class="tc-user"><div class="media">
                   <div class="media-left"><div class="avatar-photo" data-href="/users/5/"></div></div>
                   <div class="media-body"><div class="media-user-name">Bulk</div><div class="media-user-info">5 years</div></div>
                 </div></div>
                 <div class="tc-price"><div>{id}.00 <span>€</span></div></div>
               </a>"#
        )
    };
    let rows: String = (1..=50).map(row).collect();
    let html = format!(r#"<div class="showcase-table">{rows}</div>"#);

    let report = parser().parse_report(&html);
    assert_eq!(report.offers.len(), 50);
    assert_eq!(report.sellers_parsed, 1);
    assert!(report.offers.iter().all(|o| Arc::ptr_eq(o.seller(), report.offers[0].seller())));
}

#[test]
fn offers_serialize_with_flattened_price() {
    let report = report();
    let json = serde_json::to_value(&report.offers[0]).unwrap();

    assert_eq!(json["priceCurrency"], "$");
    assert_eq!(json["priceValue"], "12.34");
    assert_eq!(json["autoDelivery"], true);
    assert_eq!(json["seller"]["username"], "NightTrader");
}
