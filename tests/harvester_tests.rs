//! End-to-end harvesting over stored pages and a virtual clock
use funpay_harvester_lib::application::{FunPayHarvester, HarvestError};
use funpay_harvester_lib::infrastructure::config::funpay;
use funpay_harvester_lib::infrastructure::http_client::{FetchError, StaticPageFetcher};
use funpay_harvester_lib::infrastructure::parsing::ParsingSelectors;
use funpay_harvester_lib::infrastructure::rate_limiter::{
    CooldownManager, CooldownPolicy, FixedJitter, ManualClock,
};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const LANDING: &str = include_str!("fixtures/landing.html");
const LISTING: &str = include_str!("fixtures/offers.html");
const EMPTY_PAGE: &str = "<html><body><div class=\"content\"></div></body></html>";

const INTERVAL: Duration = Duration::from_secs(7);
const FALLBACK_PAUSE: (Duration, Duration) =
    (Duration::from_millis(200), Duration::from_millis(1000));

type TestHarvester = FunPayHarvester<StaticPageFetcher, Arc<ManualClock>, FixedJitter>;

fn pages(entries: &[(&str, &str)]) -> StaticPageFetcher {
    entries.iter().fold(
        StaticPageFetcher::new(Url::parse(funpay::BASE_URL).unwrap()),
        |fetcher, (path, body)| fetcher.with_page(path, *body).unwrap(),
    )
}

fn harvester(fetcher: StaticPageFetcher) -> (Arc<ManualClock>, TestHarvester) {
    let clock = Arc::new(ManualClock::new());
    let cooldown = CooldownManager::new(
        CooldownPolicy::fixed(INTERVAL),
        Arc::clone(&clock),
        FixedJitter::upper(),
    );
    let selectors = ParsingSelectors::default();
    let harvester = FunPayHarvester::new(fetcher, cooldown, &selectors, FALLBACK_PAUSE).unwrap();
    (clock, harvester)
}

#[tokio::test]
async fn empty_primary_page_falls_back_to_alternate() {
    let (clock, harvester) = harvester(pages(&[("", EMPTY_PAGE), ("/en/", LANDING)]));

    let categories = harvester.categories().await.unwrap();

    assert_eq!(categories.len(), 3);
    assert_eq!(harvester.fetcher().requests(), vec!["", "/en/"]);
    assert_eq!(clock.sleeps(), vec![FALLBACK_PAUSE.1]);
}

#[tokio::test]
async fn both_landing_pages_empty_gives_empty_list() {
    let (_, harvester) = harvester(pages(&[("", EMPTY_PAGE), ("/en/", EMPTY_PAGE)]));

    let categories = harvester.categories().await.unwrap();

    assert!(categories.is_empty());
    assert_eq!(harvester.fetcher().requests().len(), 2);
}

#[tokio::test]
async fn fetch_failure_is_propagated() {
    let (_, harvester) = harvester(pages(&[]));

    let err = harvester.categories().await.unwrap_err();
    assert!(matches!(err, HarvestError::Fetch(FetchError::NotFound(_))));
}

#[tokio::test]
async fn offers_come_from_the_subcategory_path() {
    let (_, harvester) = harvester(pages(&[("/en/lots/210/", LISTING)]));

    let report = harvester.offers_report("https://funpay.com/en/lots/210/").await.unwrap();

    assert_eq!(report.offers.len(), 4);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(harvester.fetcher().requests(), vec!["/en/lots/210/"]);
}

#[tokio::test]
async fn categories_then_offers_share_one_domain_schedule() {
    let (clock, harvester) = harvester(pages(&[("", LANDING), ("/en/lots/210/", LISTING)]));

    let categories = harvester.categories().await.unwrap();
    let subcategory = &categories[0].subcategories()[0];
    let offers = harvester.offers(subcategory.url().as_str()).await.unwrap();

    assert_eq!(offers.len(), 4);
    assert_eq!(clock.sleeps(), vec![INTERVAL]);
    assert_eq!(harvester.cooldown().tracked_domains(), vec![funpay::DOMAIN.to_string()]);
}

#[tokio::test]
async fn unparseable_offer_url_is_rejected_before_any_request() {
    let (clock, harvester) = harvester(pages(&[]));

    let err = harvester.offers("lots/210").await.unwrap_err();

    assert!(matches!(err, HarvestError::InvalidUrl { .. }));
    assert!(harvester.fetcher().requests().is_empty());
    assert!(clock.sleeps().is_empty());
}
