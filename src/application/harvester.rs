//! FunPay harvesting workflows
//!
//! Composes the page fetcher, the per-domain cooldown and the parsers into
//! the two public operations: listing categories from the landing page and
//! listing offers of one subcategory page.

use crate::domain::{AbsoluteUrl, Category, Offer, SubCategory};
use crate::infrastructure::config::{AppConfig, ConfigError, funpay};
use crate::infrastructure::http_client::{FetchError, HttpClient, PageFetcher};
use crate::infrastructure::parsing::{
    CategoryListParser, HtmlParser, OfferListParser, OfferListReport, ParseContext, ParsingError,
    ParsingSelectors, SellerParser,
};
use crate::infrastructure::rate_limiter::{
    Clock, CooldownManager, FastrandJitter, Jitter, TokioClock,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parsing(#[from] ParsingError),

    #[error("Invalid offers URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("No category has a subcategory to harvest")]
    NoSubcategories,

    #[error("Harvester setup failed: {0}")]
    Setup(#[from] ConfigError),
}

/// Harvester wired for the live site
pub type LiveHarvester = FunPayHarvester<HttpClient, TokioClock, FastrandJitter>;

pub struct FunPayHarvester<F, C = TokioClock, J = FastrandJitter> {
    fetcher: F,
    cooldown: CooldownManager<C, J>,
    category_parser: CategoryListParser,
    offer_parser: OfferListParser,
    fallback_pause: (Duration, Duration),
}

impl LiveHarvester {
    /// Builds the production harvester from validated configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, HarvestError> {
        config.validate()?;
        let base_url = config.scraper.base_url()?;
        let fetcher = HttpClient::new(base_url, config.scraper.currency, &config.http)?;
        let cooldown = CooldownManager::with_policy(config.scraper.cooldown_policy());

        Self::new(fetcher, cooldown, &config.scraper.selectors, config.scraper.fallback_pause())
    }
}

impl<F: PageFetcher, C: Clock, J: Jitter> FunPayHarvester<F, C, J> {
    /// Parsers resolve relative links against the fetcher's origin
    pub fn new(
        fetcher: F,
        cooldown: CooldownManager<C, J>,
        selectors: &ParsingSelectors,
        fallback_pause: (Duration, Duration),
    ) -> Result<Self, HarvestError> {
        let context = ParseContext::new(fetcher.base_url().clone());
        let seller_parser = SellerParser::new(context.clone(), &selectors.seller)?;

        Ok(Self {
            category_parser: CategoryListParser::new(context.clone(), &selectors.category)?,
            offer_parser: OfferListParser::new(context, &selectors.offer, seller_parser)?,
            fetcher,
            cooldown,
            fallback_pause,
        })
    }

    pub const fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub const fn cooldown(&self) -> &CooldownManager<C, J> {
        &self.cooldown
    }

    /// Host every request is paced under
    fn domain(&self) -> &str {
        self.fetcher.base_url().host_str().unwrap_or(funpay::DOMAIN)
    }

    /// Categories from the landing page.
    ///
    /// An empty primary page triggers exactly one retry on the alternate
    /// landing page after a short pause; its result is final even if empty.
    pub async fn categories(&self) -> Result<Vec<Category>, HarvestError> {
        self.cooldown.cooldown(self.domain()).await;
        let html = self.fetcher.fetch(funpay::PRIMARY_LANDING_PATH).await?;
        let categories = self.category_parser.parse(&html)?;
        if !categories.is_empty() {
            info!("📂 Found {} categories", categories.len());
            return Ok(categories);
        }

        warn!("No categories on primary landing page, trying {}", funpay::ALTERNATE_LANDING_PATH);
        let (min, max) = self.fallback_pause;
        self.cooldown.pause_between(min, max).await;

        let html = self.fetcher.fetch(funpay::ALTERNATE_LANDING_PATH).await?;
        let categories = self.category_parser.parse(&html)?;
        info!("📂 Found {} categories on alternate landing page", categories.len());
        Ok(categories)
    }

    /// Offers listed on a subcategory page, skipping rows that cannot be read
    pub async fn offers(&self, url: &str) -> Result<Vec<Offer>, HarvestError> {
        Ok(self.offers_report(url).await?.offers)
    }

    /// Offers plus the rows that were skipped and the distinct seller count
    pub async fn offers_report(&self, url: &str) -> Result<OfferListReport, HarvestError> {
        let target = self.same_origin(url)?;

        self.cooldown.cooldown(self.domain()).await;
        let html = self.fetcher.fetch(&target.path_and_query()).await?;
        let report = self.offer_parser.parse_report(&html);

        info!(
            "🛒 {} offers from {} ({} skipped, {} sellers)",
            report.offers.len(),
            target,
            report.skipped.len(),
            report.sellers_parsed
        );
        Ok(report)
    }

    /// Subcategory links from the landing page must stay on the fetcher's origin
    fn same_origin(&self, url: &str) -> Result<AbsoluteUrl, HarvestError> {
        let invalid = |reason: String| HarvestError::InvalidUrl {
            url: url.to_string(),
            reason,
        };

        let target = AbsoluteUrl::parse(url).map_err(|e| invalid(e.to_string()))?;
        if target.host() != self.domain() {
            return Err(invalid(format!("host is not {}", self.domain())));
        }
        debug!("Offers target {}", target);
        Ok(target)
    }
}

/// Random category, then a random subcategory of it.
///
/// Categories without subcategories are never picked; `None` when no
/// category has any.
pub fn pick_random_subcategory<'a>(
    categories: &'a [Category],
    rng: &mut fastrand::Rng,
) -> Option<&'a SubCategory> {
    let candidates: Vec<&Category> = categories
        .iter()
        .filter(|category| !category.subcategories().is_empty())
        .collect();

    let category = candidates.get(rng.usize(..candidates.len().max(1)))?;
    let subcategories = category.subcategories();
    subcategories.get(rng.usize(..subcategories.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::StaticPageFetcher;
    use crate::infrastructure::rate_limiter::{CooldownPolicy, FixedJitter, ManualClock};
    use std::sync::Arc;
    use url::Url;

    const LANDING: &str = r#"<html><body><div class="promo-game-list">
        <div class="promo-game-item">
          <div class="game-title" data-id="41"><a href="/lots/41/">Dota 2</a></div>
          <ul><li><a href="/lots/210/">Items</a></li></ul>
        </div></div></body></html>"#;

    fn harvester(
        fetcher: StaticPageFetcher,
        clock: Arc<ManualClock>,
    ) -> FunPayHarvester<StaticPageFetcher, Arc<ManualClock>, FixedJitter> {
        let cooldown = CooldownManager::new(
            CooldownPolicy::fixed(Duration::from_secs(5)),
            clock,
            FixedJitter::lower(),
        );
        FunPayHarvester::new(
            fetcher,
            cooldown,
            &ParsingSelectors::default(),
            (Duration::from_millis(200), Duration::from_millis(1000)),
        )
        .unwrap()
    }

    fn fetcher() -> StaticPageFetcher {
        StaticPageFetcher::new(Url::parse(funpay::BASE_URL).unwrap())
    }

    #[tokio::test]
    async fn primary_landing_page_is_enough() {
        let clock = Arc::new(ManualClock::new());
        let harvester = harvester(fetcher().with_page("", LANDING).unwrap(), clock);

        let categories = harvester.categories().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(harvester.fetcher().requests(), vec![String::new()]);
    }

    #[tokio::test]
    async fn pauses_before_alternate_landing_page() {
        let clock = Arc::new(ManualClock::new());
        let fetcher = fetcher()
            .with_page("", "<html></html>")
            .unwrap()
            .with_page("/en/", LANDING)
            .unwrap();
        let harvester = harvester(fetcher, Arc::clone(&clock));

        assert_eq!(harvester.categories().await.unwrap().len(), 1);
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(200)]);
    }

    #[tokio::test]
    async fn foreign_offer_url_is_rejected() {
        let harvester = harvester(fetcher(), Arc::new(ManualClock::new()));
        let err = harvester.offers("https://example.com/lots/1/").await.unwrap_err();
        assert!(matches!(err, HarvestError::InvalidUrl { .. }));
        assert!(harvester.fetcher().requests().is_empty());
    }

    #[tokio::test]
    async fn second_offers_call_waits_for_cooldown() {
        let clock = Arc::new(ManualClock::new());
        let fetcher = fetcher().with_page("/lots/210/", "<html></html>").unwrap();
        let harvester = harvester(fetcher, Arc::clone(&clock));

        harvester.offers("https://funpay.com/lots/210/").await.unwrap();
        harvester.offers("https://funpay.com/lots/210/").await.unwrap();
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(5)]);
    }

    #[test]
    fn random_pick_skips_empty_categories() {
        let url = |path: &str| AbsoluteUrl::parse(&format!("https://funpay.com{path}")).unwrap();
        let empty = Category::new("Empty", 1, url("/lots/1/"), Vec::new());
        let full = Category::new(
            "Full",
            2,
            url("/lots/2/"),
            vec![SubCategory::new("Gold", url("/lots/3/"))],
        );

        let both = [empty.clone(), full];
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..20 {
            let picked = pick_random_subcategory(&both, &mut rng).unwrap();
            assert_eq!(picked.title(), "Gold");
        }
        assert!(pick_random_subcategory(&[empty], &mut rng).is_none());
        assert!(pick_random_subcategory(&[], &mut rng).is_none());
    }
}
