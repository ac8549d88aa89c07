use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use funpay_harvester_lib::application::{HarvestError, LiveHarvester, pick_random_subcategory};
use funpay_harvester_lib::domain::{Category, Offer};
use funpay_harvester_lib::infrastructure::config::{AppConfig, Currency};
use funpay_harvester_lib::infrastructure::csv_export::CsvExporter;
use funpay_harvester_lib::infrastructure::logging::init_logging_with_config;
use funpay_harvester_lib::infrastructure::parsing::{OfferListParser, ParseContext, SellerParser};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "funpay-harvester",
    about = "Harvest categories and offers from funpay.com",
    version
)]
struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(long, global = true, env = "FUNPAY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter directive (e.g. "debug", "funpay_harvester_lib=trace")
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Display currency requested from the site (usd, eur, rub)
    #[arg(long, global = true)]
    currency: Option<Currency>,

    /// Fixed number of seconds between requests to the site
    #[arg(long, global = true)]
    min_interval: Option<f64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick a random subcategory and export its offers (default)
    Harvest {
        /// Output CSV path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List landing page categories
    Categories {
        /// Also export them as CSV
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Export the offers of one subcategory page
    Offers {
        /// Subcategory URL, e.g. https://funpay.com/lots/210/
        #[arg(long)]
        url: String,
        /// Output CSV path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Parse a saved offer listing page without network access
    ParseOffers {
        /// Saved HTML file
        #[arg(long)]
        file: PathBuf,
        /// Output CSV path; CSV goes to stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging_with_config(&config.logging)?;

    let exporter = CsvExporter::from_config(&config.export)?;
    let default_output = config.export.output_path.clone();

    match cli.command {
        None => harvest(&config, &exporter, &default_output).await,
        Some(Commands::Harvest { output }) => {
            harvest(&config, &exporter, output.as_deref().unwrap_or(&default_output)).await
        }
        Some(Commands::Categories { output }) => {
            list_categories(&config, &exporter, output.as_deref()).await
        }
        Some(Commands::Offers { url, output }) => {
            let harvester = LiveHarvester::from_config(&config)?;
            let offers = harvester.offers(&url).await?;
            export_offers(&exporter, &offers, output.as_deref().unwrap_or(&default_output))
        }
        Some(Commands::ParseOffers { file, output }) => {
            parse_offline(&config, &exporter, &file, output.as_deref())
        }
    }
}

/// File and environment first, then command line flags on top
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    if let Some(currency) = cli.currency {
        config.scraper.currency = currency;
    }
    if let Some(interval) = cli.min_interval {
        config.scraper.min_interval_secs = Some(interval);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn harvest(config: &AppConfig, exporter: &CsvExporter, output: &Path) -> Result<()> {
    let harvester = LiveHarvester::from_config(config)?;

    let categories = harvester.categories().await?;
    let subcategory = pick_random_subcategory(&categories, &mut fastrand::Rng::new())
        .ok_or(HarvestError::NoSubcategories)?;
    info!("🎲 Picked subcategory '{}' ({})", subcategory.title(), subcategory.url());

    let offers = harvester.offers(subcategory.url().as_str()).await?;
    export_offers(exporter, &offers, output)
}

async fn list_categories(
    config: &AppConfig,
    exporter: &CsvExporter,
    output: Option<&Path>,
) -> Result<()> {
    let harvester = LiveHarvester::from_config(config)?;
    let categories = harvester.categories().await?;

    for category in &categories {
        print_category(category);
    }

    if let Some(path) = output {
        if categories.is_empty() {
            warn!("No categories found, nothing written to {}", path.display());
        } else {
            exporter
                .save_categories(&categories, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
    }
    Ok(())
}

fn print_category(category: &Category) {
    println!("[{}] {} {}", category.id(), category.title(), category.url());
    for sub in category.subcategories() {
        println!("    {} {}", sub.title(), sub.url());
    }
}

fn parse_offline(
    config: &AppConfig,
    exporter: &CsvExporter,
    file: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let selectors = &config.scraper.selectors;
    let context = ParseContext::new(config.scraper.base_url()?);
    let sellers = SellerParser::new(context.clone(), &selectors.seller)?;
    let parser = OfferListParser::new(context, &selectors.offer, sellers)?;

    let report = parser.parse_report(&html);
    info!(
        "{} offers parsed from {} ({} skipped, {} sellers)",
        report.offers.len(),
        file.display(),
        report.skipped.len(),
        report.sellers_parsed
    );

    match output {
        Some(path) => export_offers(exporter, &report.offers, path),
        None => {
            print!("{}", exporter.with_bom(false).offers_to_string(&report.offers)?);
            Ok(())
        }
    }
}

fn export_offers(exporter: &CsvExporter, offers: &[Offer], output: &Path) -> Result<()> {
    if offers.is_empty() {
        warn!("No offers found, nothing written to {}", output.display());
        return Ok(());
    }

    let written = exporter
        .save_offers(offers, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Saved {written} offers to {}", output.display());
    Ok(())
}
