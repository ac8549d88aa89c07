//! Application layer module
//!
//! Workflows that drive the fetcher, the cooldown and the parsers together.

pub mod harvester;

pub use harvester::{FunPayHarvester, HarvestError, LiveHarvester, pick_random_subcategory};
