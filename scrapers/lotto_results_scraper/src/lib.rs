pub mod config;
pub mod error;
pub mod games;
pub mod ingest;
pub mod page_fetcher;
pub mod result_scraper;
pub mod scheduler;
pub mod section_extract;
pub mod single_flight;
pub mod store;
pub mod types;
pub mod utils;
pub mod web;

pub use config::ScraperConfig;
pub use error::{Result, ScrapeError};
pub use scheduler::{RangeFilter, Scheduler};
pub use types::{RunSummary, ScrapedCandidate, ScraperSetting, StoredResult};
