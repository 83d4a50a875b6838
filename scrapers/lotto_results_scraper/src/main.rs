use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;

use lotto_results_scraper::scheduler::{RangeFilter, Scheduler};
use lotto_results_scraper::store::{LoggingPurger, MemoryStore, ResultStore};
use lotto_results_scraper::web::{self, AppState};
use lotto_results_scraper::ScraperConfig;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the scheduler loop and admin API
    Serve,
    /// Run one on-demand scrape cycle and print the summary
    RunOnce,
    /// Scrape and ingest only draws within an explicit date range
    RunRange {
        /// Start date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        start_date: NaiveDate,
        /// End date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        end_date: NaiveDate,
        /// Restrict to these game slugs
        #[arg(long, value_delimiter = ',')]
        games: Option<Vec<String>>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = ScraperConfig::from_env();

    let store: Arc<dyn ResultStore> = Arc::new(MemoryStore::new());
    store.ensure_default_settings().await?;
    let purger = Arc::new(LoggingPurger);

    let scheduler = Arc::new(Scheduler::new(config.clone(), store, purger)?);
    scheduler.prime_from_storage().await?;

    match cli.command {
        Commands::Serve => {
            let state = AppState {
                scheduler: scheduler.clone(),
            };
            let addr = config.bind_addr.addr.clone();
            tokio::spawn(async move {
                if let Err(e) = web::serve(state, &addr).await {
                    tracing::error!(error = %e, "admin API stopped");
                }
            });
            scheduler.run_loop().await;
        }
        Commands::RunOnce => {
            let summary = scheduler.run_on_demand().await?;
            info!(scraped = summary.scraped, added = summary.added, "run complete");
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::RunRange {
            start_date,
            end_date,
            games,
        } => {
            let summary = scheduler
                .run_range(RangeFilter {
                    start: start_date,
                    end: end_date,
                    games,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
