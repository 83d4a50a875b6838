use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT_LANGUAGE, USER_AGENT};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::error::{Result, ScrapeError};
use crate::result_scraper::ResultScraper;
use crate::types::ScrapedCandidate;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

const ACCEPT_LANGUAGES: &[&str] = &["en-ZA,en;q=0.9", "en-GB,en;q=0.8", "en-US,en;q=0.9"];

/// Fetches the shared results page, which carries every game's section.
///
/// Each attempt presents a randomized request identity from a fixed pool.
/// Best-effort only; nothing downstream depends on which identity was used.
pub struct PageFetcher {
    client: reqwest::Client,
    url: String,
    max_attempts: u32,
    retry_delay: Duration,
}

impl PageFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.source.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.source.url.clone(),
            max_attempts: config.fetch.max_attempts.max(1),
            retry_delay: Duration::from_secs(config.fetch.retry_delay_secs),
        })
    }

    /// One GET of the source page.
    pub async fn fetch_page(&self) -> Result<String> {
        // ThreadRng is !Send; keep it scoped so the request future stays Send
        let (agent, language) = {
            let mut rng = rand::thread_rng();
            (
                USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0]),
                ACCEPT_LANGUAGES
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or(ACCEPT_LANGUAGES[0]),
            )
        };

        debug!(url = %self.url, "fetching source page");
        let response = self
            .client
            .get(&self.url)
            .header(USER_AGENT, agent)
            .header(ACCEPT_LANGUAGE, language)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }

    /// Fetch and parse with bounded retries. A transport failure and a page
    /// with zero parseable sections go through the same loop: upstream
    /// publishing lag and network trouble are indistinguishable here, the
    /// scheduler's backoff handles both. The last error is surfaced after
    /// the final attempt.
    pub async fn fetch_candidates(&self, scraper: &ResultScraper) -> Result<Vec<ScrapedCandidate>> {
        let mut last_err = ScrapeError::NoSectionsFound;

        for attempt in 1..=self.max_attempts {
            match self.fetch_page().await {
                Ok(html) => {
                    let candidates = scraper.parse_page(&html);
                    if !candidates.is_empty() {
                        debug!(attempt, sections = candidates.len(), "parsed game sections");
                        return Ok(candidates);
                    }
                    warn!(attempt, "page fetched but no game sections parsed");
                    last_err = ScrapeError::NoSectionsFound;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "fetch attempt failed");
                    last_err = e;
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(last_err)
    }
}
