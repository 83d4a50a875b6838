use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::Result;
use crate::games::{default_draw_days, GAME_CONFIGS};
use crate::types::{GameRecord, ScrapedCandidate, ScraperSetting, StoredResult};

/// Storage contract the engine consumes. The production deployment backs
/// this with the site's database; tests and the demo binary use
/// [`MemoryStore`].
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Stored results for one game, most recent draw first.
    async fn results_for_game(&self, slug: &str) -> Result<Vec<StoredResult>>;
    async fn create_result(&self, candidate: &ScrapedCandidate) -> Result<StoredResult>;
    async fn games(&self) -> Result<Vec<GameRecord>>;
    async fn scraper_settings(&self) -> Result<Vec<ScraperSetting>>;
    /// Create default settings for any game missing one. Never overwrites.
    async fn ensure_default_settings(&self) -> Result<()>;
    async fn update_setting(&self, setting: ScraperSetting) -> Result<()>;
    async fn update_scraper_last_run(&self, at: DateTime<Utc>) -> Result<()>;
}

/// Cache-invalidation collaborator. Fire-and-forget: implementations log
/// failures and never propagate them.
#[async_trait]
pub trait CachePurger: Send + Sync {
    async fn purge(&self, paths: &[String]);
}

/// Purger that only logs, for deployments without a CDN in front.
pub struct LoggingPurger;

#[async_trait]
impl CachePurger for LoggingPurger {
    async fn purge(&self, paths: &[String]) {
        info!(?paths, "cache purge requested");
    }
}

const DEFAULT_SCHEDULE_TIME: &str = "21:30";

#[derive(Default)]
struct MemoryStoreInner {
    results: HashMap<String, Vec<StoredResult>>,
    settings: HashMap<String, ScraperSetting>,
    next_id: u64,
}

/// In-memory store keyed by game slug.
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryStoreInner {
                next_id: 1,
                ..Default::default()
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn results_for_game(&self, slug: &str) -> Result<Vec<StoredResult>> {
        let inner = self.inner.lock().await;
        let mut results = inner.results.get(slug).cloned().unwrap_or_default();
        results.sort_by(|a, b| b.draw_date.cmp(&a.draw_date));
        Ok(results)
    }

    async fn create_result(&self, candidate: &ScrapedCandidate) -> Result<StoredResult> {
        let mut inner = self.inner.lock().await;
        let id = inner.next_id;
        inner.next_id += 1;

        let stored = StoredResult {
            id,
            game_slug: candidate.game_slug.clone(),
            game_name: candidate.game_name.clone(),
            winning_numbers: candidate.winning_numbers.clone(),
            bonus_number: candidate.bonus_number,
            draw_date: candidate.draw_date,
            // The parser only ever sees the next-draw estimate; the source
            // system stores it as the current jackpot. Preserved as-is.
            jackpot_amount: candidate.next_jackpot.clone(),
            next_jackpot: candidate.next_jackpot.clone(),
        };

        inner
            .results
            .entry(candidate.game_slug.clone())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn games(&self) -> Result<Vec<GameRecord>> {
        Ok(GAME_CONFIGS
            .iter()
            .map(|game| GameRecord {
                slug: game.slug.to_string(),
                draw_days: default_draw_days(game.slug),
            })
            .collect())
    }

    async fn scraper_settings(&self) -> Result<Vec<ScraperSetting>> {
        let inner = self.inner.lock().await;
        let mut settings: Vec<_> = inner.settings.values().cloned().collect();
        settings.sort_by(|a, b| a.game_slug.cmp(&b.game_slug));
        Ok(settings)
    }

    async fn ensure_default_settings(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        for game in GAME_CONFIGS {
            inner
                .settings
                .entry(game.slug.to_string())
                .or_insert_with(|| ScraperSetting {
                    game_slug: game.slug.to_string(),
                    is_enabled: true,
                    schedule_time: DEFAULT_SCHEDULE_TIME.to_string(),
                    last_scraped_at: None,
                });
        }
        Ok(())
    }

    async fn update_setting(&self, setting: ScraperSetting) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.settings.insert(setting.game_slug.clone(), setting);
        Ok(())
    }

    async fn update_scraper_last_run(&self, at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.lock().await;
        for setting in inner.settings.values_mut() {
            setting.last_scraped_at = Some(at);
        }
        Ok(())
    }
}
