use std::sync::Arc;
use tracing::{debug, info};

use crate::error::Result;
use crate::store::{CachePurger, ResultStore};
use crate::types::{ScrapedCandidate, StoredResult};

#[derive(Debug, Default)]
pub struct IngestReport {
    pub added: Vec<StoredResult>,
    pub skipped: Vec<ScrapedCandidate>,
}

/// Idempotent ingestion: a candidate is inserted only when no stored result
/// for the same game carries the same draw date. Candidates are checked and
/// inserted independently, partial ingestion across games is a normal
/// outcome.
pub struct Ingestor {
    store: Arc<dyn ResultStore>,
    purger: Arc<dyn CachePurger>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn ResultStore>, purger: Arc<dyn CachePurger>) -> Self {
        Self { store, purger }
    }

    pub async fn ingest(&self, candidates: Vec<ScrapedCandidate>) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        for candidate in candidates {
            let existing = self.store.results_for_game(&candidate.game_slug).await?;
            if existing.iter().any(|r| r.draw_date == candidate.draw_date) {
                debug!(
                    game = %candidate.game_slug,
                    date = %candidate.draw_date,
                    "duplicate draw, skipping"
                );
                report.skipped.push(candidate);
                continue;
            }

            let stored = self.store.create_result(&candidate).await?;
            info!(
                game = %stored.game_slug,
                date = %stored.draw_date,
                numbers = ?stored.winning_numbers,
                "ingested new draw result"
            );
            report.added.push(stored);
        }

        if !report.added.is_empty() {
            self.purge_for(&report.added).await;
        }

        Ok(report)
    }

    /// Fire-and-forget cache invalidation for every affected logical path.
    async fn purge_for(&self, added: &[StoredResult]) {
        let mut paths = Vec::with_capacity(added.len() * 2);
        for result in added {
            paths.push(format!("/results/{}", result.game_slug));
            paths.push(format!("/results/{}/{}", result.game_slug, result.draw_date));
        }
        // Failures inside the purger are its own problem; a slow or broken
        // CDN must never block ingestion.
        self.purger.purge(&paths).await;
    }
}
