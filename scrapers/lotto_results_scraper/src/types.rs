use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// A parsed, not-yet-persisted draw result awaiting dedup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedCandidate {
    pub game_slug: String,
    pub game_name: String,
    /// Sorted ascending; draw order carries no meaning for dedup.
    pub winning_numbers: Vec<u8>,
    pub bonus_number: Option<u8>,
    pub draw_date: NaiveDate,
    pub next_jackpot: Option<String>,
}

/// A persisted draw result. At most one exists per (game_slug, draw_date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResult {
    pub id: u64,
    pub game_slug: String,
    pub game_name: String,
    pub winning_numbers: Vec<u8>,
    pub bonus_number: Option<u8>,
    pub draw_date: NaiveDate,
    pub jackpot_amount: Option<String>,
    pub next_jackpot: Option<String>,
}

/// Admin-editable per-game scrape schedule. Times are source-local (SAST).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScraperSetting {
    pub game_slug: String,
    pub is_enabled: bool,
    /// "HH:MM"
    pub schedule_time: String,
    pub last_scraped_at: Option<DateTime<Utc>>,
}

/// Game record as storage presents it to the scheduler.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub slug: String,
    pub draw_days: Vec<Weekday>,
}

/// Outcome of one fetch-parse-ingest cycle, reported to on-demand callers.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub scraped: usize,
    pub added: usize,
    pub added_results: Vec<StoredResult>,
    pub skipped_results: Vec<ScrapedCandidate>,
}
