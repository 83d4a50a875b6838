use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, trace, warn};

use crate::config::{ScheduleConfig, ScraperConfig};
use crate::error::{Result, ScrapeError};
use crate::ingest::Ingestor;
use crate::page_fetcher::PageFetcher;
use crate::result_scraper::ResultScraper;
use crate::single_flight::SingleFlight;
use crate::store::{CachePurger, ResultStore};
use crate::types::{RunSummary, ScraperSetting};
use crate::utils::{sast_local_now, sast_today};

/// Volatile per-game retry bookkeeping, owned exclusively by the scheduler.
/// A restart loses it; [`Scheduler::prime_from_storage`] re-derives the
/// "already satisfied today" part from persisted results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameRunState {
    pub last_run_date: Option<NaiveDate>,
    pub next_retry_at: Option<NaiveDateTime>,
    pub retry_deadline: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunDecision {
    Disabled,
    NotDrawDay,
    Waiting,
    Due,
    Backoff,
    Satisfied,
    Abandoned,
}

/// Decide what to do for one game at one instant (SAST wall clock).
/// Pure apart from clearing stale retry state on non-draw days, so tests
/// drive it with explicit clocks.
pub fn evaluate(
    setting: &ScraperSetting,
    draw_days: &[Weekday],
    state: &mut GameRunState,
    now: NaiveDateTime,
    policy: &ScheduleConfig,
) -> Result<RunDecision> {
    if !setting.is_enabled {
        return Ok(RunDecision::Disabled);
    }

    let today = now.date();
    if !draw_days.contains(&today.weekday()) {
        *state = GameRunState::default();
        return Ok(RunDecision::NotDrawDay);
    }

    let time = NaiveTime::parse_from_str(&setting.schedule_time, "%H:%M")
        .map_err(|_| ScrapeError::InvalidScheduleTime(setting.schedule_time.clone()))?;
    let scheduled = today.and_time(time);

    if now < scheduled {
        return Ok(RunDecision::Waiting);
    }
    if state.last_run_date == Some(today) {
        return Ok(RunDecision::Satisfied);
    }

    // The deadline is pinned when the window first opens, so a policy
    // change mid-window does not move it. A leftover from an earlier day
    // is ignored.
    let deadline = match state.retry_deadline {
        Some(d) if d.date() == today => d,
        _ => scheduled + Duration::minutes(policy.retry_deadline_mins),
    };
    if now > deadline {
        return Ok(RunDecision::Abandoned);
    }

    if let Some(retry_at) = state.next_retry_at {
        if now < retry_at {
            return Ok(RunDecision::Backoff);
        }
    }

    state.retry_deadline = Some(deadline);
    Ok(RunDecision::Due)
}

/// Optional filter for explicit date-range runs. The source page only
/// carries the latest draws, so filtering happens after the parse: matching
/// candidates are ingested, the rest are reported as skipped.
#[derive(Debug, Clone)]
pub struct RangeFilter {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub games: Option<Vec<String>>,
}

impl RangeFilter {
    fn matches(&self, slug: &str, date: NaiveDate) -> bool {
        if date < self.start || date > self.end {
            return false;
        }
        match &self.games {
            Some(games) => games.iter().any(|g| g == slug),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameStatus {
    pub game_slug: String,
    pub is_enabled: bool,
    pub schedule_time: String,
    pub decision: RunDecision,
    pub last_run_date: Option<NaiveDate>,
}

/// Drives the whole engine: a minute tick evaluates every game, and any
/// tick with at least one Due game performs a single shared
/// fetch-parse-ingest cycle (one page holds all seven games).
pub struct Scheduler {
    config: ScraperConfig,
    fetcher: PageFetcher,
    scraper: ResultScraper,
    ingestor: Ingestor,
    store: Arc<dyn ResultStore>,
    guard: SingleFlight,
    run_states: Mutex<HashMap<String, GameRunState>>,
}

impl Scheduler {
    pub fn new(
        config: ScraperConfig,
        store: Arc<dyn ResultStore>,
        purger: Arc<dyn CachePurger>,
    ) -> Result<Self> {
        let fetcher = PageFetcher::new(&config)?;
        Ok(Self {
            config,
            fetcher,
            scraper: ResultScraper::new(),
            ingestor: Ingestor::new(store.clone(), purger),
            store,
            guard: SingleFlight::new(),
            run_states: Mutex::new(HashMap::new()),
        })
    }

    /// Re-derive "already ingested today" from storage after a restart, so
    /// the Due window is not re-armed for games whose draw is already in.
    pub async fn prime_from_storage(&self) -> Result<()> {
        let today = sast_today();
        let games = self.store.games().await?;
        let mut states = self.run_states.lock().await;
        for game in games {
            let results = self.store.results_for_game(&game.slug).await?;
            if results.first().map(|r| r.draw_date) == Some(today) {
                info!(game = %game.slug, "latest stored draw is today; marking satisfied");
                states.entry(game.slug).or_default().last_run_date = Some(today);
            }
        }
        Ok(())
    }

    /// One scheduling pass at `now` (SAST wall clock).
    pub async fn tick(&self, now: NaiveDateTime) {
        let settings = match self.store.scraper_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                error!(error = %e, "could not load scraper settings");
                return;
            }
        };
        let games = match self.store.games().await {
            Ok(games) => games,
            Err(e) => {
                error!(error = %e, "could not load games");
                return;
            }
        };
        let draw_days: HashMap<String, Vec<Weekday>> = games
            .into_iter()
            .map(|g| (g.slug, g.draw_days))
            .collect();

        let mut due = Vec::new();
        {
            let mut states = self.run_states.lock().await;
            for setting in &settings {
                let state = states.entry(setting.game_slug.clone()).or_default();
                let days = draw_days
                    .get(&setting.game_slug)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                match evaluate(setting, days, state, now, &self.config.schedule) {
                    Ok(RunDecision::Due) => due.push(setting.game_slug.clone()),
                    Ok(decision) => {
                        trace!(game = %setting.game_slug, ?decision, "no action")
                    }
                    Err(e) => warn!(game = %setting.game_slug, error = %e, "skipping game"),
                }
            }
        }

        if due.is_empty() {
            return;
        }
        info!(games = ?due, "draws due; starting scrape cycle");

        match self.guard.try_run(|| self.run_cycle(None)).await {
            None => info!("scrape cycle already in flight; skipping tick"),
            Some(Ok(summary)) => {
                info!(
                    scraped = summary.scraped,
                    added = summary.added,
                    skipped = summary.skipped_results.len(),
                    "scrape cycle finished"
                );
                self.arm_backoff_for_missing(&due, &summary, now).await;
            }
            Some(Err(e)) => {
                // Automatic runs have no caller to report to; stay in the
                // Due/backoff window and let the next eligible tick retry.
                error!(error = %e, "scrape cycle failed");
                let summary = RunSummary {
                    scraped: 0,
                    added: 0,
                    added_results: Vec::new(),
                    skipped_results: Vec::new(),
                };
                self.arm_backoff_for_missing(&due, &summary, now).await;
            }
        }
    }

    async fn arm_backoff_for_missing(&self, due: &[String], summary: &RunSummary, now: NaiveDateTime) {
        let today = now.date();
        let found: HashSet<&str> = summary
            .added_results
            .iter()
            .filter(|r| r.draw_date == today)
            .map(|r| r.game_slug.as_str())
            .chain(
                summary
                    .skipped_results
                    .iter()
                    .filter(|c| c.draw_date == today)
                    .map(|c| c.game_slug.as_str()),
            )
            .collect();

        let retry_at = now + Duration::minutes(self.config.schedule.retry_backoff_mins);
        let mut states = self.run_states.lock().await;
        for slug in due {
            if !found.contains(slug.as_str()) {
                trace!(game = %slug, %retry_at, "draw not found; arming backoff");
                states.entry(slug.clone()).or_default().next_retry_at = Some(retry_at);
            }
        }
    }

    /// On-demand run: contends for the same guard as automatic runs, joins
    /// an in-flight cycle when one exists, and propagates terminal errors
    /// to the caller instead of swallowing them.
    pub async fn run_on_demand(&self) -> Result<RunSummary> {
        self.guard.run(|| self.run_cycle(None)).await
    }

    pub async fn run_range(&self, filter: RangeFilter) -> Result<RunSummary> {
        self.guard.run(|| self.run_cycle(Some(filter))).await
    }

    /// The shared fetch-parse-ingest cycle. Every game with a candidate in
    /// the parse output is marked satisfied for today, whichever trigger
    /// started the cycle.
    async fn run_cycle(&self, filter: Option<RangeFilter>) -> Result<RunSummary> {
        let candidates = self.fetcher.fetch_candidates(&self.scraper).await?;
        let scraped = candidates.len();

        let (to_ingest, mut out_of_scope): (Vec<_>, Vec<_>) = match &filter {
            Some(filter) => candidates
                .into_iter()
                .partition(|c| filter.matches(&c.game_slug, c.draw_date)),
            None => (candidates, Vec::new()),
        };

        let report = self.ingestor.ingest(to_ingest).await?;

        // Only a candidate carrying today's draw date satisfies today's
        // schedule; a stale page replaying yesterday's draw (which dedups
        // as a skip) must leave the game in its retry window.
        let today = sast_today();
        {
            let mut states = self.run_states.lock().await;
            let ingested = report
                .added
                .iter()
                .filter(|r| r.draw_date == today)
                .map(|r| r.game_slug.as_str())
                .chain(
                    report
                        .skipped
                        .iter()
                        .filter(|c| c.draw_date == today)
                        .map(|c| c.game_slug.as_str()),
                );
            for slug in ingested {
                let state = states.entry(slug.to_string()).or_default();
                state.last_run_date = Some(today);
                state.next_retry_at = None;
            }
        }

        self.store.update_scraper_last_run(Utc::now()).await?;

        let mut skipped_results = report.skipped;
        skipped_results.append(&mut out_of_scope);

        Ok(RunSummary {
            scraped,
            added: report.added.len(),
            added_results: report.added,
            skipped_results,
        })
    }

    /// Snapshot of each game's current decision, for the status endpoint.
    pub async fn status(&self) -> Result<Vec<GameStatus>> {
        let now = sast_local_now();
        let settings = self.store.scraper_settings().await?;
        let games = self.store.games().await?;
        let draw_days: HashMap<String, Vec<Weekday>> = games
            .into_iter()
            .map(|g| (g.slug, g.draw_days))
            .collect();

        let states = self.run_states.lock().await;
        let mut statuses = Vec::with_capacity(settings.len());
        for setting in settings {
            let state = states.get(&setting.game_slug).cloned().unwrap_or_default();
            let days = draw_days
                .get(&setting.game_slug)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            // Evaluate against a scratch copy: a status read must not
            // clear or arm anything, and one game's bad schedule_time
            // must not take the whole snapshot down.
            let mut scratch = state.clone();
            let decision = match evaluate(&setting, days, &mut scratch, now, &self.config.schedule)
            {
                Ok(decision) => decision,
                Err(e) => {
                    warn!(game = %setting.game_slug, error = %e, "omitting game from status");
                    continue;
                }
            };
            statuses.push(GameStatus {
                game_slug: setting.game_slug,
                is_enabled: setting.is_enabled,
                schedule_time: setting.schedule_time,
                decision,
                last_run_date: state.last_run_date,
            });
        }
        Ok(statuses)
    }

    /// Minute tick loop; runs until the process exits.
    pub async fn run_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(
            self.config.schedule.tick_interval_secs,
        ));
        info!(
            interval_secs = self.config.schedule.tick_interval_secs,
            "scheduler started"
        );
        loop {
            interval.tick().await;
            self.tick(sast_local_now()).await;
        }
    }
}
