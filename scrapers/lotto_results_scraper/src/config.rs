use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    pub url: String,
    pub request_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "https://www.nationallottery.co.za/results".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchConfig {
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub tick_interval_secs: u64,
    /// Minimum spacing between attempts for a game still missing its draw.
    pub retry_backoff_mins: i64,
    /// How long past schedule_time a game keeps retrying before giving up
    /// for the day.
    pub retry_deadline_mins: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 60,
            retry_backoff_mins: 5,
            retry_deadline_mins: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScraperConfig {
    pub source: SourceConfig,
    pub fetch: FetchConfig,
    pub schedule: ScheduleConfig,
    pub bind_addr: BindConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BindConfig {
    pub addr: String,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl ScraperConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("SOURCE_URL") {
            config.source.url = url;
        }
        if let Ok(timeout) = env::var("SCRAPER_TIMEOUT_SECS")
            .map_or(Ok(None), |t| t.parse::<u64>().map(Some))
        {
            if let Some(timeout) = timeout {
                config.source.request_timeout_secs = timeout;
            }
        }
        if let Ok(attempts) = env::var("FETCH_MAX_ATTEMPTS")
            .map_or(Ok(None), |a| a.parse::<u32>().map(Some))
        {
            if let Some(attempts) = attempts {
                config.fetch.max_attempts = attempts;
            }
        }
        if let Ok(delay) = env::var("FETCH_RETRY_DELAY_SECS")
            .map_or(Ok(None), |d| d.parse::<u64>().map(Some))
        {
            if let Some(delay) = delay {
                config.fetch.retry_delay_secs = delay;
            }
        }
        if let Ok(tick) = env::var("TICK_INTERVAL_SECS")
            .map_or(Ok(None), |t| t.parse::<u64>().map(Some))
        {
            if let Some(tick) = tick {
                config.schedule.tick_interval_secs = tick;
            }
        }
        if let Ok(backoff) = env::var("RETRY_BACKOFF_MINS")
            .map_or(Ok(None), |b| b.parse::<i64>().map(Some))
        {
            if let Some(backoff) = backoff {
                config.schedule.retry_backoff_mins = backoff;
            }
        }
        if let Ok(deadline) = env::var("RETRY_DEADLINE_MINS")
            .map_or(Ok(None), |d| d.parse::<i64>().map(Some))
        {
            if let Some(deadline) = deadline {
                config.schedule.retry_deadline_mins = deadline;
            }
        }
        if let Ok(addr) = env::var("BIND_ADDR") {
            config.bind_addr.addr = addr;
        }

        config
    }
}
