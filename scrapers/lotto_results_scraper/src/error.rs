use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("no game sections found in source page")]
    NoSectionsFound,
    #[error("a scrape is already in progress")]
    Busy,
    #[error("joined scrape failed: {0}")]
    InFlight(String),
    #[error("invalid schedule time: {0:?}")]
    InvalidScheduleTime(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
