use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::error::ScrapeError;
use crate::scheduler::{RangeFilter, Scheduler};

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
}

#[derive(Debug, Deserialize)]
pub struct RunRangeRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub games: Option<Vec<String>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/scrape/run", post(run_handler))
        .route("/api/scrape/run-range", post(run_range_handler))
        .route("/api/scrape/status", get(status_handler))
        .with_state(state)
}

#[axum::debug_handler]
async fn run_handler(State(state): State<AppState>) -> Response {
    match state.scheduler.run_on_demand().await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => error_response(e),
    }
}

#[axum::debug_handler]
async fn run_range_handler(
    State(state): State<AppState>,
    Json(request): Json<RunRangeRequest>,
) -> Response {
    if request.end_date < request.start_date {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "end_date precedes start_date" })),
        )
            .into_response();
    }

    let filter = RangeFilter {
        start: request.start_date,
        end: request.end_date,
        games: request.games,
    };
    match state.scheduler.run_range(filter).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => error_response(e),
    }
}

#[axum::debug_handler]
async fn status_handler(State(state): State<AppState>) -> Response {
    match state.scheduler.status().await {
        Ok(statuses) => (StatusCode::OK, Json(statuses)).into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(error: ScrapeError) -> Response {
    let status = match error {
        ScrapeError::Busy => StatusCode::CONFLICT,
        _ => StatusCode::BAD_GATEWAY,
    };
    let body = json!({
        "error": error.to_string(),
        "scraped": 0,
        "added": 0,
    });
    (status, Json(body)).into_response()
}

pub async fn serve(state: AppState, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "admin API listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
