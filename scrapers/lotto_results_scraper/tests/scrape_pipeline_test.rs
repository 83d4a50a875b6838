use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use lotto_results_scraper::scheduler::{RangeFilter, Scheduler};
use lotto_results_scraper::store::{LoggingPurger, MemoryStore, ResultStore};
use lotto_results_scraper::{ScrapeError, ScraperConfig};

const TWO_GAME_PAGE: &str = include_str!("fixtures/source_page/two_games.html");
const FULL_PAGE: &str = include_str!("fixtures/source_page/full_page.html");
const MALFORMED_PAGE: &str = include_str!("fixtures/source_page/malformed_powerball.html");

fn draw_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 28).unwrap()
}

fn test_config(url: String) -> ScraperConfig {
    let mut config = ScraperConfig::default();
    config.source.url = url;
    config.fetch.retry_delay_secs = 0;
    config
}

async fn scheduler_against(server: &mockito::ServerGuard) -> (Arc<Scheduler>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store.ensure_default_settings().await.unwrap();
    let scheduler = Scheduler::new(
        test_config(format!("{}/results", server.url())),
        store.clone(),
        Arc::new(LoggingPurger),
    )
    .unwrap();
    (Arc::new(scheduler), store)
}

#[tokio::test]
async fn test_end_to_end_scrape_then_dedup() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/results")
        .with_status(200)
        .with_body(TWO_GAME_PAGE)
        .expect(2)
        .create_async()
        .await;

    let (scheduler, store) = scheduler_against(&server).await;

    let first = scheduler.run_on_demand().await.unwrap();
    assert_eq!(first.scraped, 2);
    assert_eq!(first.added, 2);
    assert!(first.skipped_results.is_empty());

    let powerball = first
        .added_results
        .iter()
        .find(|r| r.game_slug == "powerball")
        .unwrap();
    assert_eq!(powerball.winning_numbers, vec![5, 12, 23, 34, 50]);
    assert_eq!(powerball.bonus_number, Some(11));
    assert_eq!(powerball.draw_date, draw_date());
    assert_eq!(powerball.jackpot_amount.as_deref(), Some("R75,000,000"));

    let daily = first
        .added_results
        .iter()
        .find(|r| r.game_slug == "daily-lotto")
        .unwrap();
    assert_eq!(daily.winning_numbers, vec![1, 9, 15, 22, 36]);
    assert_eq!(daily.bonus_number, None);

    // Second pass over the same fixture is a pure dedup
    let second = scheduler.run_on_demand().await.unwrap();
    assert_eq!(second.scraped, 2);
    assert_eq!(second.added, 0);
    let mut skipped: Vec<_> = second
        .skipped_results
        .iter()
        .map(|c| c.game_slug.as_str())
        .collect();
    skipped.sort();
    assert_eq!(skipped, vec!["daily-lotto", "powerball"]);

    for slug in ["powerball", "daily-lotto"] {
        assert_eq!(store.results_for_game(slug).await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_full_page_yields_all_seven_games() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/results")
        .with_status(200)
        .with_body(FULL_PAGE)
        .create_async()
        .await;

    let (scheduler, _store) = scheduler_against(&server).await;
    let summary = scheduler.run_on_demand().await.unwrap();

    assert_eq!(summary.scraped, 7);
    assert_eq!(summary.added, 7);

    // Stray backslash before the bonus marker is tolerated
    let plus1 = summary
        .added_results
        .iter()
        .find(|r| r.game_slug == "lotto-plus-1")
        .unwrap();
    assert_eq!(plus1.bonus_number, Some(14));
}

#[tokio::test]
async fn test_malformed_section_does_not_block_others() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/results")
        .with_status(200)
        .with_body(MALFORMED_PAGE)
        .create_async()
        .await;

    let (scheduler, _store) = scheduler_against(&server).await;
    let summary = scheduler.run_on_demand().await.unwrap();

    assert_eq!(summary.scraped, 1);
    assert_eq!(summary.added_results[0].game_slug, "daily-lotto");
}

#[tokio::test]
async fn test_run_range_filters_candidates() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/results")
        .with_status(200)
        .with_body(FULL_PAGE)
        .create_async()
        .await;

    let (scheduler, store) = scheduler_against(&server).await;
    let summary = scheduler
        .run_range(RangeFilter {
            start: draw_date(),
            end: draw_date(),
            games: Some(vec!["powerball".to_string()]),
        })
        .await
        .unwrap();

    assert_eq!(summary.scraped, 7);
    assert_eq!(summary.added, 1);
    assert_eq!(summary.added_results[0].game_slug, "powerball");
    assert_eq!(summary.skipped_results.len(), 6);

    // Nothing outside the filter was persisted
    assert!(store.results_for_game("daily-lotto").await.unwrap().is_empty());
    assert!(store.results_for_game("lotto").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_terminal_transport_failure_surfaces_to_on_demand_caller() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/results")
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let (scheduler, store) = scheduler_against(&server).await;
    let err = scheduler.run_on_demand().await.unwrap_err();

    assert!(matches!(err, ScrapeError::Transport(_)));
    assert!(store.results_for_game("powerball").await.unwrap().is_empty());
}

fn daily_lotto_page(date: NaiveDate) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Latest Lottery Results</title></head>
<body>
    <main>
        <section class="game-result">
            <h2>Daily Lotto Results</h2>
            <p class="draw-date">{date}</p>
            <div class="balls">
                <div class="ball">22</div>
                <div class="ball">01</div>
                <div class="ball">36</div>
                <div class="ball">09</div>
                <div class="ball">15</div>
            </div>
        </section>
    </main>
</body>
</html>
"#
    )
}

#[tokio::test]
async fn test_stale_page_duplicate_does_not_satisfy_today() {
    use lotto_results_scraper::types::ScrapedCandidate;
    use lotto_results_scraper::utils::sast_today;

    let yesterday = sast_today() - chrono::Duration::days(1);
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/results")
        .with_status(200)
        .with_body(daily_lotto_page(yesterday))
        .create_async()
        .await;

    let (scheduler, store) = scheduler_against(&server).await;
    store
        .create_result(&ScrapedCandidate {
            game_slug: "daily-lotto".to_string(),
            game_name: "Daily Lotto".to_string(),
            winning_numbers: vec![1, 9, 15, 22, 36],
            bonus_number: None,
            draw_date: yesterday,
            next_jackpot: None,
        })
        .await
        .unwrap();

    // The upstream page still shows yesterday's draw; it dedups as a skip
    let summary = scheduler.run_on_demand().await.unwrap();
    assert_eq!(summary.scraped, 1);
    assert_eq!(summary.added, 0);
    assert_eq!(summary.skipped_results.len(), 1);

    // A replay of yesterday must leave today's schedule unsatisfied
    let status = scheduler.status().await.unwrap();
    let daily = status.iter().find(|s| s.game_slug == "daily-lotto").unwrap();
    assert_eq!(daily.last_run_date, None);
    assert_eq!(store.results_for_game("daily-lotto").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_today_dated_page_satisfies_schedule() {
    use lotto_results_scraper::utils::sast_today;

    let today = sast_today();
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/results")
        .with_status(200)
        .with_body(daily_lotto_page(today))
        .create_async()
        .await;

    let (scheduler, _store) = scheduler_against(&server).await;
    let summary = scheduler.run_on_demand().await.unwrap();
    assert_eq!(summary.added, 1);

    let status = scheduler.status().await.unwrap();
    let daily = status.iter().find(|s| s.game_slug == "daily-lotto").unwrap();
    assert_eq!(daily.last_run_date, Some(today));
}

#[tokio::test]
async fn test_status_omits_game_with_invalid_schedule_time() {
    use lotto_results_scraper::types::ScraperSetting;

    let server = mockito::Server::new_async().await;
    let (scheduler, store) = scheduler_against(&server).await;

    store
        .update_setting(ScraperSetting {
            game_slug: "powerball".to_string(),
            is_enabled: true,
            schedule_time: "9pm".to_string(),
            last_scraped_at: None,
        })
        .await
        .unwrap();

    // One bad setting degrades to a per-game omission, not an error
    let status = scheduler.status().await.unwrap();
    assert_eq!(status.len(), 6);
    assert!(status.iter().all(|s| s.game_slug != "powerball"));
}

#[tokio::test]
async fn test_prime_from_storage_marks_today_satisfied() {
    use lotto_results_scraper::types::ScrapedCandidate;
    use lotto_results_scraper::utils::sast_today;

    let server = mockito::Server::new_async().await;
    let (scheduler, store) = scheduler_against(&server).await;

    store
        .create_result(&ScrapedCandidate {
            game_slug: "daily-lotto".to_string(),
            game_name: "Daily Lotto".to_string(),
            winning_numbers: vec![1, 9, 15, 22, 36],
            bonus_number: None,
            draw_date: sast_today(),
            next_jackpot: None,
        })
        .await
        .unwrap();

    scheduler.prime_from_storage().await.unwrap();

    let status = scheduler.status().await.unwrap();
    let daily = status.iter().find(|s| s.game_slug == "daily-lotto").unwrap();
    assert_eq!(daily.last_run_date, Some(sast_today()));
    let powerball = status.iter().find(|s| s.game_slug == "powerball").unwrap();
    assert_eq!(powerball.last_run_date, None);
}
