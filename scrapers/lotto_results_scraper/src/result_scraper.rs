use chrono::NaiveDate;
use regex::Regex;
use scraper::Html;
use tracing::debug;

use crate::games::{GameConfig, GAME_CONFIGS};
use crate::section_extract::{default_extractors, page_lines, SectionExtractor};
use crate::types::ScrapedCandidate;
use crate::utils::sast_today;

/// Parses the fetched results page into per-game candidates.
///
/// Each game is handled independently: a section that fails validation is
/// simply absent from the output for this pass, the scheduler's retry loop
/// is the recovery path for a source that has not published yet.
pub struct ResultScraper {
    extractors: Vec<Box<dyn SectionExtractor>>,
    number_re: Regex,
    bonus_re: Regex,
    date_re: Regex,
    jackpot_re: Regex,
}

impl ResultScraper {
    pub fn new() -> Self {
        Self::with_extractors(default_extractors())
    }

    pub fn with_extractors(extractors: Vec<Box<dyn SectionExtractor>>) -> Self {
        Self {
            extractors,
            number_re: Regex::new(r"^\d{1,2}$").unwrap(),
            // Stray leading backslashes show up in the upstream markup
            bonus_re: Regex::new(r"^\\?\+(\d{1,2})$").unwrap(),
            date_re: Regex::new(r"^(\d{4}-\d{2}-\d{2})").unwrap(),
            jackpot_re: Regex::new(
                r"(?i)(?:estimated\s+jackpot[^:]*|next\s+draw)\s*:\s*(R\s?[\d.,\s]*\d(?:\s*million)?)",
            )
            .unwrap(),
        }
    }

    /// Parse every game section found in the page. Zero or more candidates;
    /// missing dates default to today's SAST calendar date.
    pub fn parse_page(&self, html: &str) -> Vec<ScrapedCandidate> {
        self.parse_page_at(html, sast_today())
    }

    pub fn parse_page_at(&self, html: &str, fallback_date: NaiveDate) -> Vec<ScrapedCandidate> {
        let document = Html::parse_document(html);
        let page_text = page_lines(&document);

        GAME_CONFIGS
            .iter()
            .filter_map(|game| {
                let section = self
                    .extractors
                    .iter()
                    .find_map(|extractor| extractor.extract(&document, &page_text, game))?;
                self.parse_section(&section, game, fallback_date)
            })
            .collect()
    }

    /// Classify each line of a section independently. Winning numbers are
    /// collected in encounter order and capped at the expected count; bonus,
    /// date and jackpot lines are last-match-wins.
    fn parse_section(
        &self,
        section: &str,
        game: &GameConfig,
        fallback_date: NaiveDate,
    ) -> Option<ScrapedCandidate> {
        let mut numbers: Vec<u8> = Vec::new();
        let mut bonus = None;
        let mut draw_date = None;
        let mut next_jackpot = None;

        for line in section.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if self.number_re.is_match(line) {
                if numbers.len() < game.expected_number_count {
                    if let Ok(n) = line.parse() {
                        numbers.push(n);
                    }
                }
                continue;
            }

            if let Some(cap) = self.bonus_re.captures(line) {
                bonus = cap[1].parse().ok();
                continue;
            }

            if let Some(cap) = self.date_re.captures(line) {
                if let Ok(date) = NaiveDate::parse_from_str(&cap[1], "%Y-%m-%d") {
                    draw_date = Some(date);
                }
                continue;
            }

            if let Some(cap) = self.jackpot_re.captures(line) {
                next_jackpot = Some(cap[1].trim().to_string());
            }
        }

        if numbers.len() != game.expected_number_count {
            debug!(
                game = game.slug,
                found = numbers.len(),
                expected = game.expected_number_count,
                "section dropped: winning number count mismatch"
            );
            return None;
        }

        numbers.sort_unstable();

        Some(ScrapedCandidate {
            game_slug: game.slug.to_string(),
            game_name: game.display_name.to_string(),
            winning_numbers: numbers,
            bonus_number: if game.has_bonus_number { bonus } else { None },
            draw_date: draw_date.unwrap_or(fallback_date),
            next_jackpot,
        })
    }
}

impl Default for ResultScraper {
    fn default() -> Self {
        Self::new()
    }
}
