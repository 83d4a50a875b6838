use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::games::GameConfig;

/// Upper bound on the parent-element text length before the extractor falls
/// back to walking following siblings instead.
const PARENT_TEXT_LIMIT: usize = 600;
const SIBLING_WINDOW: usize = 15;
const TEXT_TAIL_CHARS: usize = 500;

/// One strategy for locating a game's result block in the fetched page.
/// Strategies are tried in order; the first hit wins. A structural change
/// upstream only requires a new implementation here, the scheduler and
/// ingestion contracts are untouched.
pub trait SectionExtractor: Send + Sync {
    fn extract(&self, document: &Html, page_text: &str, game: &GameConfig) -> Option<String>;
}

/// Primary strategy: find a heading whose text matches the game's section
/// matcher, then take the surrounding block. If the heading's parent is a
/// compact wrapper its text is used directly, otherwise up to
/// `SIBLING_WINDOW` following sibling nodes are collected.
pub struct HeadingExtractor;

impl SectionExtractor for HeadingExtractor {
    fn extract(&self, document: &Html, _page_text: &str, game: &GameConfig) -> Option<String> {
        let heading_selector = Selector::parse("h1, h2, h3, h4, h5, h6").unwrap();
        let matcher = Regex::new(&format!("(?i){}", game.section_matcher)).ok()?;

        for heading in document.select(&heading_selector) {
            let heading_text = heading.text().collect::<String>();
            if !matcher.is_match(heading_text.trim()) {
                continue;
            }

            if let Some(parent) = heading.parent().and_then(ElementRef::wrap) {
                let parent_text = element_lines(parent);
                if parent_text.len() < PARENT_TEXT_LIMIT {
                    return Some(parent_text);
                }
            }

            return Some(sibling_lines(heading, SIBLING_WINDOW));
        }

        None
    }
}

/// Degraded-mode strategy for markup whose structure has drifted: plain-text
/// search for "{display name} results" plus a bounded tail.
pub struct TextExtractor;

impl SectionExtractor for TextExtractor {
    fn extract(&self, _document: &Html, page_text: &str, game: &GameConfig) -> Option<String> {
        let pattern = Regex::new(&format!(
            r"(?i){}\s+results",
            regex::escape(game.display_name)
        ))
        .ok()?;

        let found = pattern.find(page_text)?;
        let tail = &page_text[found.end()..];
        let cut = tail
            .char_indices()
            .nth(TEXT_TAIL_CHARS)
            .map(|(i, _)| i)
            .unwrap_or(tail.len());
        Some(page_text[found.start()..found.end() + cut].to_string())
    }
}

pub fn default_extractors() -> Vec<Box<dyn SectionExtractor>> {
    vec![Box::new(HeadingExtractor), Box::new(TextExtractor)]
}

/// Text content of an element, one line per text node. The line classifier
/// depends on numbers and labels landing on separate lines even when the
/// markup carries no literal newlines.
pub fn element_lines(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of the whole document in the same one-line-per-text-node form.
pub fn page_lines(document: &Html) -> String {
    element_lines(document.root_element())
}

fn sibling_lines(heading: ElementRef<'_>, window: usize) -> String {
    let mut parts = Vec::new();
    for node in heading.next_siblings().take(window) {
        if let Some(element) = ElementRef::wrap(node) {
            let text = element_lines(element);
            if !text.is_empty() {
                parts.push(text);
            }
        } else if let Some(text) = node.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::game_by_slug;

    const SECTIONED: &str = r#"
        <html><body>
        <section>
            <h2>Powerball Results</h2>
            <p>2025-11-28</p>
            <div class="balls"><span>05</span><span>12</span><span>23</span></div>
        </section>
        <section>
            <h2>Daily Lotto Results</h2>
            <p>2025-11-28</p>
            <div class="balls"><span>01</span><span>02</span></div>
        </section>
        </body></html>
    "#;

    #[test]
    fn test_heading_extractor_uses_short_parent() {
        let document = Html::parse_document(SECTIONED);
        let text = page_lines(&document);
        let game = game_by_slug("powerball").unwrap();

        let section = HeadingExtractor.extract(&document, &text, game).unwrap();
        assert!(section.contains("05"));
        assert!(section.contains("2025-11-28"));
        // The parent section stops before the next game's block
        assert!(!section.contains("Daily Lotto"));
    }

    #[test]
    fn test_heading_extractor_walks_siblings_when_parent_is_large() {
        let padding = "x".repeat(PARENT_TEXT_LIMIT);
        let html = format!(
            r#"<html><body><p>{}</p>
            <h2>Powerball</h2>
            <p>2025-11-28</p>
            <div><span>05</span><span>12</span></div>
            </body></html>"#,
            padding
        );
        let document = Html::parse_document(&html);
        let text = page_lines(&document);
        let game = game_by_slug("powerball").unwrap();

        let section = HeadingExtractor.extract(&document, &text, game).unwrap();
        assert!(section.contains("05"));
        assert!(section.contains("12"));
        assert!(!section.contains(&padding));
    }

    #[test]
    fn test_heading_extractor_misses_absent_game() {
        let document = Html::parse_document(SECTIONED);
        let text = page_lines(&document);
        let game = game_by_slug("lotto").unwrap();
        assert!(HeadingExtractor.extract(&document, &text, game).is_none());
    }

    #[test]
    fn test_text_extractor_finds_unstructured_section() {
        let html = r#"<html><body><div>
            <span>Powerball results</span>
            <span>2025-11-28</span>
            <span>07</span>
        </div></body></html>"#;
        let document = Html::parse_document(html);
        let text = page_lines(&document);
        let game = game_by_slug("powerball").unwrap();

        assert!(HeadingExtractor.extract(&document, &text, game).is_none());
        let section = TextExtractor.extract(&document, &text, game).unwrap();
        assert!(section.contains("07"));
    }

    #[test]
    fn test_text_extractor_bounds_tail() {
        let mut text = "Powerball results\n".to_string();
        text.push_str(&"9\n".repeat(1000));
        let document = Html::parse_document("<html></html>");
        let game = game_by_slug("powerball").unwrap();

        let section = TextExtractor.extract(&document, &text, game).unwrap();
        assert!(section.len() <= "Powerball results".len() + TEXT_TAIL_CHARS + 1);
    }
}
