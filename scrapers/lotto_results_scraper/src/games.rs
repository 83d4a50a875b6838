use chrono::Weekday;

/// Static extraction table for the seven games published on the source page.
///
/// `section_matcher` is a case-insensitive regex matched against trimmed
/// heading text. The non-Plus variants anchor with `$` so "Lotto" never
/// swallows the "Lotto Plus 1" heading.
#[derive(Debug, Clone, Copy)]
pub struct GameConfig {
    pub slug: &'static str,
    pub display_name: &'static str,
    pub expected_number_count: usize,
    pub has_bonus_number: bool,
    pub section_matcher: &'static str,
}

pub const GAME_CONFIGS: &[GameConfig] = &[
    GameConfig {
        slug: "lotto",
        display_name: "Lotto",
        expected_number_count: 6,
        has_bonus_number: true,
        section_matcher: r"^lotto(\s+results)?$",
    },
    GameConfig {
        slug: "lotto-plus-1",
        display_name: "Lotto Plus 1",
        expected_number_count: 6,
        has_bonus_number: true,
        section_matcher: r"^lotto\s+plus\s*1(\s+results)?$",
    },
    GameConfig {
        slug: "lotto-plus-2",
        display_name: "Lotto Plus 2",
        expected_number_count: 6,
        has_bonus_number: true,
        section_matcher: r"^lotto\s+plus\s*2(\s+results)?$",
    },
    GameConfig {
        slug: "powerball",
        display_name: "Powerball",
        expected_number_count: 5,
        has_bonus_number: true,
        section_matcher: r"^powerball(\s+results)?$",
    },
    GameConfig {
        slug: "powerball-plus",
        display_name: "Powerball Plus",
        expected_number_count: 5,
        has_bonus_number: true,
        section_matcher: r"^powerball\s+plus(\s+results)?$",
    },
    GameConfig {
        slug: "daily-lotto",
        display_name: "Daily Lotto",
        expected_number_count: 5,
        has_bonus_number: false,
        section_matcher: r"^daily\s+lotto(\s+results)?$",
    },
    GameConfig {
        slug: "daily-lotto-plus",
        display_name: "Daily Lotto Plus",
        expected_number_count: 5,
        has_bonus_number: false,
        section_matcher: r"^daily\s+lotto\s+plus(\s+results)?$",
    },
];

pub fn game_by_slug(slug: &str) -> Option<&'static GameConfig> {
    GAME_CONFIGS.iter().find(|g| g.slug == slug)
}

/// Draw days for each game, used to seed storage on first startup.
pub fn default_draw_days(slug: &str) -> Vec<Weekday> {
    match slug {
        "lotto" | "lotto-plus-1" | "lotto-plus-2" => vec![Weekday::Wed, Weekday::Sat],
        "powerball" | "powerball-plus" => vec![Weekday::Tue, Weekday::Fri],
        // Daily games draw every day of the week
        _ => vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ],
    }
}
