use regex::Regex;
use std::sync::OnceLock;

use crate::core::state::{Platform, StudioState};

pub const DEFAULT_CHARACTER_LIMIT: usize = 2200;

pub fn character_limit(platform: Platform) -> usize {
    match platform {
        Platform::Twitter => 280,
        Platform::Instagram => 2200,
        Platform::Facebook => 63206,
        Platform::LinkedIn => 3000,
        _ => DEFAULT_CHARACTER_LIMIT,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentStats {
    pub characters: usize,
    pub words: usize,
    pub lines: usize,
    pub hashtags: usize,
}

impl ContentStats {
    pub fn of(text: &str) -> Self {
        Self {
            characters: text.chars().count(),
            words: text.split_whitespace().count(),
            lines: if text.is_empty() { 0 } else { text.split('\n').count() },
            hashtags: extract_hashtags(text).len(),
        }
    }
}

static HASHTAG_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn hashtag_pattern() -> Option<&'static Regex> {
    HASHTAG_PATTERN
        .get_or_init(|| Regex::new(r"#(\w+)").ok())
        .as_ref()
}

/// Every `#word` run, without the leading `#`.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let Some(pattern) = hashtag_pattern() else {
        return Vec::new();
    };
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|tag| tag.as_str().to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorStatus {
    pub stats: ContentStats,
    pub limit: usize,
    pub counter: String,
    pub over_limit: bool,
    pub warning: Option<String>,
    pub can_publish: bool,
}

impl EditorStatus {
    pub fn evaluate(state: &StudioState) -> Self {
        let stats = ContentStats::of(&state.content);
        let limit = character_limit(state.platform);
        let over_limit = stats.characters > limit;
        let warning =
            over_limit.then(|| format!("Too long for {}", state.platform.display_name()));

        Self {
            counter: format!("{}/{}", stats.characters, limit),
            can_publish: !state.content.trim().is_empty() && !over_limit && !state.is_publishing,
            stats,
            limit,
            over_limit,
            warning,
        }
    }

    pub fn remaining(&self) -> i64 {
        self.limit as i64 - self.stats.characters as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(content: &str, platform: Platform) -> StudioState {
        StudioState {
            content: content.to_string(),
            platform,
            ..Default::default()
        }
    }

    #[test]
    fn test_character_limits() {
        assert_eq!(character_limit(Platform::Twitter), 280);
        assert_eq!(character_limit(Platform::Instagram), 2200);
        assert_eq!(character_limit(Platform::Facebook), 63206);
        assert_eq!(character_limit(Platform::LinkedIn), 3000);
        assert_eq!(character_limit(Platform::YouTube), DEFAULT_CHARACTER_LIMIT);
    }

    #[test]
    fn test_short_tweet_can_publish() {
        let status = EditorStatus::evaluate(&state("Hello world", Platform::Twitter));
        assert_eq!(status.counter, "11/280");
        assert!(!status.over_limit);
        assert!(status.warning.is_none());
        assert!(status.can_publish);
        assert_eq!(status.remaining(), 269);
    }

    #[test]
    fn test_long_tweet_is_blocked() {
        let content = "a".repeat(300);
        let status = EditorStatus::evaluate(&state(&content, Platform::Twitter));
        assert!(status.over_limit);
        assert_eq!(status.warning.as_deref(), Some("Too long for Twitter"));
        assert!(!status.can_publish);

        // Same text fits on LinkedIn.
        let status = EditorStatus::evaluate(&state(&content, Platform::LinkedIn));
        assert!(status.can_publish);
    }

    #[test]
    fn test_blank_or_publishing_cannot_publish() {
        assert!(!EditorStatus::evaluate(&state("  \n ", Platform::Facebook)).can_publish);

        let mut busy = state("ready", Platform::Facebook);
        busy.is_publishing = true;
        assert!(!EditorStatus::evaluate(&busy).can_publish);
    }

    #[test]
    fn test_content_stats() {
        let stats = ContentStats::of("Big news! #launch #rust_lang\nSee you # soon #");
        assert_eq!(stats.words, 9);
        assert_eq!(stats.lines, 2);
        assert_eq!(stats.hashtags, 2);
        assert_eq!(ContentStats::of(""), ContentStats::default());
        assert_eq!(ContentStats::of("café").characters, 4);
    }

    #[test]
    fn test_extract_hashtags() {
        assert_eq!(
            extract_hashtags("#a##b c#d #é!"),
            vec!["a", "b", "d", "é"]
        );
        assert_eq!(
            extract_hashtags("Launch #launch_day #2024, no # tag"),
            vec!["launch_day", "2024"]
        );
        assert!(extract_hashtags("").is_empty());
    }
}
