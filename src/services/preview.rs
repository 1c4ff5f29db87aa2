use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::core::state::{ContentType, Engagement, MediaType, Platform};
use crate::services::editor::{extract_hashtags, ContentStats};

pub const PLACEHOLDER_TEXT: &str = "Your post will appear here...";
pub const ACCOUNT_NAME: &str = "PostIA.mg";
pub const ACCOUNT_HANDLE: &str = "@postia.mg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformRules {
    pub platform: Platform,
    pub max_chars: usize,
    pub requires_media: bool,
    pub max_media: usize,
    pub max_hashtags: Option<usize>,
    pub allowed: &'static [ContentType],
    /// Characters shown before the "more" fold.
    pub fold_at: Option<usize>,
}

const ALL_TYPES: &[ContentType] = &ContentType::ALL;
const VISUAL_TYPES: &[ContentType] = &[ContentType::Text, ContentType::Image, ContentType::Video];

static RULES: [PlatformRules; 5] = [
    PlatformRules {
        platform: Platform::Instagram,
        max_chars: 2200,
        requires_media: true,
        max_media: 10,
        max_hashtags: Some(30),
        allowed: VISUAL_TYPES,
        fold_at: Some(125),
    },
    PlatformRules {
        platform: Platform::Twitter,
        max_chars: 280,
        requires_media: false,
        max_media: 4,
        max_hashtags: None,
        allowed: ALL_TYPES,
        fold_at: None,
    },
    PlatformRules {
        platform: Platform::Facebook,
        max_chars: 63206,
        requires_media: false,
        max_media: 10,
        max_hashtags: None,
        allowed: ALL_TYPES,
        fold_at: Some(480),
    },
    PlatformRules {
        platform: Platform::LinkedIn,
        max_chars: 3000,
        requires_media: false,
        max_media: 9,
        max_hashtags: None,
        allowed: VISUAL_TYPES,
        fold_at: Some(210),
    },
    PlatformRules {
        platform: Platform::YouTube,
        max_chars: 5000,
        requires_media: true,
        max_media: 1,
        max_hashtags: Some(15),
        allowed: &[ContentType::Video],
        fold_at: Some(100),
    },
];

impl PlatformRules {
    pub fn for_platform(platform: Platform) -> &'static PlatformRules {
        RULES
            .iter()
            .find(|r| r.platform == platform)
            .unwrap_or(&RULES[0])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewIssue {
    TooLong { limit: usize, length: usize },
    MediaRequired,
    TooManyMedia { max: usize, count: usize },
    TooManyHashtags { max: usize, count: usize },
    UnsupportedContentType(ContentType),
}

impl fmt::Display for PreviewIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewIssue::TooLong { limit, length } => {
                write!(f, "Content is {} characters, limit is {}", length, limit)
            }
            PreviewIssue::MediaRequired => write!(f, "This platform requires media"),
            PreviewIssue::TooManyMedia { max, count } => {
                write!(f, "{} media attached, at most {} allowed", count, max)
            }
            PreviewIssue::TooManyHashtags { max, count } => {
                write!(f, "{} hashtags used, at most {} allowed", count, max)
            }
            PreviewIssue::UnsupportedContentType(ct) => {
                write!(f, "Content type '{}' is not supported here", ct)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PreviewInput<'a> {
    pub content: &'a str,
    pub content_type: ContentType,
    pub selected_media: &'a [String],
    pub platform: Platform,
}

pub fn validate(input: &PreviewInput<'_>) -> Vec<PreviewIssue> {
    let rules = PlatformRules::for_platform(input.platform);
    let stats = ContentStats::of(input.content);
    let mut issues = Vec::new();

    if stats.characters > rules.max_chars {
        issues.push(PreviewIssue::TooLong {
            limit: rules.max_chars,
            length: stats.characters,
        });
    }
    if rules.requires_media && input.selected_media.is_empty() {
        issues.push(PreviewIssue::MediaRequired);
    }
    if input.selected_media.len() > rules.max_media {
        issues.push(PreviewIssue::TooManyMedia {
            max: rules.max_media,
            count: input.selected_media.len(),
        });
    }
    if let Some(max) = rules.max_hashtags {
        if stats.hashtags > max {
            issues.push(PreviewIssue::TooManyHashtags {
                max,
                count: stats.hashtags,
            });
        }
    }
    if !rules.allowed.contains(&input.content_type) {
        issues.push(PreviewIssue::UnsupportedContentType(input.content_type));
    }
    issues
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Device {
    #[default]
    Mobile,
    Tablet,
    Desktop,
}

impl Device {
    pub fn frame_width(&self) -> u32 {
        match self {
            Device::Mobile => 375,
            Device::Tablet => 768,
            Device::Desktop => 1200,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Device::Mobile => "Mobile",
            Device::Tablet => "Tablet",
            Device::Desktop => "Desktop",
        };
        write!(f, "{} ({}px)", name, self.frame_width())
    }
}

pub const MIN_ZOOM: u16 = 50;
pub const MAX_ZOOM: u16 = 200;
pub const ZOOM_STEP: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    pub device: Device,
    pub dark_mode: bool,
    zoom: u16,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            device: Device::default(),
            dark_mode: false,
            zoom: 100,
        }
    }
}

impl PreviewOptions {
    pub fn for_device(device: Device) -> Self {
        Self {
            device,
            ..Self::default()
        }
    }

    pub fn zoom(&self) -> u16 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: u16) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom.saturating_add(ZOOM_STEP));
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom.saturating_sub(ZOOM_STEP));
    }

    pub fn toggle_dark_mode(&mut self) {
        self.dark_mode = !self.dark_mode;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSlot {
    pub url: String,
    pub kind: MediaType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewModel {
    pub platform: Platform,
    pub account_name: &'static str,
    pub handle: &'static str,
    pub body: String,
    pub folded: bool,
    pub hashtags: Vec<String>,
    pub media: Vec<MediaSlot>,
    pub engagement: Engagement,
    pub actions: &'static [&'static str],
    pub frame_width: u32,
    pub dark_mode: bool,
    pub issues: Vec<PreviewIssue>,
}

fn actions_for(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Instagram => &["Like", "Comment", "Share", "Save"],
        Platform::Twitter => &["Reply", "Repost", "Like", "Views"],
        Platform::Facebook => &["Like", "Comment", "Share"],
        Platform::LinkedIn => &["Like", "Comment", "Repost", "Send"],
        Platform::YouTube => &["Like", "Dislike", "Share", "Save"],
    }
}

/// Stable per content, so the mock figures do not jump on every render.
fn preview_engagement(platform: Platform, content: &str) -> Engagement {
    let mut hasher = DefaultHasher::new();
    platform.hash(&mut hasher);
    content.hash(&mut hasher);
    let mut rng = StdRng::seed_from_u64(hasher.finish());
    Engagement {
        likes: rng.random_range(50..500),
        shares: rng.random_range(2..60),
        comments: rng.random_range(5..80),
        reach: rng.random_range(1000..10000),
    }
}

fn fold(text: &str, at: Option<usize>) -> (String, bool) {
    match at {
        Some(limit) if text.chars().count() > limit => {
            let cut: String = text.chars().take(limit).collect();
            (format!("{}... more", cut.trim_end()), true)
        }
        _ => (text.to_string(), false),
    }
}

/// Builds the platform mockup and reports validation issues through
/// `on_issues` (called once per render, possibly with an empty list).
pub fn render<F>(input: &PreviewInput<'_>, options: &PreviewOptions, on_issues: F) -> PreviewModel
where
    F: FnOnce(&[PreviewIssue]),
{
    let rules = PlatformRules::for_platform(input.platform);
    let issues = validate(input);
    on_issues(&issues);

    let (body, folded) = if input.content.trim().is_empty() {
        (PLACEHOLDER_TEXT.to_string(), false)
    } else {
        fold(input.content, rules.fold_at)
    };

    let media = input
        .selected_media
        .iter()
        .take(rules.max_media)
        .map(|url| MediaSlot {
            url: url.clone(),
            kind: MediaType::from_file_name(url),
        })
        .collect();

    PreviewModel {
        platform: input.platform,
        account_name: ACCOUNT_NAME,
        handle: ACCOUNT_HANDLE,
        body,
        folded,
        hashtags: extract_hashtags(input.content),
        media,
        engagement: preview_engagement(input.platform, input.content),
        actions: actions_for(input.platform),
        frame_width: options.device.frame_width() * options.zoom() as u32 / 100,
        dark_mode: options.dark_mode,
        issues,
    }
}
