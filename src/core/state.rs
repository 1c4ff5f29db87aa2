use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::clock;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Instagram,
    Twitter,
    Facebook,
    LinkedIn,
    YouTube,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Instagram,
        Platform::Twitter,
        Platform::Facebook,
        Platform::LinkedIn,
        Platform::YouTube,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Facebook => "facebook",
            Platform::LinkedIn => "linkedin",
            Platform::YouTube => "youtube",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::Twitter => "Twitter",
            Platform::Facebook => "Facebook",
            Platform::LinkedIn => "LinkedIn",
            Platform::YouTube => "YouTube",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "twitter" | "x" => Ok(Platform::Twitter),
            "facebook" => Ok(Platform::Facebook),
            "linkedin" => Ok(Platform::LinkedIn),
            "youtube" => Ok(Platform::YouTube),
            other => Err(anyhow!("Unknown platform: {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    Image,
    Video,
    Voice,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [
        ContentType::Text,
        ContentType::Image,
        ContentType::Video,
        ContentType::Voice,
    ];
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentType::Text => "text",
            ContentType::Image => "image",
            ContentType::Video => "video",
            ContentType::Voice => "voice",
        };
        f.write_str(s)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Friendly,
    Humorous,
    Inspirational,
}

impl Tone {
    pub const ALL: [Tone; 5] = [
        Tone::Professional,
        Tone::Casual,
        Tone::Friendly,
        Tone::Humorous,
        Tone::Inspirational,
    ];
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Friendly => "friendly",
            Tone::Humorous => "humorous",
            Tone::Inspirational => "inspirational",
        };
        f.write_str(s)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Scheduled,
    Failed,
}

impl PostStatus {
    pub const ALL: [PostStatus; 4] = [
        PostStatus::Published,
        PostStatus::Scheduled,
        PostStatus::Draft,
        PostStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" | "drafts" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "scheduled" => Ok(PostStatus::Scheduled),
            "failed" => Ok(PostStatus::Failed),
            other => Err(anyhow!("Unknown status: {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaType {
    pub fn from_file_name(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "bmp" => MediaType::Image,
            "mp4" | "mov" | "webm" | "avi" | "mkv" => MediaType::Video,
            "mp3" | "wav" | "ogg" | "m4a" | "aac" | "flac" => MediaType::Audio,
            _ => MediaType::Document,
        }
    }
}

/// A file picked in the current session. Its url only lives as long as
/// the session, so it is never written to storage.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaFile {
    pub id: String,
    pub media_type: MediaType,
    pub name: String,
    pub url: String,
    pub size: u64,
}

impl MediaFile {
    pub fn from_selection(name: &str, size: u64, url: &str) -> Result<Self> {
        let parsed = url::Url::parse(url).map_err(|e| anyhow!("Invalid media url {}: {}", url, e))?;
        Ok(Self {
            id: clock::new_id("media"),
            media_type: MediaType::from_file_name(name),
            name: name.to_string(),
            url: parsed.to_string(),
            size,
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Engagement {
    pub likes: u32,
    pub shares: u32,
    pub comments: u32,
    pub reach: u32,
}

impl Engagement {
    pub fn total(&self) -> u64 {
        self.likes as u64 + self.shares as u64 + self.comments as u64
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    pub id: String,
    pub content: String,
    pub content_type: ContentType,
    pub platform: Vec<Platform>,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<Engagement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<Tone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActivePanel {
    #[default]
    Compose,
    Media,
    Assistant,
    Schedule,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StudioView {
    Editor,
    Preview,
    #[default]
    Split,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StudioState {
    pub content: String,
    pub content_type: ContentType,
    pub tone: Tone,
    pub platform: Platform,
    pub schedule_date: String,
    pub selected_media: Vec<String>,
    pub media_files: Vec<MediaFile>,

    pub is_left_panel_collapsed: bool,
    pub is_right_panel_collapsed: bool,
    pub is_preview_fullscreen: bool,
    pub is_preview_detached: bool,
    pub is_recording: bool,
    pub is_publishing: bool,
    pub is_generating: bool,

    pub active_panel: ActivePanel,
    pub current_view: StudioView,
    pub editing_post: Option<PostData>,
}

/// Partial update for [`StudioState`]. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StudioPatch {
    pub content: Option<String>,
    pub content_type: Option<ContentType>,
    pub tone: Option<Tone>,
    pub platform: Option<Platform>,
    pub schedule_date: Option<String>,
    pub selected_media: Option<Vec<String>>,
    pub media_files: Option<Vec<MediaFile>>,

    pub is_left_panel_collapsed: Option<bool>,
    pub is_right_panel_collapsed: Option<bool>,
    pub is_preview_fullscreen: Option<bool>,
    pub is_preview_detached: Option<bool>,
    pub is_recording: Option<bool>,
    pub is_publishing: Option<bool>,
    pub is_generating: Option<bool>,

    pub active_panel: Option<ActivePanel>,
    pub current_view: Option<StudioView>,
    pub editing_post: Option<Option<PostData>>,
}

impl StudioState {
    /// Shallow merge.
    pub fn apply(&mut self, patch: StudioPatch) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = patch.$field {
                    self.$field = value;
                })*
            };
        }

        merge!(
            content,
            content_type,
            tone,
            platform,
            schedule_date,
            selected_media,
            media_files,
            is_left_panel_collapsed,
            is_right_panel_collapsed,
            is_preview_fullscreen,
            is_preview_detached,
            is_recording,
            is_publishing,
            is_generating,
            active_panel,
            current_view,
            editing_post,
        );
    }

    pub fn draft_snapshot(&self) -> DraftRecord {
        DraftRecord {
            content: self.content.clone(),
            platform: self.platform,
            tone: self.tone,
            content_type: self.content_type,
            timestamp: clock::now(),
        }
    }

    /// Fields that make up the persisted draft.
    pub fn draft_fields_eq(&self, other: &StudioState) -> bool {
        self.content == other.content
            && self.platform == other.platform
            && self.tone == other.tone
            && self.content_type == other.content_type
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub content: String,
    pub platform: Platform,
    pub tone: Tone,
    pub content_type: ContentType,
    pub timestamp: DateTime<Utc>,
}
