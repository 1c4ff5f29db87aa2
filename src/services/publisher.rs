use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use log::info;
use rand::Rng;
use std::time::Duration;

use crate::core::state::{
    ContentType, Engagement, PostData, PostStatus, Platform, StudioState, Tone,
};
use crate::services::editor::extract_hashtags;
use crate::utils::clock;
use crate::utils::timer::sleep;

#[derive(Debug, Clone, PartialEq)]
pub enum PublishMode {
    Now,
    At(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    pub content: String,
    pub content_type: ContentType,
    pub platforms: Vec<Platform>,
    pub tone: Tone,
    pub media: Vec<String>,
    pub mode: PublishMode,
}

impl PublishRequest {
    pub fn from_state(state: &StudioState, mode: PublishMode) -> Self {
        Self {
            content: state.content.clone(),
            content_type: state.content_type,
            platforms: vec![state.platform],
            tone: state.tone,
            media: state.selected_media.clone(),
            mode,
        }
    }
}

/// Accepts RFC 3339 or the `YYYY-MM-DDTHH:MM[:SS]` form a datetime-local
/// input produces (read as UTC).
pub fn parse_schedule_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(target_arch = "wasm32")]
pub trait PublisherBounds {}
#[cfg(target_arch = "wasm32")]
impl<T> PublisherBounds for T {}

#[cfg(not(target_arch = "wasm32"))]
pub trait PublisherBounds: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync> PublisherBounds for T {}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Publisher: PublisherBounds {
    async fn publish(&self, request: &PublishRequest) -> Result<PostData>;
}

/// Pretends to talk to the networks: waits, then invents engagement.
pub struct MockPublisher {
    delay: Duration,
}

impl MockPublisher {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn random_engagement() -> Engagement {
        let mut rng = rand::rng();
        Engagement {
            likes: rng.random_range(0..100),
            shares: rng.random_range(0..50),
            comments: rng.random_range(0..30),
            reach: rng.random_range(500..1500),
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Publisher for MockPublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<PostData> {
        sleep(self.delay).await;

        let now = clock::now();
        let tags = extract_hashtags(&request.content);
        let (status, published_at, scheduled_for, engagement) = match &request.mode {
            PublishMode::Now => (
                PostStatus::Published,
                Some(now),
                None,
                Some(Self::random_engagement()),
            ),
            PublishMode::At(when) => (PostStatus::Scheduled, None, Some(*when), None),
        };

        let post = PostData {
            id: clock::new_id("post"),
            content: request.content.clone(),
            content_type: request.content_type,
            platform: request.platforms.clone(),
            status,
            created_at: now,
            published_at,
            scheduled_for,
            media: (!request.media.is_empty()).then(|| request.media.clone()),
            engagement,
            tone: Some(request.tone),
            tags: (!tags.is_empty()).then_some(tags),
        };
        info!("Mock {:?} post {} to {:?}", post.status, post.id, post.platform);
        Ok(post)
    }
}
