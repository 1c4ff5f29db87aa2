use anyhow::Result;
use chrono::{TimeZone, Utc};
use log::{debug, info};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::core::io::Storage;
use crate::core::records::{self, PublishedPosts, SavedDrafts};
use crate::core::state::{
    ContentType, DraftRecord, Engagement, Platform, PostData, PostStatus, Tone,
};

pub const CURRENT_DRAFT_ID: &str = "current-draft";

/// Published posts and saved drafts in storage, newest first, each list
/// capped at `cap` entries.
#[derive(Clone)]
pub struct PostHistory {
    storage: Arc<dyn Storage>,
    cap: usize,
}

impl PostHistory {
    pub fn new(storage: Arc<dyn Storage>, cap: usize) -> Self {
        Self { storage, cap }
    }

    pub async fn published(&self) -> Result<Vec<PostData>> {
        Ok(records::load::<PublishedPosts>(self.storage.as_ref())
            .await?
            .unwrap_or_default()
            .0)
    }

    pub async fn saved_drafts(&self) -> Result<Vec<PostData>> {
        Ok(records::load::<SavedDrafts>(self.storage.as_ref())
            .await?
            .unwrap_or_default()
            .0)
    }

    /// Prepends and drops the oldest entries beyond the cap.
    pub async fn record(&self, post: PostData) -> Result<()> {
        let mut posts = self.published().await?;
        posts.insert(0, post);
        posts.truncate(self.cap);
        debug!("Recording post history ({} entries)", posts.len());
        records::save(self.storage.as_ref(), &PublishedPosts(posts)).await
    }

    pub async fn save_draft(&self, post: PostData) -> Result<()> {
        let mut drafts = self.saved_drafts().await?;
        drafts.retain(|d| d.id != post.id);
        drafts.insert(0, post);
        drafts.truncate(self.cap);
        records::save(self.storage.as_ref(), &SavedDrafts(drafts)).await
    }

    /// Returns whether anything was removed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut removed = false;

        let mut posts = self.published().await?;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() != before {
            records::save(self.storage.as_ref(), &PublishedPosts(posts)).await?;
            removed = true;
        }

        let mut drafts = self.saved_drafts().await?;
        let before = drafts.len();
        drafts.retain(|p| p.id != id);
        if drafts.len() != before {
            records::save(self.storage.as_ref(), &SavedDrafts(drafts)).await?;
            removed = true;
        }

        if removed {
            info!("Deleted post {}", id);
        }
        Ok(removed)
    }

    /// The auto-saved draft, then published posts, saved drafts and the
    /// sample posts; the first occurrence of an id wins.
    pub async fn load_all(&self) -> Result<Vec<PostData>> {
        let mut all = Vec::new();

        if let Some(draft) = records::load::<DraftRecord>(self.storage.as_ref()).await? {
            if !draft.content.trim().is_empty() {
                all.push(draft_as_post(&draft));
            }
        }
        all.extend(self.published().await?);
        all.extend(self.saved_drafts().await?);
        all.extend(sample_posts());

        let mut seen = HashSet::new();
        all.retain(|p| seen.insert(p.id.clone()));
        Ok(all)
    }
}

fn draft_as_post(draft: &DraftRecord) -> PostData {
    PostData {
        id: CURRENT_DRAFT_ID.to_string(),
        content: draft.content.clone(),
        content_type: draft.content_type,
        platform: vec![draft.platform],
        status: PostStatus::Draft,
        created_at: draft.timestamp,
        published_at: None,
        scheduled_for: None,
        media: None,
        engagement: None,
        tone: Some(draft.tone),
        tags: None,
    }
}

pub fn sample_posts() -> Vec<PostData> {
    let at = |d: u32, h: u32| Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).single();
    let post = |id: &str,
                content: &str,
                content_type: ContentType,
                platform: Vec<Platform>,
                status: PostStatus,
                day: u32,
                engagement: Option<Engagement>,
                tags: &[&str]| PostData {
        id: id.to_string(),
        content: content.to_string(),
        content_type,
        platform,
        status,
        created_at: at(day, 9).unwrap_or_default(),
        published_at: (status == PostStatus::Published).then(|| at(day, 10)).flatten(),
        scheduled_for: (status == PostStatus::Scheduled).then(|| at(day + 7, 18)).flatten(),
        media: None,
        engagement,
        tone: Some(Tone::Professional),
        tags: Some(tags.iter().map(|t| t.to_string()).collect()),
    };

    vec![
        post(
            "sample-1",
            "Nouveau: notre studio de contenu est en ligne ! #lancement #ia",
            ContentType::Text,
            vec![Platform::Instagram, Platform::Facebook],
            PostStatus::Published,
            4,
            Some(Engagement { likes: 245, shares: 38, comments: 27, reach: 4200 }),
            &["lancement", "ia"],
        ),
        post(
            "sample-2",
            "5 astuces pour planifier vos publications de la semaine.",
            ContentType::Image,
            vec![Platform::LinkedIn],
            PostStatus::Published,
            8,
            Some(Engagement { likes: 132, shares: 51, comments: 12, reach: 3100 }),
            &["marketing", "productivite"],
        ),
        post(
            "sample-3",
            "Coulisses du tournage de notre prochaine vidéo.",
            ContentType::Video,
            vec![Platform::YouTube],
            PostStatus::Scheduled,
            12,
            None,
            &["video"],
        ),
        post(
            "sample-4",
            "Fil rapide sur les tendances social media de mars.",
            ContentType::Text,
            vec![Platform::Twitter],
            PostStatus::Failed,
            15,
            None,
            &["tendances"],
        ),
        post(
            "sample-5",
            "Idée: série de témoignages clients en format court.",
            ContentType::Text,
            vec![Platform::Instagram],
            PostStatus::Draft,
            18,
            None,
            &["idees"],
        ),
    ]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Engagement,
    Platform,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Newest => "Newest first",
            SortOrder::Oldest => "Oldest first",
            SortOrder::Engagement => "Most engagement",
            SortOrder::Platform => "Platform",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryQuery {
    pub search: String,
    pub status: Option<PostStatus>,
    pub platform: Option<Platform>,
    pub sort: SortOrder,
}

fn engagement_sum(post: &PostData) -> u64 {
    post.engagement.map(|e| e.total()).unwrap_or(0)
}

fn platform_key(post: &PostData) -> &'static str {
    post.platform.first().map(|p| p.as_str()).unwrap_or("")
}

impl HistoryQuery {
    pub fn matches(&self, post: &PostData) -> bool {
        let needle = self.search.trim().to_lowercase();
        let text_match = needle.is_empty()
            || post.content.to_lowercase().contains(&needle)
            || post
                .tags
                .iter()
                .flatten()
                .any(|t| t.to_lowercase().contains(&needle));

        text_match
            && self.status.map_or(true, |s| post.status == s)
            && self.platform.map_or(true, |p| post.platform.contains(&p))
    }

    pub fn apply(&self, posts: &[PostData]) -> Vec<PostData> {
        let mut out: Vec<PostData> = posts.iter().filter(|p| self.matches(p)).cloned().collect();
        match self.sort {
            SortOrder::Newest => out.sort_by_key(|p| Reverse(p.created_at)),
            SortOrder::Oldest => out.sort_by_key(|p| p.created_at),
            SortOrder::Engagement => out.sort_by_key(|p| Reverse(engagement_sum(p))),
            SortOrder::Platform => out.sort_by_key(platform_key),
        }
        out
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistorySummary {
    pub total: usize,
    pub published: usize,
    pub scheduled: usize,
    pub drafts: usize,
    pub failed: usize,
    pub engagement: u64,
    pub reach: u64,
}

impl HistorySummary {
    pub fn of(posts: &[PostData]) -> Self {
        let mut summary = Self {
            total: posts.len(),
            ..Default::default()
        };
        for post in posts {
            match post.status {
                PostStatus::Published => summary.published += 1,
                PostStatus::Scheduled => summary.scheduled += 1,
                PostStatus::Draft => summary.drafts += 1,
                PostStatus::Failed => summary.failed += 1,
            }
            if let Some(e) = post.engagement {
                summary.engagement += e.total();
                summary.reach += e.reach as u64;
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::MemoryStorage;
    use crate::utils::clock;

    fn published(id: &str) -> PostData {
        PostData {
            id: id.to_string(),
            content: format!("post {}", id),
            content_type: ContentType::Text,
            platform: vec![Platform::Twitter],
            status: PostStatus::Published,
            created_at: clock::now(),
            published_at: Some(clock::now()),
            scheduled_for: None,
            media: None,
            engagement: Some(Engagement::default()),
            tone: None,
            tags: None,
        }
    }

    #[tokio::test]
    async fn test_record_prepends_and_caps() -> Result<()> {
        let history = PostHistory::new(Arc::new(MemoryStorage::new()), 50);
        for i in 0..55 {
            history.record(published(&i.to_string())).await?;
        }

        let posts = history.published().await?;
        assert_eq!(posts.len(), 50);
        assert_eq!(posts[0].id, "54");
        assert_eq!(posts[49].id, "5");
        Ok(())
    }

    #[tokio::test]
    async fn test_record_keeps_unversioned_posts() -> Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .write(
                records::PUBLISHED_POSTS_KEY,
                r#"[{"id":"1","content":"old","contentType":"text","platform":["facebook"],"status":"published","createdAt":"2024-03-01T10:00:00Z"}]"#,
            )
            .await?;
        let history = PostHistory::new(storage.clone(), 50);

        assert_eq!(history.published().await?.len(), 1);
        history.record(published("fresh")).await?;

        let posts = history.published().await?;
        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["fresh", "1"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_from_both_lists() -> Result<()> {
        let history = PostHistory::new(Arc::new(MemoryStorage::new()), 10);
        history.record(published("a")).await?;
        let mut draft = published("b");
        draft.status = PostStatus::Draft;
        history.save_draft(draft).await?;

        assert!(history.delete("a").await?);
        assert!(history.delete("b").await?);
        assert!(!history.delete("missing").await?);
        assert!(history.published().await?.is_empty());
        assert!(history.saved_drafts().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_load_all_merges_sources() -> Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        let history = PostHistory::new(storage.clone(), 10);

        history.record(published("p1")).await?;
        let mut shadow = published("sample-1");
        shadow.content = "stored copy".to_string();
        history.record(shadow).await?;

        let draft = DraftRecord {
            content: "half written".to_string(),
            platform: Platform::LinkedIn,
            tone: Tone::Casual,
            content_type: ContentType::Text,
            timestamp: clock::now(),
        };
        records::save(storage.as_ref(), &draft).await?;

        let all = history.load_all().await?;
        assert_eq!(all.len(), 2 + 1 + sample_posts().len() - 1);
        assert_eq!(all[0].id, CURRENT_DRAFT_ID);
        assert_eq!(all[0].status, PostStatus::Draft);

        let sample = all.iter().find(|p| p.id == "sample-1").unwrap();
        assert_eq!(sample.content, "stored copy");
        Ok(())
    }

    #[test]
    fn test_query_filters() {
        let posts = sample_posts();

        let q = HistoryQuery {
            search: "LANCEMENT".to_string(),
            ..Default::default()
        };
        let ids: Vec<_> = q.apply(&posts).into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["sample-1"]);

        // Tag-only match.
        let q = HistoryQuery {
            search: "productivite".to_string(),
            ..Default::default()
        };
        assert_eq!(q.apply(&posts).len(), 1);

        let q = HistoryQuery {
            status: Some(PostStatus::Published),
            platform: Some(Platform::LinkedIn),
            ..Default::default()
        };
        let ids: Vec<_> = q.apply(&posts).into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["sample-2"]);

        let q = HistoryQuery {
            platform: Some(Platform::Facebook),
            ..Default::default()
        };
        assert_eq!(q.apply(&posts).len(), 1);
    }

    #[test]
    fn test_query_sorts() {
        let posts = sample_posts();
        let ids = |sort| -> Vec<String> {
            HistoryQuery { sort, ..Default::default() }
                .apply(&posts)
                .into_iter()
                .map(|p| p.id)
                .collect()
        };

        assert_eq!(ids(SortOrder::Newest)[0], "sample-5");
        assert_eq!(ids(SortOrder::Oldest)[0], "sample-1");
        assert_eq!(&ids(SortOrder::Engagement)[..2], ["sample-1", "sample-2"]);
        assert_eq!(
            ids(SortOrder::Platform),
            vec!["sample-1", "sample-5", "sample-2", "sample-4", "sample-3"]
        );
    }

    #[test]
    fn test_summary() {
        let summary = HistorySummary::of(&sample_posts());
        assert_eq!(summary.total, 5);
        assert_eq!(summary.published, 2);
        assert_eq!(summary.scheduled, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.drafts, 1);
        assert_eq!(summary.engagement, 245 + 38 + 27 + 132 + 51 + 12);
        assert_eq!(summary.reach, 7300);
    }
}
