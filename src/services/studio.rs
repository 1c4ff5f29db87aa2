use anyhow::Result;
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::core::config::Config;
use crate::core::io::Storage;
use crate::core::state::{
    ActivePanel, ContentType, MediaFile, Platform, PostData, PostStatus, StudioPatch,
    StudioState, StudioView, Tone,
};
use crate::services::autosave::AutoSaver;
use crate::services::editor::{extract_hashtags, EditorStatus};
use crate::services::history::PostHistory;
use crate::services::layout;
use crate::services::notice::{Notice, NoticeLevel};
use crate::services::preview::{self, PreviewInput, PreviewIssue, PreviewModel, PreviewOptions};
use crate::services::publisher::{
    parse_schedule_date, MockPublisher, PublishMode, PublishRequest, Publisher,
};
use crate::utils::clock;
use crate::utils::timer::sleep;

const SCHEDULE_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishKind {
    Now,
    Scheduled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    Published(PostData),
    Scheduled(PostData),
    /// Validation stopped the request before anything changed.
    Rejected(Notice),
    Failed(String),
}

impl PublishOutcome {
    pub fn post(&self) -> Option<&PostData> {
        match self {
            PublishOutcome::Published(post) | PublishOutcome::Scheduled(post) => Some(post),
            _ => None,
        }
    }
}

type Listener = Box<dyn Fn(&StudioState)>;

/// Latest state published by the store, held until the caller is done
/// mutating it. Lets a front-end that keeps the store behind a `RefCell`
/// push the state to its views only after the borrow is released.
#[derive(Clone, Default)]
pub struct PendingState(Rc<RefCell<Option<StudioState>>>);

impl PendingState {
    pub fn take(&self) -> Option<StudioState> {
        self.0.borrow_mut().take()
    }
}

/// Single source of truth for the editor. Every mutation funnels through
/// [`Studio::update_state`].
pub struct Studio {
    config: Config,
    state: StudioState,
    publisher: Arc<dyn Publisher>,
    history: PostHistory,
    autosaver: AutoSaver,
    notices: Vec<Notice>,
    listeners: Vec<Listener>,
    revision: u64,
    mounted: bool,
}

impl Studio {
    pub fn new(config: Config, storage: Arc<dyn Storage>, publisher: Arc<dyn Publisher>) -> Self {
        let state = StudioState {
            platform: config.studio.default_platform,
            tone: config.studio.default_tone,
            content_type: config.studio.default_content_type,
            ..Default::default()
        };
        let history = PostHistory::new(storage.clone(), config.publish.history_cap);
        let autosaver = AutoSaver::new(storage, config.studio.autosave_delay());

        Self {
            config,
            state,
            publisher,
            history,
            autosaver,
            notices: Vec::new(),
            listeners: Vec::new(),
            revision: 0,
            mounted: false,
        }
    }

    pub fn with_mock_publisher(config: Config, storage: Arc<dyn Storage>) -> Self {
        let publisher = Arc::new(MockPublisher::new(config.publish.delay()));
        Self::new(config, storage, publisher)
    }

    pub fn state(&self) -> &StudioState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn history(&self) -> PostHistory {
        self.history.clone()
    }

    pub fn publisher(&self) -> Arc<dyn Publisher> {
        self.publisher.clone()
    }

    pub fn subscribe(&mut self, listener: impl Fn(&StudioState) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Subscribes with a listener that only records the newest state.
    pub fn subscribe_deferred(&mut self) -> PendingState {
        let pending = PendingState::default();
        let slot = pending.0.clone();
        self.subscribe(move |state| *slot.borrow_mut() = Some(state.clone()));
        pending
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => error!("{}: {}", notice.title, notice.message),
            NoticeLevel::Warning => warn!("{}: {}", notice.title, notice.message),
            _ => info!("{}: {}", notice.title, notice.message),
        }
        self.notices.push(notice);
    }

    /// Restores the auto-saved draft. Only the first call does anything.
    pub async fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;

        match self.autosaver.load().await {
            Ok(Some(draft)) => {
                info!("Restoring draft saved at {}", draft.timestamp);
                self.state.apply(StudioPatch {
                    content: Some(draft.content),
                    platform: Some(draft.platform),
                    tone: Some(draft.tone),
                    content_type: Some(draft.content_type),
                    ..Default::default()
                });
                self.revision += 1;
                self.emit();
            }
            Ok(None) => debug!("No saved draft"),
            Err(e) => warn!("Failed to load saved draft: {:#}", e),
        }
    }

    /// Shallow merge. Draft edits re-arm the auto-save timer.
    pub fn update_state(&mut self, patch: StudioPatch) {
        let previous = self.state.clone();
        self.state.apply(patch);
        self.revision += 1;

        let draft_changed = !self.state.draft_fields_eq(&previous);
        if draft_changed {
            if self.state.content.trim().is_empty() {
                self.autosaver.cancel();
            } else {
                self.autosaver.schedule(&self.state);
            }
        }

        self.emit();
    }

    fn emit(&self) {
        for listener in &self.listeners {
            listener(&self.state);
        }
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.update_state(StudioPatch {
            content: Some(content.into()),
            ..Default::default()
        });
    }

    pub fn set_platform(&mut self, platform: Platform) {
        self.update_state(StudioPatch {
            platform: Some(platform),
            ..Default::default()
        });
    }

    pub fn set_tone(&mut self, tone: Tone) {
        self.update_state(StudioPatch {
            tone: Some(tone),
            ..Default::default()
        });
    }

    pub fn set_content_type(&mut self, content_type: ContentType) {
        self.update_state(StudioPatch {
            content_type: Some(content_type),
            ..Default::default()
        });
    }

    pub fn set_schedule_date(&mut self, date: impl Into<String>) {
        self.update_state(StudioPatch {
            schedule_date: Some(date.into()),
            ..Default::default()
        });
    }

    pub fn set_active_panel(&mut self, panel: ActivePanel) {
        self.update_state(StudioPatch {
            active_panel: Some(panel),
            ..Default::default()
        });
    }

    pub fn set_view(&mut self, view: StudioView) {
        self.update_state(StudioPatch {
            current_view: Some(view),
            ..Default::default()
        });
    }

    pub fn toggle_recording(&mut self) {
        self.update_state(StudioPatch {
            is_recording: Some(!self.state.is_recording),
            ..Default::default()
        });
    }

    pub fn toggle_left_panel(&mut self) {
        self.update_state(layout::toggle_left_panel(&self.state));
    }

    pub fn toggle_right_panel(&mut self) {
        self.update_state(layout::toggle_right_panel(&self.state));
    }

    pub fn toggle_preview_fullscreen(&mut self) {
        self.update_state(layout::toggle_preview_fullscreen(&self.state));
    }

    pub fn toggle_preview_detached(&mut self) {
        self.update_state(layout::toggle_preview_detached(&self.state));
    }

    pub fn attach_media(&mut self, file: MediaFile) {
        let mut files = self.state.media_files.clone();
        let mut selected = self.state.selected_media.clone();
        if !selected.contains(&file.url) {
            selected.push(file.url.clone());
        }
        files.push(file);

        self.update_state(StudioPatch {
            media_files: Some(files),
            selected_media: Some(selected),
            ..Default::default()
        });
    }

    pub fn remove_media(&mut self, id: &str) -> bool {
        let Some(file) = self.state.media_files.iter().find(|f| f.id == id).cloned() else {
            return false;
        };
        let files = self
            .state
            .media_files
            .iter()
            .filter(|f| f.id != id)
            .cloned()
            .collect();
        let selected = self
            .state
            .selected_media
            .iter()
            .filter(|url| **url != file.url)
            .cloned()
            .collect();

        self.update_state(StudioPatch {
            media_files: Some(files),
            selected_media: Some(selected),
            ..Default::default()
        });
        true
    }

    /// Loads a stored post into the editor.
    pub fn edit_post(&mut self, post: PostData) {
        let schedule_date = post
            .scheduled_for
            .map(|d| d.format(SCHEDULE_INPUT_FORMAT).to_string())
            .unwrap_or_default();

        self.update_state(StudioPatch {
            content: Some(post.content.clone()),
            content_type: Some(post.content_type),
            platform: Some(post.platform.first().copied().unwrap_or(self.state.platform)),
            tone: Some(post.tone.unwrap_or(self.state.tone)),
            selected_media: Some(post.media.clone().unwrap_or_default()),
            schedule_date: Some(schedule_date),
            editing_post: Some(Some(post)),
            ..Default::default()
        });
    }

    pub fn editor_status(&self) -> EditorStatus {
        EditorStatus::evaluate(&self.state)
    }

    fn preview_input(&self) -> PreviewInput<'_> {
        PreviewInput {
            content: &self.state.content,
            content_type: self.state.content_type,
            selected_media: &self.state.selected_media,
            platform: self.state.platform,
        }
    }

    pub fn preview(&self, options: &PreviewOptions) -> PreviewModel {
        preview::render(&self.preview_input(), options, |issues| {
            for issue in issues {
                debug!("Preview issue on {}: {}", self.state.platform, issue);
            }
        })
    }

    /// Validates and flips `is_publishing`. On rejection nothing changes
    /// apart from the queued notice.
    pub fn begin_publish(&mut self, kind: PublishKind) -> std::result::Result<PublishRequest, Notice> {
        match self.check_publishable(kind) {
            Ok(mode) => {
                let request = PublishRequest::from_state(&self.state, mode);
                self.update_state(StudioPatch {
                    is_publishing: Some(true),
                    ..Default::default()
                });
                Ok(request)
            }
            Err(notice) => {
                self.notify(notice.clone());
                Err(notice)
            }
        }
    }

    fn check_publishable(&self, kind: PublishKind) -> std::result::Result<PublishMode, Notice> {
        if self.state.is_publishing {
            return Err(Notice::warning("Busy", "A post is already being published."));
        }
        if self.state.content.trim().is_empty() {
            return Err(Notice::warning("Empty post", "Write some content before publishing."));
        }

        let mode = match kind {
            PublishKind::Now => PublishMode::Now,
            PublishKind::Scheduled => {
                let raw = self.state.schedule_date.trim();
                if raw.is_empty() {
                    return Err(Notice::warning(
                        "Missing date",
                        "Pick a date and time to schedule this post.",
                    ));
                }
                let when = parse_schedule_date(raw).ok_or_else(|| {
                    Notice::warning("Invalid date", format!("Cannot read schedule date '{}'.", raw))
                })?;
                PublishMode::At(when)
            }
        };

        let status = EditorStatus::evaluate(&self.state);
        if let Some(warning) = status.warning {
            return Err(Notice::warning(&warning, format!("{} characters used.", status.counter)));
        }

        // Length is already bounded by the editor limit above.
        let blocking: Vec<String> = preview::validate(&self.preview_input())
            .into_iter()
            .filter(|issue| !matches!(issue, PreviewIssue::TooLong { .. }))
            .map(|issue| issue.to_string())
            .collect();
        if !blocking.is_empty() {
            return Err(Notice::warning(
                &format!("Not ready for {}", self.state.platform),
                blocking.join(". "),
            ));
        }
        Ok(mode)
    }

    /// The part of a publish that waits on the network. Holds no borrow of
    /// the studio so a UI can run it while staying responsive.
    pub async fn deliver(
        publisher: &dyn Publisher,
        history: &PostHistory,
        request: &PublishRequest,
    ) -> Result<PostData> {
        let post = publisher.publish(request).await?;
        history.record(post.clone()).await?;
        Ok(post)
    }

    pub fn complete_publish(&mut self, result: Result<PostData>) -> PublishOutcome {
        self.update_state(StudioPatch {
            is_publishing: Some(false),
            ..Default::default()
        });

        match result {
            Ok(post) if post.status == PostStatus::Scheduled => {
                let when = post
                    .scheduled_for
                    .map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_default();
                self.notify(Notice::success("Scheduled", format!("Post scheduled for {}.", when)));
                PublishOutcome::Scheduled(post)
            }
            Ok(post) => {
                let targets = post
                    .platform
                    .iter()
                    .map(|p| p.display_name())
                    .collect::<Vec<_>>()
                    .join(", ");
                self.notify(Notice::success("Published", format!("Your post is live on {}.", targets)));
                PublishOutcome::Published(post)
            }
            Err(e) => {
                error!("Publishing failed: {:#}", e);
                self.notify(Notice::error("Publishing failed", "Please try again in a moment."));
                PublishOutcome::Failed(e.to_string())
            }
        }
    }

    pub async fn publish(&mut self) -> Result<PublishOutcome> {
        self.submit(PublishKind::Now).await
    }

    pub async fn schedule(&mut self) -> Result<PublishOutcome> {
        self.submit(PublishKind::Scheduled).await
    }

    async fn submit(&mut self, kind: PublishKind) -> Result<PublishOutcome> {
        let request = match self.begin_publish(kind) {
            Ok(request) => request,
            Err(notice) => return Ok(PublishOutcome::Rejected(notice)),
        };

        let result = Self::deliver(self.publisher.as_ref(), &self.history, &request).await;
        let outcome = self.complete_publish(result);

        if outcome.post().is_some() {
            sleep(self.config.publish.reset_delay()).await;
            self.reset_editor().await?;
        }
        Ok(outcome)
    }

    /// Clears the draft fields and the stored auto-save.
    pub async fn reset_editor(&mut self) -> Result<()> {
        self.update_state(StudioPatch {
            content: Some(String::new()),
            schedule_date: Some(String::new()),
            selected_media: Some(Vec::new()),
            media_files: Some(Vec::new()),
            editing_post: Some(None),
            ..Default::default()
        });
        self.autosaver.discard().await
    }

    /// Keeps the current content in the saved drafts list.
    pub async fn save_draft(&mut self) -> Result<Option<PostData>> {
        if self.state.content.trim().is_empty() {
            self.notify(Notice::warning("Empty draft", "There is nothing to save yet."));
            return Ok(None);
        }

        let id = match &self.state.editing_post {
            Some(post) if post.status == PostStatus::Draft => post.id.clone(),
            _ => clock::new_id("draft"),
        };
        let tags = extract_hashtags(&self.state.content);
        let draft = PostData {
            id,
            content: self.state.content.clone(),
            content_type: self.state.content_type,
            platform: vec![self.state.platform],
            status: PostStatus::Draft,
            created_at: clock::now(),
            published_at: None,
            scheduled_for: None,
            media: (!self.state.selected_media.is_empty()).then(|| self.state.selected_media.clone()),
            engagement: None,
            tone: Some(self.state.tone),
            tags: (!tags.is_empty()).then_some(tags),
        };

        self.history.save_draft(draft.clone()).await?;
        self.notify(Notice::success("Draft saved", "You can find it in your history."));
        Ok(Some(draft))
    }

    pub async fn delete_post(&mut self, id: &str) -> Result<bool> {
        let removed = self.history.delete(id).await?;
        if removed {
            self.notify(Notice::info("Deleted", "The post was removed from your history."));
        }
        Ok(removed)
    }

    /// Writes the pending draft immediately.
    pub async fn flush(&mut self) -> Result<()> {
        self.autosaver.flush(&self.state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::MemoryStorage;
    use crate::core::records::{self, PublishedPosts, DRAFT_KEY, PUBLISHED_POSTS_KEY};
    use crate::core::state::{DraftRecord, Engagement};
    use async_trait::async_trait;
    use std::cell::Cell;
    use std::time::Duration;

    struct FailingPublisher;

    #[async_trait]
    impl Publisher for FailingPublisher {
        async fn publish(&self, _request: &PublishRequest) -> Result<PostData> {
            Err(anyhow::anyhow!("network unreachable"))
        }
    }

    fn studio() -> (Studio, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let studio = Studio::with_mock_publisher(Config::default(), storage.clone());
        (studio, storage)
    }

    fn stored_post(id: &str) -> PostData {
        PostData {
            id: id.to_string(),
            content: "old".to_string(),
            content_type: ContentType::Text,
            platform: vec![Platform::Facebook],
            status: PostStatus::Published,
            created_at: clock::now(),
            published_at: None,
            scheduled_for: None,
            media: None,
            engagement: Some(Engagement::default()),
            tone: None,
            tags: None,
        }
    }

    #[tokio::test]
    async fn test_update_state_is_shallow_merge() {
        let (mut studio, _) = studio();
        let seen = Rc::new(Cell::new(0));
        let counter = seen.clone();
        studio.subscribe(move |_| counter.set(counter.get() + 1));

        studio.toggle_left_panel();
        let before = studio.state().clone();
        studio.update_state(StudioPatch {
            current_view: Some(StudioView::Preview),
            ..Default::default()
        });

        let mut expected = before;
        expected.current_view = StudioView::Preview;
        assert_eq!(studio.state(), &expected);
        assert_eq!(studio.revision(), 2);
        assert_eq!(seen.get(), 2);
    }

    #[tokio::test]
    async fn test_deferred_state_is_read_after_borrow_ends() -> Result<()> {
        let (studio, _) = studio();
        let shared = Rc::new(RefCell::new(studio));
        let pending = shared.borrow_mut().subscribe_deferred();

        shared.borrow_mut().toggle_left_panel();
        shared.borrow_mut().toggle_left_panel();

        // Re-rendering the history panel reads the store while handling the state.
        let state = pending.take().ok_or_else(|| anyhow::anyhow!("no state queued"))?;
        let history = shared.try_borrow()?.history();
        assert!(!state.is_left_panel_collapsed);
        assert!(!history.load_all().await?.is_empty());
        assert!(pending.take().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_mount_restores_draft_once() -> Result<()> {
        let (mut studio, storage) = studio();
        let draft = DraftRecord {
            content: "Saved earlier".to_string(),
            platform: Platform::LinkedIn,
            tone: Tone::Inspirational,
            content_type: ContentType::Image,
            timestamp: clock::now(),
        };
        records::save(storage.as_ref(), &draft).await?;

        studio.mount().await;
        assert_eq!(studio.state().content, "Saved earlier");
        assert_eq!(studio.state().platform, Platform::LinkedIn);
        assert_eq!(studio.state().content_type, ContentType::Image);

        studio.set_content("edited");
        studio.mount().await;
        assert_eq!(studio.state().content, "edited");
        Ok(())
    }

    #[tokio::test]
    async fn test_mount_with_corrupt_draft_keeps_defaults() -> Result<()> {
        let (mut studio, storage) = studio();
        storage.write(DRAFT_KEY, "{\"content\": ").await?;

        studio.mount().await;
        assert_eq!(studio.state(), &StudioState::default());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_debounce() -> Result<()> {
        let (mut studio, storage) = studio();

        studio.set_content("Hel");
        sleep(Duration::from_secs(2)).await;
        studio.set_content("Hello");
        sleep(Duration::from_secs(2)).await;
        assert!(!storage.exists(DRAFT_KEY).await?);

        sleep(Duration::from_millis(1001)).await;
        tokio::task::yield_now().await;

        let saved = records::load::<DraftRecord>(storage.as_ref()).await?.unwrap();
        assert_eq!(saved.content, "Hello");
        assert_eq!(saved.platform, studio.state().platform);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_content_cancels_pending_save() -> Result<()> {
        let (mut studio, storage) = studio();

        studio.set_content("x");
        studio.set_content("");
        sleep(Duration::from_secs(4)).await;
        tokio::task::yield_now().await;

        assert!(!storage.exists(DRAFT_KEY).await?);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_ui_flags_do_not_arm_autosave() -> Result<()> {
        let (mut studio, storage) = studio();
        studio.toggle_right_panel();
        studio.toggle_recording();
        sleep(Duration::from_secs(10)).await;
        assert!(!storage.exists(DRAFT_KEY).await?);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_empty_content_is_rejected() -> Result<()> {
        let (mut studio, storage) = studio();
        studio.set_content("   ");

        let outcome = studio.publish().await?;

        assert!(matches!(outcome, PublishOutcome::Rejected(_)));
        assert!(!studio.state().is_publishing);
        assert!(!storage.exists(PUBLISHED_POSTS_KEY).await?);
        let notices = studio.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_success_flow() -> Result<()> {
        let (mut studio, storage) = studio();
        studio.set_platform(Platform::Twitter);
        studio.set_content("Hello world");
        studio.attach_media(MediaFile::from_selection("a.png", 10, "blob:https://postia.mg/a")?);

        let outcome = studio.publish().await?;
        let post = outcome.post().cloned().unwrap();
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.platform, vec![Platform::Twitter]);

        let stored = studio.history().published().await?;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, post.id);
        let e = stored[0].engagement.unwrap();
        assert!(e.likes < 100);
        assert!((500..1500).contains(&e.reach));

        let state = studio.state();
        assert!(!state.is_publishing);
        assert!(state.content.is_empty());
        assert!(state.selected_media.is_empty());
        assert!(state.media_files.is_empty());
        assert!(!storage.exists(DRAFT_KEY).await?);

        let notices = studio.take_notices();
        assert_eq!(notices.last().map(|n| n.level), Some(NoticeLevel::Success));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_caps_history() -> Result<()> {
        let (mut studio, storage) = studio();
        let existing: Vec<PostData> = (0..50).map(|i| stored_post(&i.to_string())).collect();
        records::save(storage.as_ref(), &PublishedPosts(existing)).await?;

        studio.set_platform(Platform::Facebook);
        studio.set_content("fresh");
        studio.publish().await?;

        let stored = studio.history().published().await?;
        assert_eq!(stored.len(), 50);
        assert_eq!(stored[0].content, "fresh");
        assert_eq!(stored[49].id, "48");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_over_limit_is_rejected() -> Result<()> {
        let (mut studio, storage) = studio();
        studio.set_platform(Platform::Twitter);
        studio.set_content("a".repeat(300));
        assert!(!studio.editor_status().can_publish);

        let outcome = studio.publish().await?;
        match outcome {
            PublishOutcome::Rejected(notice) => assert_eq!(notice.title, "Too long for Twitter"),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!storage.exists(PUBLISHED_POSTS_KEY).await?);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_platform_rules_block_publish() -> Result<()> {
        let (mut studio, storage) = studio();
        studio.set_platform(Platform::Instagram);
        studio.set_content("No picture yet");

        match studio.publish().await? {
            PublishOutcome::Rejected(notice) => {
                assert_eq!(notice.level, NoticeLevel::Warning);
                assert_eq!(notice.title, "Not ready for Instagram");
                assert!(notice.message.contains("requires media"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!studio.state().is_publishing);
        assert!(!storage.exists(PUBLISHED_POSTS_KEY).await?);

        studio.set_platform(Platform::YouTube);
        studio.attach_media(MediaFile::from_selection("clip.mp4", 5, "blob:https://postia.mg/clip")?);
        assert!(matches!(studio.publish().await?, PublishOutcome::Rejected(_)));

        studio.set_content_type(ContentType::Video);
        let outcome = studio.publish().await?;
        assert_eq!(outcome.post().map(|p| p.status), Some(PostStatus::Published));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_requires_date() -> Result<()> {
        let (mut studio, storage) = studio();
        studio.set_platform(Platform::Facebook);
        studio.set_content("Later");

        assert!(matches!(studio.schedule().await?, PublishOutcome::Rejected(_)));
        studio.set_schedule_date("someday");
        assert!(matches!(studio.schedule().await?, PublishOutcome::Rejected(_)));
        assert!(!storage.exists(PUBLISHED_POSTS_KEY).await?);

        studio.set_schedule_date("2030-01-02T08:15");
        let outcome = studio.schedule().await?;
        let post = outcome.post().unwrap();
        assert_eq!(post.status, PostStatus::Scheduled);
        assert!(post.engagement.is_none());
        assert!(studio.state().schedule_date.is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_failure_leaves_storage_untouched() -> Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        let mut studio = Studio::new(Config::default(), storage.clone(), Arc::new(FailingPublisher));
        studio.set_platform(Platform::Facebook);
        studio.set_content("Will fail");

        let outcome = studio.publish().await?;

        assert_eq!(outcome, PublishOutcome::Failed("network unreachable".to_string()));
        assert!(!studio.state().is_publishing);
        assert_eq!(studio.state().content, "Will fail");
        assert!(!storage.exists(PUBLISHED_POSTS_KEY).await?);
        let notices = studio.take_notices();
        assert_eq!(notices[0].level, NoticeLevel::Error);
        Ok(())
    }

    #[tokio::test]
    async fn test_begin_publish_blocks_second_request() {
        let (mut studio, _) = studio();
        studio.set_platform(Platform::Facebook);
        studio.set_content("One");

        assert!(studio.begin_publish(PublishKind::Now).is_ok());
        assert!(studio.state().is_publishing);
        assert!(studio.begin_publish(PublishKind::Now).is_err());

        studio.complete_publish(Err(anyhow::anyhow!("cancelled")));
        assert!(!studio.state().is_publishing);
    }

    #[tokio::test]
    async fn test_detach_while_fullscreen() {
        let (mut studio, _) = studio();
        studio.toggle_preview_fullscreen();
        studio.toggle_preview_detached();
        assert!(studio.state().is_preview_detached);
        assert!(!studio.state().is_preview_fullscreen);
    }

    #[tokio::test]
    async fn test_media_attach_and_remove() -> Result<()> {
        let (mut studio, _) = studio();
        let file = MediaFile::from_selection("clip.mp4", 99, "blob:https://postia.mg/clip")?;
        let id = file.id.clone();

        studio.attach_media(file);
        assert_eq!(studio.state().selected_media, vec!["blob:https://postia.mg/clip"]);

        assert!(studio.remove_media(&id));
        assert!(!studio.remove_media(&id));
        assert!(studio.state().selected_media.is_empty());
        assert!(studio.state().media_files.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_and_edit_draft() -> Result<()> {
        let (mut studio, _) = studio();
        assert!(studio.save_draft().await?.is_none());

        studio.set_content("Idea #one");
        let draft = studio.save_draft().await?.unwrap();
        assert_eq!(draft.tags, Some(vec!["one".to_string()]));

        studio.reset_editor().await?;
        studio.edit_post(draft.clone());
        assert_eq!(studio.state().content, "Idea #one");

        studio.set_content("Idea #one, revised");
        let again = studio.save_draft().await?.unwrap();
        assert_eq!(again.id, draft.id);
        assert_eq!(studio.history().saved_drafts().await?.len(), 1);

        assert!(studio.delete_post(&draft.id).await?);
        assert!(studio.history().saved_drafts().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_preview_uses_current_state() {
        let (mut studio, _) = studio();
        studio.set_platform(Platform::Instagram);
        studio.set_content("Look at this");

        let model = studio.preview(&PreviewOptions::default());
        assert_eq!(model.body, "Look at this");
        assert_eq!(model.issues, vec![preview::PreviewIssue::MediaRequired]);
    }
}
