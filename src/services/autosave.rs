use anyhow::Result;
use log::{debug, error};
use std::sync::Arc;
use std::time::Duration;

use crate::core::io::Storage;
use crate::core::records;
use crate::core::state::{DraftRecord, StudioState};
use crate::utils::clock;
use crate::utils::timer::ScheduledTask;

/// Debounced writer for the `postStudio_draft` record.
pub struct AutoSaver {
    storage: Arc<dyn Storage>,
    delay: Duration,
    task: ScheduledTask,
}

impl AutoSaver {
    pub fn new(storage: Arc<dyn Storage>, delay: Duration) -> Self {
        Self {
            storage,
            delay,
            task: ScheduledTask::new(),
        }
    }

    /// Replaces any pending save. The timestamp is taken when the save runs.
    pub fn schedule(&mut self, state: &StudioState) {
        let mut draft = state.draft_snapshot();
        let storage = self.storage.clone();
        debug!("Auto-save armed for {:?}", self.delay);

        self.task.schedule(self.delay, async move {
            draft.timestamp = clock::now();
            if let Err(e) = records::save(storage.as_ref(), &draft).await {
                error!("Auto-save failed: {:#}", e);
            }
        });
    }

    pub fn cancel(&mut self) -> bool {
        self.task.cancel()
    }

    pub fn is_pending(&self) -> bool {
        self.task.is_pending()
    }

    /// Writes now instead of waiting out the debounce window.
    pub async fn flush(&mut self, state: &StudioState) -> Result<()> {
        self.task.cancel();
        if state.content.trim().is_empty() {
            return Ok(());
        }
        records::save(self.storage.as_ref(), &state.draft_snapshot()).await
    }

    pub async fn load(&self) -> Result<Option<DraftRecord>> {
        records::load::<DraftRecord>(self.storage.as_ref()).await
    }

    pub async fn discard(&mut self) -> Result<()> {
        self.task.cancel();
        records::remove::<DraftRecord>(self.storage.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::MemoryStorage;
    use crate::core::state::Platform;
    use crate::utils::timer::sleep;

    fn state(content: &str) -> StudioState {
        StudioState {
            content: content.to_string(),
            platform: Platform::Facebook,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_saves_after_quiet_period() -> Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        let mut saver = AutoSaver::new(storage.clone(), Duration::from_secs(3));

        saver.schedule(&state("Hel"));
        sleep(Duration::from_secs(1)).await;
        saver.schedule(&state("Hello"));
        sleep(Duration::from_millis(2500)).await;
        assert!(saver.load().await?.is_none(), "no intermediate save");

        sleep(Duration::from_millis(600)).await;
        tokio::task::yield_now().await;

        let saved = saver.load().await?.unwrap();
        assert_eq!(saved.content, "Hello");
        assert_eq!(saved.platform, Platform::Facebook);
        assert!(!saver.is_pending());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_and_discard() -> Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        let mut saver = AutoSaver::new(storage.clone(), Duration::from_secs(3));

        saver.schedule(&state("Pending"));
        saver.flush(&state("Now")).await?;
        assert!(!saver.is_pending());
        assert_eq!(saver.load().await?.unwrap().content, "Now");

        saver.discard().await?;
        assert!(saver.load().await?.is_none());

        // Blank content never produces a draft.
        saver.flush(&state("   ")).await?;
        assert!(saver.load().await?.is_none());
        Ok(())
    }
}
