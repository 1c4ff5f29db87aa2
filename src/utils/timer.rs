use futures_util::future::{AbortHandle, Abortable};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[cfg(target_arch = "wasm32")]
pub trait TaskBounds {}
#[cfg(target_arch = "wasm32")]
impl<T> TaskBounds for T {}

#[cfg(not(target_arch = "wasm32"))]
pub trait TaskBounds: Send {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send> TaskBounds for T {}

#[cfg(not(target_arch = "wasm32"))]
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[cfg(target_arch = "wasm32")]
pub async fn sleep(duration: Duration) {
    let millis = duration.as_millis().min(i32::MAX as u128) as i32;
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(future);
}

#[cfg(target_arch = "wasm32")]
fn spawn<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// Single-shot timer. Scheduling again replaces the pending run; dropping
/// the timer cancels it.
#[derive(Default)]
pub struct ScheduledTask {
    handle: Option<AbortHandle>,
    fired: Arc<AtomicBool>,
}

impl ScheduledTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F>(&mut self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + TaskBounds + 'static,
    {
        self.cancel();

        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let (handle, registration) = AbortHandle::new_pair();
        let run = Abortable::new(
            async move {
                sleep(delay).await;
                task.await;
                flag.store(true, Ordering::SeqCst);
            },
            registration,
        );

        spawn(async move {
            let _ = run.await;
        });

        self.handle = Some(handle);
        self.fired = fired;
    }

    /// Returns true when a run was still pending.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let pending = !self.fired.load(Ordering::SeqCst);
                handle.abort();
                pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.is_some() && !self.fired.load(Ordering::SeqCst)
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut task = ScheduledTask::new();

        let c = count.clone();
        task.schedule(Duration::from_secs(3), async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(task.is_pending());

        sleep(Duration::from_millis(2999)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!task.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_cancels_previous() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut task = ScheduledTask::new();

        for _ in 0..3 {
            let c = count.clone();
            task.schedule(Duration::from_secs(3), async move {
                c.fetch_add(1, Ordering::SeqCst);
            });
            sleep(Duration::from_secs(2)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop() {
        let count = Arc::new(AtomicUsize::new(0));

        let mut task = ScheduledTask::new();
        let c = count.clone();
        task.schedule(Duration::from_secs(1), async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(task.cancel());
        assert!(!task.cancel());

        {
            let mut dropped = ScheduledTask::new();
            let c = count.clone();
            dropped.schedule(Duration::from_secs(1), async move {
                c.fetch_add(1, Ordering::SeqCst);
            });
        }

        sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
