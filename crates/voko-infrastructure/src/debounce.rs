//! Quiet-period debounced persistence.
//!
//! Repeated view-model mutations within a short window coalesce into a
//! single write of the most recent snapshot. The timer restarts on every
//! mutation (quiet-period debouncing, not periodic flushing), implemented
//! as one cancellable delayed task keyed by a single pending-write handle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use voko_core::persisted::PersistedState;
use voko_core::repository::StateRepository;

/// Default quiet period before a scheduled snapshot is written.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(400);

/// Coalesces rapid state mutations into single best-effort writes.
///
/// Write failures (quota, permissions) are logged and swallowed -
/// persistence is never a hard dependency for continuing the session
/// in memory.
pub struct DebouncedSaver {
    store: Arc<dyn StateRepository>,
    quiet_period: Duration,
    /// Latest snapshot waiting to be written.
    latest: Arc<Mutex<Option<PersistedState>>>,
    /// Cancellation handle of the currently pending delayed write, if any.
    pending: Mutex<Option<CancellationToken>>,
}

impl DebouncedSaver {
    pub fn new(store: Arc<dyn StateRepository>, quiet_period: Duration) -> Self {
        Self {
            store,
            quiet_period,
            latest: Arc::new(Mutex::new(None)),
            pending: Mutex::new(None),
        }
    }

    pub fn with_default_period(store: Arc<dyn StateRepository>) -> Self {
        Self::new(store, DEFAULT_QUIET_PERIOD)
    }

    /// Records `state` as the snapshot to persist and restarts the quiet
    /// period. Earlier snapshots scheduled within the same quiet period are
    /// never separately written.
    pub async fn schedule(&self, state: PersistedState) {
        *self.latest.lock().await = Some(state);

        let token = CancellationToken::new();
        {
            let mut pending = self.pending.lock().await;
            if let Some(previous) = pending.replace(token.clone()) {
                previous.cancel();
            }
        }

        let store = Arc::clone(&self.store);
        let latest = Arc::clone(&self.latest);
        let quiet_period = self.quiet_period;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(quiet_period) => {
                    let snapshot = latest.lock().await.take();
                    if let Some(snapshot) = snapshot {
                        if let Err(err) = store.save(&snapshot).await {
                            warn!("Best-effort state write failed: {err}");
                        }
                    }
                }
            }
        });
    }

    /// Cancels any pending timer and drops the un-written snapshot without
    /// persisting it. Used by factory reset: a mutation scheduled just
    /// before the reset must never land in the freshly-cleared slot, not
    /// even through a later `flush`.
    pub async fn discard(&self) {
        if let Some(token) = self.pending.lock().await.take() {
            token.cancel();
        }
        self.latest.lock().await.take();
    }

    /// Cancels any pending timer and writes the latest snapshot now.
    /// Used on shutdown and after lifecycle operations that must not sit in
    /// the durability window.
    pub async fn flush(&self) {
        if let Some(token) = self.pending.lock().await.take() {
            token.cancel();
        }

        let snapshot = self.latest.lock().await.take();
        if let Some(snapshot) = snapshot {
            if let Err(err) = self.store.save(&snapshot).await {
                warn!("Best-effort state write failed on flush: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use voko_core::error::{Result, VokoError};
    use voko_core::persisted::Language;

    #[derive(Default)]
    struct RecordingStore {
        writes: AtomicUsize,
        last: std::sync::Mutex<Option<PersistedState>>,
        fail: bool,
    }

    #[async_trait]
    impl StateRepository for RecordingStore {
        async fn load(&self) -> Result<Option<PersistedState>> {
            Ok(self.last.lock().unwrap().clone())
        }

        async fn save(&self, state: &PersistedState) -> Result<()> {
            if self.fail {
                return Err(VokoError::storage("disk full"));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(state.clone());
            Ok(())
        }

        async fn clear(&self) -> Result<()> {
            *self.last.lock().unwrap() = None;
            Ok(())
        }
    }

    fn state_with_context(context: &str) -> PersistedState {
        let mut state = PersistedState::new_default(Language::En);
        state.user_context = context.to_string();
        state
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_mutations_coalesce_into_one_write() {
        let store = Arc::new(RecordingStore::default());
        let saver = DebouncedSaver::new(store.clone(), Duration::from_millis(400));

        for n in 0..10 {
            saver.schedule(state_with_context(&format!("v{n}"))).await;
            tokio::time::advance(Duration::from_millis(10)).await;
        }

        tokio::time::advance(Duration::from_millis(500)).await;
        tokio::task::yield_now().await;

        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        let written = store.last.lock().unwrap().clone().unwrap();
        assert_eq!(written.user_context, "v9");
    }

    #[tokio::test(start_paused = true)]
    async fn separate_quiet_periods_write_separately() {
        let store = Arc::new(RecordingStore::default());
        let saver = DebouncedSaver::new(store.clone(), Duration::from_millis(100));

        saver.schedule(state_with_context("first")).await;
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(150)).await;
        tokio::task::yield_now().await;

        saver.schedule(state_with_context("second")).await;
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(150)).await;
        tokio::task::yield_now().await;

        assert_eq!(store.writes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_immediately_and_cancels_the_timer() {
        let store = Arc::new(RecordingStore::default());
        let saver = DebouncedSaver::new(store.clone(), Duration::from_secs(60));

        saver.schedule(state_with_context("pending")).await;
        saver.flush().await;

        assert_eq!(store.writes.load(Ordering::SeqCst), 1);

        // The cancelled timer must not fire a second write later.
        tokio::time::advance(Duration::from_secs(120)).await;
        tokio::task::yield_now().await;
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn discard_drops_the_pending_snapshot() {
        let store = Arc::new(RecordingStore::default());
        let saver = DebouncedSaver::new(store.clone(), Duration::from_millis(100));

        saver.schedule(state_with_context("doomed")).await;
        tokio::task::yield_now().await;
        saver.discard().await;

        tokio::time::advance(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);

        // A later flush must not resurrect the discarded snapshot either.
        saver.flush().await;
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn write_failures_are_swallowed() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let saver = DebouncedSaver::new(store.clone(), Duration::from_millis(50));

        saver.schedule(state_with_context("lost")).await;
        tokio::time::advance(Duration::from_millis(100)).await;
        tokio::task::yield_now().await;
        // No panic, no error surfaced; the session would carry on in memory.
    }
}
