//! Debounced autosave scheduling.
//!
//! # Responsibility
//! - Hold the single pending-save task handle for the session.
//! - Cancel and reschedule the handle on every edit (trailing-edge debounce).
//!
//! # Invariants
//! - At most one pending task exists at a time.
//! - A task fires only if no cancel/reschedule happened since it was
//!   scheduled; a generation counter guards timers that already woke up.
//! - Scheduling requires a running tokio runtime.

use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default inactivity window before a pending save fires.
pub const AUTOSAVE_DELAY: Duration = Duration::from_millis(2000);

/// Cancellable single-slot autosave timer.
#[derive(Debug)]
pub struct AutosaveScheduler {
    delay: Duration,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl Default for AutosaveScheduler {
    fn default() -> Self {
        Self::new(AUTOSAVE_DELAY)
    }
}

impl AutosaveScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any pending task with `task`, run after the delay elapses.
    pub fn reschedule<F>(&mut self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let ticket = self.bump();
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        let generation = Arc::clone(&self.generation);
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) == ticket {
                task();
            } else {
                debug!("event=autosave_fire module=autosave status=skipped reason=stale");
            }
        }));
    }

    /// Cancels the pending task, if any.
    ///
    /// Returns whether a not-yet-finished task was cancelled.
    pub fn cancel(&mut self) -> bool {
        self.bump();
        match self.pending.take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    /// Returns whether a scheduled task has not finished yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn bump(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Drop for AutosaveScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
