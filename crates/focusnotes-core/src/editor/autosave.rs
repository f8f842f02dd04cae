//! Save timing for draft edits.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::models::NoteId;

/// Idle save delay: save after 2 seconds of no typing
const IDLE_SAVE_MS: u64 = 2000;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(IDLE_SAVE_MS);

/// When an edit reaches the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Only on an explicit save
    Manual,
    /// On every edit
    Immediate,
    /// After the given idle period; each edit restarts the wait
    Debounced(Duration),
}

impl Default for SaveMode {
    fn default() -> Self {
        Self::Debounced(DEFAULT_DEBOUNCE)
    }
}

#[derive(Debug, Default)]
struct SchedulerInner {
    generation: AtomicU64,
    pending: Mutex<Option<(u64, NoteId)>>,
}

impl SchedulerInner {
    fn lock_pending(&self) -> MutexGuard<'_, Option<(u64, NoteId)>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the pending slot for a woken task. Fails once the task has been
    /// replaced or cancelled.
    fn claim(&self, generation: u64) -> bool {
        let mut pending = self.lock_pending();
        let current = self.generation.load(Ordering::SeqCst) == generation
            && pending.as_ref().is_some_and(|(owner, _)| *owner == generation);
        if current {
            *pending = None;
        }
        current
    }
}

/// Runs at most one delayed save at a time.
///
/// Scheduling or cancelling bumps a generation counter; a sleeping task whose
/// generation is no longer current exits without running. A task that has
/// already started its save is left to finish.
#[derive(Debug, Clone, Default)]
pub struct SaveScheduler {
    inner: Arc<SchedulerInner>,
}

impl SaveScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any pending save with `save`, run after `delay`.
    pub fn schedule<F, Fut>(&self, note_id: NoteId, delay: Duration, save: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = {
            let mut pending = self.inner.lock_pending();
            let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *pending = Some((generation, note_id));
            generation
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if !inner.claim(generation) {
                return;
            }
            save().await;
        });
    }

    /// Drop the pending save, if any. Returns the note it was for.
    pub fn cancel(&self) -> Option<NoteId> {
        let mut pending = self.inner.lock_pending();
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        pending.take().map(|(_, note_id)| note_id)
    }

    /// Drop the pending save only if it belongs to `note_id`.
    pub fn cancel_for(&self, note_id: &NoteId) -> bool {
        let mut pending = self.inner.lock_pending();
        if pending.as_ref().is_some_and(|(_, pending_id)| pending_id == note_id) {
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            *pending = None;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn pending_note(&self) -> Option<NoteId> {
        self.inner
            .lock_pending()
            .as_ref()
            .map(|(_, note_id)| note_id.clone())
    }
}
