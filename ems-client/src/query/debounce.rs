//! Debounced search input
//!
//! Keystrokes update the local value at once; the query string is only
//! rewritten after the input has been quiet for the debounce window.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::params::QueryParams;
use crate::history::History;

/// Default quiet period before a search is committed
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Search box bound to the `search` query parameter
pub struct SearchInput<H: History + ?Sized + 'static = dyn History> {
    params: QueryParams<H>,
    delay: Duration,
    shared: Arc<Mutex<SearchText>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Debug, Default)]
struct SearchText {
    /// What the user sees
    local: String,
    /// Last committed value observed
    committed: String,
}

impl<H: History + ?Sized + 'static> SearchInput<H> {
    pub fn new(params: QueryParams<H>, delay: Duration) -> Self {
        let committed = params.search();
        Self {
            params,
            delay,
            shared: Arc::new(Mutex::new(SearchText {
                local: committed.clone(),
                committed,
            })),
            pending: Mutex::new(None),
        }
    }

    /// Local (uncommitted) value
    pub fn value(&self) -> String {
        lock(&self.shared).local.clone()
    }

    /// Whether a commit is scheduled
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Record a keystroke and restart the debounce timer
    ///
    /// Must be called inside a tokio runtime.
    pub fn input(&self, value: &str) {
        lock(&self.shared).local = value.to_string();

        let params = self.params.clone();
        let shared = self.shared.clone();
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut text = lock(&shared);
            if text.local != params.search() {
                tracing::debug!(search = %text.local, "Committing search");
                params.set_search(&text.local);
            }
            text.committed = text.local.clone();
        });

        if let Some(previous) = self.replace_pending(Some(task)) {
            previous.abort();
        }
    }

    /// Pick up a search committed elsewhere (e.g. navigation, reset)
    ///
    /// Returns true when the local value was overwritten.
    pub fn sync_from_query(&self) -> bool {
        let committed = self.params.search();
        let mut text = lock(&self.shared);
        if committed == text.committed {
            return false;
        }
        text.committed = committed.clone();
        text.local = committed;
        true
    }

    /// Cancel any pending commit and clear both values
    pub fn clear(&self) {
        self.cancel();
        let mut text = lock(&self.shared);
        text.local.clear();
        text.committed.clear();
        self.params.set_search("");
    }

    /// Cancel a pending commit, keeping the local value
    pub fn cancel(&self) {
        if let Some(handle) = self.replace_pending(None) {
            handle.abort();
        }
    }

    fn replace_pending(&self, next: Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *pending, next)
    }
}

impl<H: History + ?Sized + 'static> Drop for SearchInput<H> {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn lock(text: &Mutex<SearchText>) -> std::sync::MutexGuard<'_, SearchText> {
    text.lock().unwrap_or_else(PoisonError::into_inner)
}
