//! Navigation history
//!
//! The current location (path + query string) of the front end. Query
//! parameter state is derived from it and rewritten through it; the
//! authorization interceptor uses it to send the user to the login page.

use reqwest::Url;
use std::sync::{Mutex, PoisonError};

/// Path of the login entry point
pub const LOGIN_PATH: &str = "/login";

/// Navigation history
pub trait History: Send + Sync {
    /// Current location
    fn location(&self) -> Url;

    /// Replace the current entry (no new history entry)
    fn replace(&self, url: Url);

    /// Navigate to a new entry
    fn push(&self, url: Url);
}

/// In-memory history
#[derive(Debug)]
pub struct MemoryHistory {
    state: Mutex<HistoryState>,
}

#[derive(Debug)]
struct HistoryState {
    current: Url,
    back: Vec<Url>,
    replacements: usize,
}

impl MemoryHistory {
    /// Start at `url`
    pub fn new(url: Url) -> Self {
        Self {
            state: Mutex::new(HistoryState {
                current: url,
                back: Vec::new(),
                replacements: 0,
            }),
        }
    }

    /// Start at `path` (may include a query) under `origin`
    pub fn at(origin: &str, path: &str) -> Result<Self, crate::ClientError> {
        let base = Url::parse(origin).map_err(|e| crate::ClientError::InvalidUrl(e.to_string()))?;
        let url = base
            .join(path)
            .map_err(|e| crate::ClientError::InvalidUrl(e.to_string()))?;
        Ok(Self::new(url))
    }

    /// Number of history entries, current one included
    pub fn depth(&self) -> usize {
        self.lock().back.len() + 1
    }

    /// Number of `replace` calls so far
    pub fn replacements(&self) -> usize {
        self.lock().replacements
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl History for MemoryHistory {
    fn location(&self) -> Url {
        self.lock().current.clone()
    }

    fn replace(&self, url: Url) {
        let mut state = self.lock();
        state.replacements += 1;
        state.current = url;
    }

    fn push(&self, url: Url) {
        tracing::debug!(path = url.path(), "Navigate");
        let mut state = self.lock();
        let previous = std::mem::replace(&mut state.current, url);
        state.back.push(previous);
    }
}

/// Navigate to the login page unless already there
pub fn redirect_to_login(history: &dyn History) {
    let current = history.location();
    if current.path() == LOGIN_PATH {
        return;
    }
    let mut login = current;
    login.set_path(LOGIN_PATH);
    login.set_query(None);
    login.set_fragment(None);
    history.push(login);
}
