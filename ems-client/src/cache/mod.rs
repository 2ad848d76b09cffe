//! Remote-data cache
//!
//! Query results keyed by resource + parameters, shared by every view.
//!
//! - fresh data is served without a request
//! - concurrent fetches of one key share a single in-flight request
//! - every request carries the key's generation; a result whose generation
//!   has been superseded (new fetch after invalidation) is not stored
//! - failures keep the last good data

pub mod mutation;

pub use mutation::{Mutation, MutationStatus};

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::{ClientError, ClientResult};

/// Error shared between every caller of one request
pub type SharedError = Arc<ClientError>;

/// Result of a cached query
pub type QueryResult<T> = Result<Arc<T>, SharedError>;

type AnyData = Arc<dyn Any + Send + Sync>;
type FetchOutput = Result<AnyData, SharedError>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutput>>;

const EVENT_CAPACITY: usize = 64;

// ============================================================================
// Keys
// ============================================================================

/// Resource name plus its parameters, e.g. `employees{page=2, search=john}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    resource: String,
    params: BTreeMap<String, String>,
}

impl QueryKey {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.resource)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("}")
    }
}

// ============================================================================
// Config / state
// ============================================================================

/// Cache-wide settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// How long data counts as fresh
    pub stale_time: Duration,
    /// Extra attempts after a failed request
    pub retry: u32,
    /// Optional cap on cached keys
    pub max_entries: Option<usize>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(30),
            retry: 0,
            max_entries: None,
        }
    }
}

/// Per-query overrides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub stale_time: Option<Duration>,
    pub retry: Option<u32>,
}

impl QueryOptions {
    pub fn stale_time(stale_time: Duration) -> Self {
        Self {
            stale_time: Some(stale_time),
            retry: None,
        }
    }
}

/// What a view sees for one key
#[derive(Debug)]
pub struct QueryState<T> {
    pub data: Option<Arc<T>>,
    pub error: Option<SharedError>,
    /// No data yet and a request is running
    pub is_loading: bool,
    /// A request is running
    pub is_fetching: bool,
    pub is_stale: bool,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
            is_fetching: false,
            is_stale: true,
        }
    }
}

/// Cache notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A result was stored (data or error)
    Updated(QueryKey),
    Invalidated(QueryKey),
    Evicted(QueryKey),
}

struct InFlight {
    generation: u64,
    future: SharedFetch,
}

struct Entry {
    data: Option<AnyData>,
    error: Option<SharedError>,
    updated_at: Option<Instant>,
    invalidated: bool,
    stale_time: Duration,
    /// Latest generation handed out for this key
    generation: u64,
    in_flight: Option<InFlight>,
    observers: Arc<AtomicUsize>,
    last_access: u64,
}

impl Entry {
    fn new(stale_time: Duration) -> Self {
        Self {
            data: None,
            error: None,
            updated_at: None,
            invalidated: false,
            stale_time,
            generation: 0,
            in_flight: None,
            observers: Arc::new(AtomicUsize::new(0)),
            last_access: 0,
        }
    }

    fn is_stale(&self, now: Instant) -> bool {
        match (self.data.is_some(), self.updated_at) {
            (true, Some(at)) => self.invalidated || now.duration_since(at) >= self.stale_time,
            _ => true,
        }
    }

    fn evictable(&self) -> bool {
        self.in_flight.is_none() && self.observers.load(Ordering::SeqCst) == 0
    }
}

// ============================================================================
// Query Client
// ============================================================================

/// Shared query cache
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    config: QueryConfig,
    entries: DashMap<QueryKey, Entry>,
    clock: AtomicU64,
    events: broadcast::Sender<CacheEvent>,
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("config", &self.inner.config)
            .field("entries", &self.inner.entries.len())
            .finish()
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}

impl QueryClient {
    pub fn new(config: QueryConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(CacheInner {
                config,
                entries: DashMap::new(),
                clock: AtomicU64::new(0),
                events,
            }),
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.inner.config
    }

    /// Number of cached keys
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.inner.entries.contains_key(key)
    }

    /// Cache notifications
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    /// Fetch with the cache-wide settings
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> QueryResult<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ClientResult<T>> + Send + 'static,
    {
        self.fetch_with(key, QueryOptions::default(), fetcher).await
    }

    /// Fresh data, a running request, or a new request, in that order
    ///
    /// The request runs on its own task: a caller that stops waiting does
    /// not cancel it, and its result is still stored.
    pub async fn fetch_with<T, F, Fut>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        fetcher: F,
    ) -> QueryResult<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ClientResult<T>> + Send + 'static,
    {
        let stale_time = options.stale_time.unwrap_or(self.inner.config.stale_time);
        let retry = options.retry.unwrap_or(self.inner.config.retry);

        let future = {
            let mut entry = self.entry_mut(&key, stale_time);
            entry.stale_time = stale_time;

            if !entry.is_stale(Instant::now()) {
                if let Some(data) = entry.data.clone() {
                    drop(entry);
                    tracing::trace!(key = %key, "Query served from cache");
                    return downcast(&key, data);
                }
            }

            let joined = entry
                .in_flight
                .as_ref()
                .map(|f| (f.generation, f.future.clone()));
            match joined {
                Some((generation, future)) => {
                    tracing::trace!(key = %key, generation, "Joining in-flight query");
                    future
                }
                None => {
                    entry.generation += 1;
                    let generation = entry.generation;
                    let future = self.spawn_request(key.clone(), generation, retry, fetcher);
                    entry.in_flight = Some(InFlight {
                        generation,
                        future: future.clone(),
                    });
                    future
                }
            }
        };

        let data = future.await?;
        downcast(&key, data)
    }

    fn spawn_request<T, F, Fut>(
        &self,
        key: QueryKey,
        generation: u64,
        retry: u32,
        fetcher: F,
    ) -> SharedFetch
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ClientResult<T>> + Send + 'static,
    {
        tracing::debug!(key = %key, generation, "Query request issued");
        let client = self.clone();
        let handle = tokio::spawn(async move {
            let mut attempt = 0;
            let output: FetchOutput = loop {
                match fetcher().await {
                    Ok(value) => break Ok(Arc::new(value) as AnyData),
                    Err(e) if attempt < retry && !e.is_unauthorized() => {
                        attempt += 1;
                        tracing::debug!(key = %key, attempt, error = %e, "Query failed, retrying");
                    }
                    Err(e) => break Err(Arc::new(e)),
                }
            };
            client.settle(&key, generation, &output);
            output
        });

        async move {
            match handle.await {
                Ok(output) => output,
                Err(e) => Err(Arc::new(ClientError::Internal(format!("query task failed: {e}")))),
            }
        }
        .boxed()
        .shared()
    }

    /// Store a result if its generation is still the latest
    fn settle(&self, key: &QueryKey, generation: u64, output: &FetchOutput) {
        {
            let Some(mut entry) = self.inner.entries.get_mut(key) else {
                return;
            };
            if entry.generation != generation {
                tracing::debug!(
                    key = %key,
                    generation,
                    latest = entry.generation,
                    "Discarding superseded query result"
                );
                return;
            }
            if entry
                .in_flight
                .as_ref()
                .is_some_and(|f| f.generation == generation)
            {
                entry.in_flight = None;
            }
            match output {
                Ok(data) => {
                    entry.data = Some(data.clone());
                    entry.error = None;
                    entry.updated_at = Some(Instant::now());
                    entry.invalidated = false;
                }
                Err(e) => {
                    tracing::debug!(key = %key, error = %e, "Query failed");
                    entry.error = Some(e.clone());
                }
            }
        }
        let _ = self.inner.events.send(CacheEvent::Updated(key.clone()));
    }

    /// Current state of a key without fetching
    pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        let Some(entry) = self.inner.entries.get(key) else {
            return QueryState::default();
        };
        let data = entry
            .data
            .clone()
            .and_then(|data| data.downcast::<T>().ok());
        let is_fetching = entry.in_flight.is_some();
        QueryState {
            is_loading: is_fetching && data.is_none(),
            is_fetching,
            is_stale: entry.is_stale(Instant::now()),
            error: entry.error.clone(),
            data,
        }
    }

    /// Mark every key of `resource` stale
    ///
    /// Data stays for display. Running requests are detached: the next
    /// fetch issues a new generation and their results are dropped.
    pub fn invalidate(&self, resource: &str) {
        let mut invalidated = Vec::new();
        for mut entry in self.inner.entries.iter_mut() {
            if entry.key().resource != resource {
                continue;
            }
            entry.invalidated = true;
            if entry.in_flight.take().is_some() {
                entry.generation += 1;
            }
            invalidated.push(entry.key().clone());
        }
        tracing::debug!(resource, keys = invalidated.len(), "Queries invalidated");
        for key in invalidated {
            let _ = self.inner.events.send(CacheEvent::Invalidated(key));
        }
    }

    /// Drop every entry (e.g. when the user changes)
    ///
    /// Running requests still answer their callers but store nothing.
    pub fn clear(&self) {
        let count = self.inner.entries.len();
        self.inner.entries.clear();
        tracing::debug!(keys = count, "Query cache cleared");
    }

    /// Keep a key alive while the guard lives
    pub fn observe(&self, key: &QueryKey) -> QueryObserver {
        let entry = self.entry_mut(key, self.inner.config.stale_time);
        let counter = entry.observers.clone();
        counter.fetch_add(1, Ordering::SeqCst);
        QueryObserver { counter }
    }

    /// Get or create the entry, evicting first when at capacity
    fn entry_mut(
        &self,
        key: &QueryKey,
        stale_time: Duration,
    ) -> dashmap::mapref::one::RefMut<'_, QueryKey, Entry> {
        if !self.inner.entries.contains_key(key) {
            self.evict_for_insert();
        }
        let tick = self.inner.clock.fetch_add(1, Ordering::SeqCst) + 1;
        let mut entry = self
            .inner
            .entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(stale_time));
        entry.last_access = tick;
        entry
    }

    fn evict_for_insert(&self) {
        let Some(max) = self.inner.config.max_entries else {
            return;
        };
        while self.inner.entries.len() >= max.max(1) {
            let victim = self
                .inner
                .entries
                .iter()
                .filter(|e| e.evictable())
                .min_by_key(|e| e.last_access)
                .map(|e| e.key().clone());
            let Some(victim) = victim else {
                return;
            };
            if self
                .inner
                .entries
                .remove_if(&victim, |_, e| e.evictable())
                .is_some()
            {
                tracing::debug!(key = %victim, "Query evicted");
                let _ = self.inner.events.send(CacheEvent::Evicted(victim));
            }
        }
    }
}

/// Subscriber guard; an observed key is never evicted
#[derive(Debug)]
pub struct QueryObserver {
    counter: Arc<AtomicUsize>,
}

impl Drop for QueryObserver {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, data: AnyData) -> QueryResult<T> {
    data.downcast::<T>().map_err(|_| {
        Arc::new(ClientError::InvalidResponse(format!(
            "cached value of {key} has a different type"
        )))
    })
}
