//! Debounced, de-duplicating batch loader.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::Instrument;

use super::batch::BatchConfig;
use super::cache::{CacheStats, ResultCache};
use super::fetch::Fetcher;
use super::window::{BatchWindow, TimerAction, WindowState};
use crate::error::FetchError;
use crate::telemetry;

type Waiter<V> = oneshot::Sender<Option<V>>;

/// Callers waiting on one key within the current window.
struct PendingLookup<V> {
    /// Arrival order, used to keep chunks in request order.
    sequence: u64,
    waiters: Vec<Waiter<V>>,
}

struct LoaderState<V> {
    cache: ResultCache<V>,
    pending: HashMap<String, PendingLookup<V>>,
    /// Keys whose fetch is running; late callers join these waiters.
    in_flight: HashMap<String, Vec<Waiter<V>>>,
    window: BatchWindow,
    next_sequence: u64,
}

struct LoaderInner<V: Send + 'static> {
    state: Mutex<LoaderState<V>>,
    fetcher: RwLock<Option<Arc<dyn Fetcher<V>>>>,
    config: BatchConfig,
    /// Live `run_window` tasks. At most one outside of teardown.
    timer_tasks: AtomicUsize,
}

/// Coalesces lookups by key into debounced, rate-limited group fetches.
///
/// Every `load` resolves, never fails, and at most one fetch per key runs
/// per window. Results (including confirmed absences) are cached until the
/// caller clears them. Cloning yields another handle to the same loader.
pub struct BatchLoader<V: Send + 'static> {
    inner: Arc<LoaderInner<V>>,
}

impl<V: Send + 'static> Clone for BatchLoader<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> BatchLoader<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(config: BatchConfig, fetcher: Option<Arc<dyn Fetcher<V>>>) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                state: Mutex::new(LoaderState {
                    cache: ResultCache::new(),
                    pending: HashMap::new(),
                    in_flight: HashMap::new(),
                    window: BatchWindow::new(config.batch_delay),
                    next_sequence: 0,
                }),
                fetcher: RwLock::new(fetcher),
                config,
                timer_tasks: AtomicUsize::new(0),
            }),
        }
    }

    /// Wire (or replace) the fetch collaborator. Takes effect at the next flush.
    pub fn set_fetcher(&self, fetcher: Arc<dyn Fetcher<V>>) {
        *self.inner.fetcher.write() = Some(fetcher);
    }

    /// Unwire the fetch collaborator. Later flushes resolve to `None`.
    pub fn take_fetcher(&self) -> Option<Arc<dyn Fetcher<V>>> {
        self.inner.fetcher.write().take()
    }

    pub fn has_fetcher(&self) -> bool {
        self.inner.fetcher.read().is_some()
    }

    /// Resolve `key`, from cache when possible, otherwise via the next batch.
    ///
    /// Must be polled within a Tokio runtime.
    pub async fn load(&self, key: impl Into<String>) -> Option<V> {
        let key = key.into();
        let (rx, start_timer) = {
            let mut state = self.inner.state.lock();
            if let Some(hit) = state.cache.get(&key) {
                telemetry::record_cache_hit();
                return hit.value.clone();
            }

            let (tx, rx) = oneshot::channel();
            let mut start_timer = false;
            if let Some(waiters) = state.in_flight.get_mut(&key) {
                waiters.push(tx);
            } else if let Some(lookup) = state.pending.get_mut(&key) {
                lookup.waiters.push(tx);
            } else {
                let sequence = state.next_sequence;
                state.next_sequence += 1;
                state.pending.insert(
                    key,
                    PendingLookup {
                        sequence,
                        waiters: vec![tx],
                    },
                );
                start_timer = state.window.on_arrival(Instant::now());
            }
            (rx, start_timer)
        };

        if start_timer {
            // The guard travels with the task, so a task dropped before its
            // first poll still releases the window.
            let guard = WindowGuard::new(Arc::clone(&self.inner));
            tokio::spawn(run_window(guard));
        }

        // A dropped sender means the flush was torn down; treat as no data.
        rx.await.unwrap_or(None)
    }

    /// Read the cache without scheduling anything.
    ///
    /// `None` means not cached; `Some(None)` is a cached absence.
    pub fn peek(&self, key: &str) -> Option<Option<V>> {
        self.inner.state.lock().cache.get(key).map(|hit| hit.value.clone())
    }

    /// Drop every cached result.
    pub fn clear_cache(&self) -> usize {
        self.inner.state.lock().cache.clear()
    }

    /// Drop one cached result so the next `load` fetches again.
    pub fn invalidate(&self, key: &str) -> bool {
        self.inner.state.lock().cache.remove(key)
    }

    /// Drop results cached longer than `max_age` ago.
    pub fn evict_older_than(&self, max_age: Duration) -> usize {
        let evicted = self.inner.state.lock().cache.evict_older_than(max_age);
        if evicted > 0 {
            tracing::debug!(evicted, "evicted aged loader cache entries");
        }
        evicted
    }

    pub fn cache_size(&self) -> usize {
        self.inner.state.lock().cache.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.state.lock().cache.stats()
    }

    /// Keys waiting for the current window to close.
    pub fn pending_len(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Keys whose fetch is running right now.
    pub fn in_flight_len(&self) -> usize {
        self.inner.state.lock().in_flight.len()
    }

    pub fn window_state(&self) -> WindowState {
        self.inner.state.lock().window.state()
    }

    /// Number of timer tasks currently driving the window (0 or 1).
    pub fn timer_tasks(&self) -> usize {
        self.inner.timer_tasks.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &BatchConfig {
        &self.inner.config
    }
}

impl<V> Default for BatchLoader<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(BatchConfig::default(), None)
    }
}

/// Single timer task driving the window until it returns to idle.
async fn run_window<V>(mut guard: WindowGuard<V>)
where
    V: Clone + Send + Sync + 'static,
{
    let inner = Arc::clone(&guard.inner);
    loop {
        let action = inner.state.lock().window.on_timer(Instant::now());
        match action {
            TimerAction::Wait(deadline) => tokio::time::sleep_until(deadline).await,
            TimerAction::Flush => {
                let keys = inner.take_snapshot();
                guard.flushing = keys.clone();
                let span = tracing::debug_span!("loader_flush", keys = keys.len());
                inner.flush(keys).instrument(span).await;
                guard.flushing.clear();

                let mut state = inner.state.lock();
                let has_pending = !state.pending.is_empty();
                state.window.on_flush_complete(Instant::now(), has_pending);
                if !has_pending {
                    break;
                }
            }
            TimerAction::Stop => break,
        }
    }
    guard.finished = true;
}

/// Held by the timer task for its whole life. If the task is dropped before
/// finishing (runtime teardown, abort), every waiter it was responsible for
/// resolves to `None` and the window goes back to `Idle`.
struct WindowGuard<V: Send + 'static> {
    inner: Arc<LoaderInner<V>>,
    /// Keys of the flush in progress, still registered in `in_flight`.
    flushing: Vec<String>,
    finished: bool,
}

impl<V: Send + 'static> WindowGuard<V> {
    fn new(inner: Arc<LoaderInner<V>>) -> Self {
        inner.timer_tasks.fetch_add(1, Ordering::SeqCst);
        Self {
            inner,
            flushing: Vec::new(),
            finished: false,
        }
    }
}

impl<V: Send + 'static> Drop for WindowGuard<V> {
    fn drop(&mut self) {
        if !self.finished {
            let (abandoned_in_flight, abandoned_pending) = {
                let mut state = self.inner.state.lock();
                let mut in_flight = 0;
                for key in self.flushing.drain(..) {
                    if state.in_flight.remove(&key).is_some() {
                        in_flight += 1;
                    }
                }
                let pending = state.pending.len();
                state.pending.clear();
                state.window.reset();
                (in_flight, pending)
            };
            tracing::warn!(
                in_flight = abandoned_in_flight,
                pending = abandoned_pending,
                "loader timer task dropped, abandoned lookups resolve to None"
            );
        }
        self.inner.timer_tasks.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<V> LoaderInner<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Move the pending map into the in-flight set, in arrival order.
    fn take_snapshot(&self) -> Vec<String> {
        let mut state = self.state.lock();
        let mut snapshot: Vec<(String, PendingLookup<V>)> = state.pending.drain().collect();
        snapshot.sort_by_key(|(_, lookup)| lookup.sequence);

        let mut keys = Vec::with_capacity(snapshot.len());
        for (key, lookup) in snapshot {
            state.in_flight.insert(key.clone(), lookup.waiters);
            keys.push(key);
        }
        keys
    }

    async fn flush(&self, keys: Vec<String>) {
        telemetry::record_batch_size(keys.len());
        tracing::debug!(keys = keys.len(), "flushing lookup batch");

        let fetcher = self.fetcher.read().clone();
        for chunk in self.config.create_chunks(keys) {
            join_all(chunk.into_iter().map(|key| self.resolve(fetcher.as_deref(), key))).await;
        }
    }

    async fn resolve(&self, fetcher: Option<&dyn Fetcher<V>>, key: String) {
        let outcome = match fetcher {
            Some(fetcher) => AssertUnwindSafe(fetcher.fetch_one(&key))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(FetchError::failed(key.as_str(), "fetcher panicked"))),
            None => Ok(None),
        };

        let (value, cacheable) = match outcome {
            Ok(value) => {
                telemetry::record_fetch(if value.is_some() { "found" } else { "absent" });
                (value, true)
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "lookup fetch failed");
                telemetry::record_fetch(e.kind());
                (None, false)
            }
        };

        let waiters = {
            let mut state = self.state.lock();
            if cacheable {
                state.cache.insert(key.clone(), value.clone());
            }
            state.in_flight.remove(&key).unwrap_or_default()
        };

        for waiter in waiters {
            let _ = waiter.send(value.clone());
        }
    }
}
