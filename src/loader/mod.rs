//! Batched lookup loading.
//!
//! Buffers lookups arriving within a short debounce window, fetches them in
//! bounded parallel chunks, shares one fetch among all callers of a key, and
//! caches the outcome.

mod batch;
mod batch_loader;
mod cache;
mod fetch;
mod window;

pub use batch::BatchConfig;
pub use batch_loader::BatchLoader;
pub use cache::{CacheStats, CachedValue, ResultCache};
pub use fetch::{fetch_fn, Fetcher, FnFetcher};
pub use window::{BatchWindow, TimerAction, WindowState};
