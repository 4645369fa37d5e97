//! Youvi front-end core.
//!
//! The coordination layer behind the video-browsing widgets: everything
//! that has to decide *when* and *how much* asynchronous work runs.
//!
//! - [`scheduler`]: hover preview admission queue. One preview at a time by
//!   default, highest priority first, stale work dropped when the hovered
//!   card changes.
//! - [`loader`]: batch loader for per-key lookups such as channel avatars.
//!   Debounces bursts, fetches in bounded parallel chunks, de-duplicates
//!   callers, and caches outcomes.
//!
//! Rendering, DOM wiring and the fetch implementations themselves live with
//! the caller. Both subsystems absorb every failure: callers see a no-op or
//! `None`, never an error.

pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod scheduler;
pub mod telemetry;

use std::sync::Arc;

use loader::{BatchConfig, BatchLoader, Fetcher};
use scheduler::{PreviewQueue, PreviewQueueConfig};

/// Loader resolving a channel name to its avatar URL.
pub type AvatarLoader = BatchLoader<String>;

/// Runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub preview_queue: PreviewQueueConfig,
    pub batch: BatchConfig,
}

impl From<&config::EnvConfig> for RuntimeConfig {
    fn from(env: &config::EnvConfig) -> Self {
        Self {
            preview_queue: env.preview_queue.clone(),
            batch: env.batch.clone(),
        }
    }
}

/// The page-lifetime set of shared coordination instances.
///
/// Construct once at startup and hand clones of the handles to the widgets
/// that need them.
pub struct Runtime {
    pub preview_queue: PreviewQueue,
    pub avatar_loader: AvatarLoader,
}

impl Runtime {
    /// Create a runtime. The avatar fetcher may be wired later with
    /// [`BatchLoader::set_fetcher`].
    pub fn new(config: RuntimeConfig, avatar_fetcher: Option<Arc<dyn Fetcher<String>>>) -> Self {
        Self {
            preview_queue: PreviewQueue::new(config.preview_queue),
            avatar_loader: BatchLoader::new(config.batch, avatar_fetcher),
        }
    }

    /// Drop queued previews and wait for running ones to finish.
    pub async fn shutdown(&self) {
        let dropped = self.preview_queue.clear();
        tracing::debug!(dropped, "runtime shutting down");
        self.preview_queue.wait_idle().await;
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default(), None)
    }
}
