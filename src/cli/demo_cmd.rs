//! `demo` subcommand: drive both subsystems with a simulated page.
//!
//! A pointer sweeps across a row of cards, queueing preview work for each,
//! while a grid of cards mounts and asks for channel avatars.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;

use crate::error::FetchError;
use crate::loader::{fetch_fn, CacheStats};
use crate::scheduler::{Priority, Subject};
use crate::{Runtime, RuntimeConfig};

/// Outcome of a demo run.
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub cards_hovered: usize,
    pub previews_started: usize,
    pub avatar_requests: usize,
    pub avatar_fetches: usize,
    pub avatars_found: usize,
    pub cache_total: usize,
    pub cache_negative: usize,
}

/// Simulated avatar source: even channels have an avatar, `chan-7` errors.
async fn simulated_avatar(key: String, fetches: Arc<AtomicUsize>) -> Result<Option<String>, FetchError> {
    fetches.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(15)).await;
    let n: usize = key.trim_start_matches("chan-").parse().unwrap_or(1);
    match n {
        7 => Err(FetchError::failed(key, "channel.json unreadable")),
        n if n % 2 == 0 => Ok(Some(format!("blob:avatars/{key}.jpg"))),
        _ => Ok(None),
    }
}

/// Run the simulation with the given configuration.
pub async fn run_demo(config: RuntimeConfig, cards: usize) -> DemoReport {
    let fetches = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fetches);
    let fetcher = fetch_fn(move |key: String| simulated_avatar(key, Arc::clone(&counter)));
    let runtime = Runtime::new(config, Some(fetcher));

    let started = Arc::new(AtomicUsize::new(0));
    for card in 0..cards {
        let subject = Subject::new(format!("card-{card}"));
        for (stage, priority) in [("load", Priority::HIGH), ("play", Priority::NORMAL)] {
            let started = Arc::clone(&started);
            runtime.preview_queue.enqueue_fn(
                move || async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    tracing::debug!(stage, "preview stage running");
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    Ok(())
                },
                priority,
                Some(subject.clone()),
            );
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // Every card in the grid asks for its avatar; channels repeat.
    let requests: Vec<String> = (0..cards * 2).map(|i| format!("chan-{}", i % cards.max(1))).collect();
    let avatar_requests = requests.len();
    let loader = &runtime.avatar_loader;
    let results = join_all(requests.into_iter().map(|key| loader.load(key))).await;

    runtime.shutdown().await;

    let CacheStats { total, negative, .. } = loader.cache_stats();
    DemoReport {
        cards_hovered: cards,
        previews_started: started.load(Ordering::SeqCst),
        avatar_requests,
        avatar_fetches: fetches.load(Ordering::SeqCst),
        avatars_found: results.iter().filter(|r| r.is_some()).count(),
        cache_total: total,
        cache_negative: negative,
    }
}
