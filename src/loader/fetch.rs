//! Fetch collaborator seam.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FetchError;

/// Resolves one key against the external data source (channel avatars,
/// metadata files).
///
/// `Ok(None)` is a confirmed absence and gets cached. `Err` is transient and
/// does not.
#[async_trait]
pub trait Fetcher<V: Send + 'static>: Send + Sync {
    async fn fetch_one(&self, key: &str) -> Result<Option<V>, FetchError>;
}

/// Adapts an async closure taking the owned key.
pub struct FnFetcher<F> {
    f: F,
}

impl<F> FnFetcher<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<V, F, Fut> Fetcher<V> for FnFetcher<F>
where
    V: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<V>, FetchError>> + Send + 'static,
{
    async fn fetch_one(&self, key: &str) -> Result<Option<V>, FetchError> {
        (self.f)(key.to_string()).await
    }
}

/// Box an async closure as a shareable fetcher.
pub fn fetch_fn<V, F, Fut>(f: F) -> Arc<dyn Fetcher<V>>
where
    V: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<V>, FetchError>> + Send + 'static,
{
    Arc::new(FnFetcher::new(f))
}
