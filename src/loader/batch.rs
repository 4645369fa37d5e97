//! Batch timing and chunking configuration.

use std::time::Duration;

/// Configuration for the batch loader.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Quiet period after the last new key before a batch flushes.
    pub batch_delay: Duration,
    /// Maximum fetches in flight at once within a flush.
    pub parallel_limit: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_delay: Duration::from_millis(50),
            parallel_limit: 5,
        }
    }
}

impl BatchConfig {
    /// Split a flush snapshot into sequential chunks of at most
    /// `parallel_limit` items, preserving order.
    pub fn create_chunks<T>(&self, items: Vec<T>) -> Vec<Vec<T>> {
        let limit = self.parallel_limit.max(1);
        let mut chunks = Vec::with_capacity(items.len().div_ceil(limit));
        let mut current = Vec::with_capacity(limit);

        for item in items {
            if current.len() >= limit {
                chunks.push(std::mem::replace(&mut current, Vec::with_capacity(limit)));
            }
            current.push(item);
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }
}
