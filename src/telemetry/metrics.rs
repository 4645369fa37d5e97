//! Metrics recording through the `metrics` facade.
//!
//! No recorder is installed here; the embedding application chooses one.
//! Without a recorder every call is a no-op.

use ::metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

pub const TASKS_DISPATCHED: &str = "youvi_preview_tasks_dispatched_total";
pub const TASKS_COMPLETED: &str = "youvi_preview_tasks_completed_total";
pub const TASKS_DISCARDED: &str = "youvi_preview_tasks_discarded_total";
pub const QUEUE_DEPTH: &str = "youvi_preview_queue_depth";
pub const LOADER_FETCHES: &str = "youvi_loader_fetches_total";
pub const LOADER_CACHE_HITS: &str = "youvi_loader_cache_hits_total";
pub const LOADER_BATCH_SIZE: &str = "youvi_loader_batch_size";

/// Register metric descriptions with the installed recorder.
pub fn init_metrics() {
    describe_counter!(TASKS_DISPATCHED, "Preview tasks handed an execution slot");
    describe_counter!(TASKS_COMPLETED, "Preview tasks finished, labelled by outcome");
    describe_counter!(TASKS_DISCARDED, "Pending preview tasks dropped by a clear");
    describe_gauge!(QUEUE_DEPTH, "Preview tasks waiting for a slot");
    describe_counter!(LOADER_FETCHES, "Per-key fetches, labelled by outcome");
    describe_counter!(LOADER_CACHE_HITS, "Lookups answered from the result cache");
    describe_histogram!(LOADER_BATCH_SIZE, "Keys per flushed batch");
}

pub fn record_task_dispatched() {
    counter!(TASKS_DISPATCHED).increment(1);
}

pub fn record_task_outcome(outcome: &'static str) {
    counter!(TASKS_COMPLETED, "outcome" => outcome).increment(1);
}

pub fn record_tasks_discarded(count: usize) {
    if count > 0 {
        counter!(TASKS_DISCARDED).increment(count as u64);
    }
}

pub fn record_queue_depth(depth: usize) {
    gauge!(QUEUE_DEPTH).set(depth as f64);
}

pub fn record_fetch(outcome: &'static str) {
    counter!(LOADER_FETCHES, "outcome" => outcome).increment(1);
}

pub fn record_cache_hit() {
    counter!(LOADER_CACHE_HITS).increment(1);
}

pub fn record_batch_size(keys: usize) {
    histogram!(LOADER_BATCH_SIZE).record(keys as f64);
}
