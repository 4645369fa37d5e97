//! Telemetry: structured logging and metrics.

mod logging;
mod metrics;

pub use self::logging::{init_logging, LogConfig, LogError, LogFormat};
pub use self::metrics::{
    init_metrics, record_batch_size, record_cache_hit, record_fetch, record_queue_depth,
    record_task_dispatched, record_task_outcome, record_tasks_discarded,
};
