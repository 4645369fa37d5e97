//! Hover preview scheduling.
//!
//! Serializes preview work behind an admission limit, orders it by
//! priority, and discards queued work for targets that are no longer hovered.

mod priority;
mod queue;
mod task;

pub use priority::{PrioritizedItem, Priority, PriorityQueue};
pub use queue::{PreviewQueue, PreviewQueueConfig};
pub use task::{PreviewTask, QueueEntry, Subject};
