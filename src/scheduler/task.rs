//! Preview task and subject types.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use super::priority::Priority;
use crate::error::TaskError;

/// Identity of the target a preview task belongs to (usually the hovered card).
///
/// Two subjects are the same target exactly when they compare equal.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Subject(Arc<str>);

impl Subject {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Subject").field(&&*self.0).finish()
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Subject {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Subject {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

/// A deferred unit of preview work. Nothing runs until the queue calls it.
pub struct PreviewTask(Box<dyn FnOnce() -> BoxFuture<'static, Result<(), TaskError>> + Send>);

impl PreviewTask {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Self(Box::new(move || f().boxed()))
    }

    pub(crate) fn start(self) -> BoxFuture<'static, Result<(), TaskError>> {
        (self.0)()
    }
}

impl fmt::Debug for PreviewTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PreviewTask")
    }
}

/// A task waiting in the queue. Never mutated after creation.
#[derive(Debug)]
pub struct QueueEntry {
    pub id: u64,
    pub task: PreviewTask,
    pub priority: Priority,
    pub subject: Option<Subject>,
}
