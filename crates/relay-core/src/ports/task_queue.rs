//! TaskQueue port - priority queue of ready task references.
//!
//! The relay is one reader among possibly many; writers live upstream.

use async_trait::async_trait;

use crate::domain::TaskReference;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue closed")]
    Closed,

    #[error("queue backend failed: {0}")]
    Backend(String),

    #[error("malformed queue entry '{0}'")]
    Malformed(String),
}

/// Priority queue of [`TaskReference`]s.
///
/// # Contract
/// - `take()` suspends until an item exists and never yields an empty value;
///   the only "nothing" outcome is an error.
/// - the smallest reference (see `TaskReference`'s ordering) is taken first.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn put(&self, reference: TaskReference) -> Result<(), QueueError>;

    async fn take(&self) -> Result<TaskReference, QueueError>;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
