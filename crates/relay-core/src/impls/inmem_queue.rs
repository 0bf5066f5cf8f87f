//! InMemoryTaskQueue - 開発用の優先度キュー
//!
//! - BinaryHeap<Reverse<_>> で最小の TaskReference から取り出す
//! - tokio Mutex + Notify で take() を待たせる（ロックを跨いで await しない）

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use crate::domain::TaskReference;
use crate::ports::{QueueError, TaskQueue};

#[derive(Default)]
struct QueueState {
    heap: BinaryHeap<Reverse<TaskReference>>,
    closed: bool,
}

/// In-memory priority queue.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone, Default)]
pub struct InMemoryTaskQueue {
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
}

impl InMemoryTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts the text form used by upstream writers.
    pub async fn put_encoded(&self, raw: &str) -> Result<(), QueueError> {
        let reference =
            TaskReference::parse(raw).map_err(|_| QueueError::Malformed(raw.to_string()))?;
        self.put(reference).await
    }

    /// Wakes every waiter; later `take()` calls fail with `Closed` once the
    /// queue is drained.
    pub async fn close(&self) {
        self.state.lock().await.closed = true;
        self.notify.notify_waiters();
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn put(&self, reference: TaskReference) -> Result<(), QueueError> {
        {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(QueueError::Closed);
            }
            state.heap.push(Reverse(reference));
        }
        self.notify.notify_one();
        Ok(())
    }

    async fn take(&self) -> Result<TaskReference, QueueError> {
        loop {
            // notified() を先に作っておき、lock 解放後の put を取りこぼさない
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                if let Some(Reverse(reference)) = state.heap.pop() {
                    return Ok(reference);
                }
                if state.closed {
                    return Err(QueueError::Closed);
                }
            }

            notified.await;
        }
    }

    async fn len(&self) -> usize {
        self.state.lock().await.heap.len()
    }
}
