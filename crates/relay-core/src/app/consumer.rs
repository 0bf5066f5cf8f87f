//! DispatchConsumer - キューから取り出して解決・配送するループ
//!
//! One consumer is one spawned task. Iterations are strictly sequential: the
//! next reference is taken only after the current one has been resolved and
//! dispatched, or has failed. A failed iteration is logged and the loop moves
//! on; only a stop request ends it.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::{ExecutionRequest, RelayError, TaskReference};
use crate::ports::{ExecutorDispatcher, QueueError, TaskQueue};

use super::resolver::ContextResolver;

/// Pause after a failed `take()` before trying again.
const TAKE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// What one iteration did with its reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The dispatcher accepted the request.
    Dispatched,
    /// The dispatcher declined the request.
    Rejected,
    /// Resolution aborted before dispatch (tenant missing).
    Skipped,
}

pub struct DispatchConsumer {
    queue: Arc<dyn TaskQueue>,
    resolver: ContextResolver,
    dispatcher: Arc<dyn ExecutorDispatcher>,
}

impl DispatchConsumer {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        resolver: ContextResolver,
        dispatcher: Arc<dyn ExecutorDispatcher>,
    ) -> Self {
        Self {
            queue,
            resolver,
            dispatcher,
        }
    }

    /// Resolves and dispatches a single reference.
    pub async fn consume_one(
        &self,
        reference: &TaskReference,
    ) -> Result<DispatchOutcome, RelayError> {
        let Some(context) = self.resolver.resolve(reference).await? else {
            return Ok(DispatchOutcome::Skipped);
        };

        let request = ExecutionRequest::for_worker(&context)?;
        let opaque = request.command.opaque;
        let worker_group = request.worker_group.clone();

        if self.dispatcher.dispatch(request).await? {
            info!(
                task_instance_id = %context.task_instance_id,
                worker_group = %worker_group,
                opaque,
                "task dispatched"
            );
            Ok(DispatchOutcome::Dispatched)
        } else {
            warn!(
                task_instance_id = %context.task_instance_id,
                worker_group = %worker_group,
                opaque,
                "dispatcher declined task"
            );
            Ok(DispatchOutcome::Rejected)
        }
    }

    /// Spawns the loop on the current runtime.
    pub fn start(self) -> ConsumerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(stop_rx));
        ConsumerHandle { stop_tx, join }
    }

    async fn run(self, mut stop_rx: watch::Receiver<bool>) {
        info!("dispatch consumer started");

        loop {
            if *stop_rx.borrow() {
                break;
            }

            // take() は待つので stop と競合させる（取り出し前なら取りこぼしなし）
            let taken = tokio::select! {
                changed = stop_rx.changed() => {
                    if changed.is_err() {
                        // handle dropped
                        break;
                    }
                    continue;
                }
                taken = self.queue.take() => taken,
            };

            let reference = match taken {
                Ok(reference) => reference,
                Err(QueueError::Closed) => {
                    // permanent: park until stopped
                    warn!("task queue closed, waiting for stop");
                    let _ = stop_rx.changed().await;
                    break;
                }
                Err(e) => {
                    error!(error = %e, "failed to take from task queue");
                    tokio::time::sleep(TAKE_RETRY_DELAY).await;
                    continue;
                }
            };

            debug!(task_instance_id = %reference.task_instance_id, "task dequeued");

            // a panicking collaborator fails this iteration, not the loop
            let iteration = AssertUnwindSafe(self.consume_one(&reference))
                .catch_unwind()
                .await;
            match iteration {
                Ok(Ok(outcome)) => {
                    debug!(
                        task_instance_id = %reference.task_instance_id,
                        outcome = ?outcome,
                        "iteration finished"
                    );
                }
                Ok(Err(e)) => {
                    error!(
                        task_instance_id = %reference.task_instance_id,
                        kind = ?e.kind(),
                        error = %e,
                        "dispatch iteration failed"
                    );
                }
                Err(panic) => {
                    error!(
                        task_instance_id = %reference.task_instance_id,
                        panic = panic_message(panic.as_ref()),
                        "dispatch iteration panicked"
                    );
                }
            }
        }

        info!("dispatch consumer stopping");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Handle to a running consumer.
///
/// Dropping the handle also stops the loop.
pub struct ConsumerHandle {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ConsumerHandle {
    /// Asks the loop to stop. An in-flight iteration still completes; no new
    /// reference is taken afterwards.
    pub fn request_stop(&self) {
        // receiver may already be gone
        let _ = self.stop_tx.send(true);
    }

    pub async fn stop_and_join(self) {
        self.request_stop();
        if let Err(e) = self.join.await {
            error!(error = %e, "dispatch consumer panicked");
        }
    }
}
