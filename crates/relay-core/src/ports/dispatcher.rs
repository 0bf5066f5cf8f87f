//! ExecutorDispatcher port - hands an execution request to a worker group.

use async_trait::async_trait;

use crate::domain::{ExecutionRequest, ExecutorType};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no workers registered for group '{0}'")]
    UnknownWorkerGroup(String),

    #[error("executor type {0} is not supported")]
    UnsupportedExecutor(ExecutorType),

    #[error("transport failed: {0}")]
    Transport(String),
}

/// `Ok(true)` means the request was handed off, `Ok(false)` that it was
/// declined. Neither says whether the worker started running the task.
#[async_trait]
pub trait ExecutorDispatcher: Send + Sync {
    async fn dispatch(&self, request: ExecutionRequest) -> Result<bool, DispatchError>;
}
