//! Wire payload handed to the dispatcher.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::context::ExecutionContext;
use super::errors::RelayError;

static NEXT_OPAQUE: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandType {
    TaskExecuteRequest,
}

/// A request frame: a type tag, a process-unique increasing id and a JSON
/// body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub command_type: CommandType,
    pub opaque: u64,
    pub body: String,
}

impl Command {
    pub fn task_execute_request(context: &ExecutionContext) -> Result<Self, RelayError> {
        let body = serde_json::to_string(context).map_err(RelayError::Encode)?;
        Ok(Self {
            command_type: CommandType::TaskExecuteRequest,
            opaque: NEXT_OPAQUE.fetch_add(1, Ordering::Relaxed),
            body,
        })
    }

    /// Decodes the body back into the context it was built from.
    pub fn execution_context(&self) -> Result<ExecutionContext, RelayError> {
        serde_json::from_str(&self.body).map_err(RelayError::Encode)
    }
}

/// Kind of node an execution request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutorType {
    Worker,
    Client,
}

impl fmt::Display for ExecutorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorType::Worker => f.write_str("WORKER"),
            ExecutorType::Client => f.write_str("CLIENT"),
        }
    }
}

/// The command plus its two routing hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub command: Command,
    pub executor_type: ExecutorType,
    pub worker_group: String,
}

impl ExecutionRequest {
    pub fn for_worker(context: &ExecutionContext) -> Result<Self, RelayError> {
        Ok(Self {
            command: Command::task_execute_request(context)?,
            executor_type: ExecutorType::Worker,
            worker_group: context.worker_group.clone(),
        })
    }
}
