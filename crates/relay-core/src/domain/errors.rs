//! Errors - resolution errors and their operational classification.

use std::num::ParseIntError;

use crate::ports::{DispatchError, QueueError, ServiceError};

use super::ids::{DataSourceId, ProcessInstanceId, ResourceId, TaskInstanceId};
use super::task::TaskType;

/// Operational class of a [`RelayError`], used as a log field.
///
/// - Dependency: a record the task needs does not exist
/// - Transport: the hand-off to a worker failed
/// - Malformed: stored data could not be parsed
/// - Infrastructure: a collaborator or the relay itself misbehaved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Dependency,
    Transport,
    Malformed,
    Infrastructure,
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("task instance {0} not found")]
    TaskInstanceNotFound(TaskInstanceId),

    #[error("task instance {task_instance_id} has no process instance")]
    MissingProcessInstance { task_instance_id: TaskInstanceId },

    #[error("process instance {process_instance_id} has no process definition")]
    MissingProcessDefinition {
        process_instance_id: ProcessInstanceId,
    },

    #[error("data source {0} not found")]
    DataSourceNotFound(DataSourceId),

    #[error("unresolved resources: {0:?}")]
    MissingResources(Vec<ResourceId>),

    #[error("unknown task type '{0}'")]
    UnknownTaskType(String),

    #[error("invalid task json for {task_instance_id}: {source}")]
    InvalidTaskJson {
        task_instance_id: TaskInstanceId,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {task_type} parameters: {source}")]
    InvalidParameters {
        task_type: TaskType,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid udf id '{raw}': {source}")]
    InvalidUdfId {
        raw: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid task reference '{0}'")]
    InvalidTaskReference(String),

    #[error("{expected} relation builder got {actual} parameters")]
    RelationMismatch { expected: TaskType, actual: TaskType },

    #[error("execution context is missing its {0}")]
    IncompleteContext(String),

    #[error("duplicate relation builder for task_type={0}")]
    DuplicateRelation(TaskType),

    #[error("config: {0}")]
    Config(String),

    #[error("command encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl RelayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::TaskInstanceNotFound(_)
            | RelayError::MissingProcessInstance { .. }
            | RelayError::MissingProcessDefinition { .. }
            | RelayError::DataSourceNotFound(_)
            | RelayError::MissingResources(_) => ErrorKind::Dependency,

            RelayError::UnknownTaskType(_)
            | RelayError::InvalidTaskJson { .. }
            | RelayError::InvalidParameters { .. }
            | RelayError::InvalidUdfId { .. }
            | RelayError::InvalidTaskReference(_)
            | RelayError::RelationMismatch { .. } => ErrorKind::Malformed,

            RelayError::Dispatch(_) => ErrorKind::Transport,

            RelayError::IncompleteContext(_)
            | RelayError::DuplicateRelation(_)
            | RelayError::Config(_)
            | RelayError::Encode(_)
            | RelayError::Service(_)
            | RelayError::Queue(_) => ErrorKind::Infrastructure,
        }
    }
}
