//! Task run records as the relay reads them from the dependency service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::RelayError;
use super::ids::{
    ProcessDefinitionId, ProcessInstanceId, ProjectId, TaskInstanceId, TenantId, UserId,
};

/// Task type tag stored on every task instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    Shell,
    Python,
    Sql,
    Procedure,
    Datax,
    Spark,
    Flink,
    Mr,
    Http,
    Sqoop,
    Dependent,
    SubProcess,
    Conditions,
}

impl TaskType {
    pub const ALL: [TaskType; 13] = [
        TaskType::Shell,
        TaskType::Python,
        TaskType::Sql,
        TaskType::Procedure,
        TaskType::Datax,
        TaskType::Spark,
        TaskType::Flink,
        TaskType::Mr,
        TaskType::Http,
        TaskType::Sqoop,
        TaskType::Dependent,
        TaskType::SubProcess,
        TaskType::Conditions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Shell => "SHELL",
            TaskType::Python => "PYTHON",
            TaskType::Sql => "SQL",
            TaskType::Procedure => "PROCEDURE",
            TaskType::Datax => "DATAX",
            TaskType::Spark => "SPARK",
            TaskType::Flink => "FLINK",
            TaskType::Mr => "MR",
            TaskType::Http => "HTTP",
            TaskType::Sqoop => "SQOOP",
            TaskType::Dependent => "DEPENDENT",
            TaskType::SubProcess => "SUB_PROCESS",
            TaskType::Conditions => "CONDITIONS",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RelayError::UnknownTaskType(s.to_string()))
    }
}

/// Run status of a task instance, numbered the way the scheduler stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    SubmittedSuccess,
    RunningExecution,
    ReadyPause,
    Pause,
    ReadyStop,
    Stop,
    Failure,
    Success,
    NeedFaultTolerance,
    Kill,
    WaitingThread,
    WaitingDepend,
    DelayExecution,
}

impl ExecutionStatus {
    /// No further transitions are expected from a finished status.
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            ExecutionStatus::Success
                | ExecutionStatus::Failure
                | ExecutionStatus::Kill
                | ExecutionStatus::Stop
                | ExecutionStatus::Pause
        )
    }
}

/// Priority shared by workflows and tasks. Lower ordinal runs first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Highest,
    High,
    #[default]
    Medium,
    Low,
    Lowest,
}

impl Priority {
    pub fn code(self) -> u8 {
        match self {
            Priority::Highest => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
            Priority::Lowest => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Priority::Highest),
            1 => Some(Priority::High),
            2 => Some(Priority::Medium),
            3 => Some(Priority::Low),
            4 => Some(Priority::Lowest),
            _ => None,
        }
    }
}

/// Parent workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDefinition {
    pub id: ProcessDefinitionId,
    pub project_id: ProjectId,
    /// Owning user; used for tenant lookup when the instance has no tenant.
    pub user_id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub global_params: Option<String>,
}

/// Parent workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInstance {
    pub id: ProcessInstanceId,
    pub process_definition_id: ProcessDefinitionId,
    /// A negative id means "use the owning user's tenant".
    #[serde(default = "ProcessInstance::unset_tenant")]
    pub tenant_id: TenantId,
    pub executor_id: UserId,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub command_type: Option<String>,
    #[serde(default)]
    pub schedule_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub global_params: Option<String>,
}

impl ProcessInstance {
    fn unset_tenant() -> TenantId {
        TenantId::new(-1)
    }
}

/// One task run record.
///
/// `process_instance` and `process_definition` are only populated by the
/// detail lookup; plain listings leave them empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInstance {
    pub id: TaskInstanceId,
    pub name: String,
    /// Raw type tag; parsed into [`TaskType`] during resolution.
    pub task_type: String,
    /// Serialized task node (type, params, worker group).
    pub task_json: String,
    pub process_instance_id: ProcessInstanceId,
    pub process_definition_id: ProcessDefinitionId,
    pub state: ExecutionStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub submit_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub worker_group: Option<String>,
    #[serde(default)]
    pub log_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_instance: Option<ProcessInstance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_definition: Option<ProcessDefinition>,
}

impl TaskInstance {
    pub fn task_type(&self) -> Result<TaskType, RelayError> {
        self.task_type.parse()
    }
}

/// Status update requested when a task cannot be handed off.
///
/// `execute_path` and `log_path` are reserved output fields and stay empty
/// when the relay writes the update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStateChange {
    pub task_instance_id: TaskInstanceId,
    pub status: ExecutionStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub host: Option<String>,
    pub execute_path: Option<String>,
    pub log_path: Option<String>,
}

impl TaskStateChange {
    /// Terminal failure that keeps the task's current start time and host.
    pub fn failure(task: &TaskInstance) -> Self {
        Self {
            task_instance_id: task.id,
            status: ExecutionStatus::Failure,
            start_time: task.start_time,
            host: task.host.clone(),
            execute_path: None,
            log_path: None,
        }
    }
}
