//! Execution context handed to a worker.
//!
//! The context is ephemeral: it is built fresh for one dispatch attempt and
//! dropped after the hand-off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::UdfFunc;
use super::errors::RelayError;
use super::ids::{
    DataSourceId, ProcessDefinitionId, ProcessInstanceId, ProjectId, TaskInstanceId, UserId,
};
use super::task::{ProcessDefinition, ProcessInstance, TaskInstance, TaskType};

/// Resolved resource file names.
///
/// `None` means the task references no resources at all; it is kept apart
/// from an empty list so workers can tell "nothing needed" from "not
/// resolved".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResolvedResources {
    None,
    Names(Vec<String>),
}

impl ResolvedResources {
    pub fn names(&self) -> Option<&[String]> {
        match self {
            ResolvedResources::None => None,
            ResolvedResources::Names(names) => Some(names),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ResolvedResources::None)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlTaskContext {
    pub connection_params: String,
    pub udf_func_list: Vec<UdfFunc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataxTaskContext {
    pub data_source_id: DataSourceId,
    pub source_type: i32,
    pub source_connection_params: String,
    pub data_target_id: DataSourceId,
    pub target_type: i32,
    pub target_connection_params: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureTaskContext {
    pub connection_params: String,
}

/// The single type-specific sub-context of a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TaskRelation {
    /// The task type needs no resolved dependency.
    #[default]
    None,
    Sql(SqlTaskContext),
    Datax(DataxTaskContext),
    Procedure(ProcedureTaskContext),
}

/// Everything a worker needs to run one task instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    // task
    pub task_instance_id: TaskInstanceId,
    pub task_name: String,
    pub task_type: TaskType,
    pub task_json: String,
    pub start_time: Option<DateTime<Utc>>,
    pub host: Option<String>,
    pub log_path: Option<String>,
    pub execute_path: String,
    pub worker_group: String,
    pub resources: ResolvedResources,

    // process instance
    pub process_instance_id: ProcessInstanceId,
    pub tenant_code: String,
    pub queue: String,
    pub executor_id: UserId,
    pub command_type: Option<String>,
    pub schedule_time: Option<DateTime<Utc>>,
    pub global_params: Option<String>,

    // process definition
    pub process_define_id: ProcessDefinitionId,
    pub project_id: ProjectId,

    pub relation: TaskRelation,
}

impl ExecutionContext {
    pub fn sql_context(&self) -> Option<&SqlTaskContext> {
        match &self.relation {
            TaskRelation::Sql(ctx) => Some(ctx),
            _ => None,
        }
    }

    pub fn datax_context(&self) -> Option<&DataxTaskContext> {
        match &self.relation {
            TaskRelation::Datax(ctx) => Some(ctx),
            _ => None,
        }
    }

    pub fn procedure_context(&self) -> Option<&ProcedureTaskContext> {
        match &self.relation {
            TaskRelation::Procedure(ctx) => Some(ctx),
            _ => None,
        }
    }
}

/// Routing facts decided by the resolver before the context is assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct Routing {
    pub tenant_code: String,
    pub queue: String,
    pub execute_path: String,
    pub worker_group: String,
}

/// Step-wise assembly of an [`ExecutionContext`].
///
/// Each step copies the facts of one record; `build()` fails if a required
/// step was skipped.
#[derive(Debug, Default)]
pub struct ExecutionContextBuilder<'a> {
    task: Option<(&'a TaskInstance, TaskType)>,
    process_instance: Option<&'a ProcessInstance>,
    process_definition: Option<&'a ProcessDefinition>,
    routing: Option<Routing>,
    resources: Option<ResolvedResources>,
    relation: TaskRelation,
}

impl<'a> ExecutionContextBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task_instance(mut self, task: &'a TaskInstance, task_type: TaskType) -> Self {
        self.task = Some((task, task_type));
        self
    }

    pub fn process_instance(mut self, process_instance: &'a ProcessInstance) -> Self {
        self.process_instance = Some(process_instance);
        self
    }

    pub fn process_definition(mut self, process_definition: &'a ProcessDefinition) -> Self {
        self.process_definition = Some(process_definition);
        self
    }

    pub fn routing(mut self, routing: Routing) -> Self {
        self.routing = Some(routing);
        self
    }

    pub fn resources(mut self, resources: ResolvedResources) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn relation(mut self, relation: TaskRelation) -> Self {
        self.relation = relation;
        self
    }

    pub fn build(self) -> Result<ExecutionContext, RelayError> {
        let missing = |part: &str| RelayError::IncompleteContext(part.to_string());

        let (task, task_type) = self.task.ok_or_else(|| missing("task instance"))?;
        let process = self
            .process_instance
            .ok_or_else(|| missing("process instance"))?;
        let definition = self
            .process_definition
            .ok_or_else(|| missing("process definition"))?;
        let routing = self.routing.ok_or_else(|| missing("routing"))?;
        let resources = self.resources.ok_or_else(|| missing("resources"))?;

        Ok(ExecutionContext {
            task_instance_id: task.id,
            task_name: task.name.clone(),
            task_type,
            task_json: task.task_json.clone(),
            start_time: task.start_time,
            host: task.host.clone(),
            log_path: task.log_path.clone(),
            execute_path: routing.execute_path,
            worker_group: routing.worker_group,
            resources,

            process_instance_id: process.id,
            tenant_code: routing.tenant_code,
            queue: routing.queue,
            executor_id: process.executor_id,
            command_type: process.command_type.clone(),
            schedule_time: process.schedule_time,
            global_params: process
                .global_params
                .clone()
                .or_else(|| definition.global_params.clone()),

            process_define_id: definition.id,
            project_id: definition.project_id,

            relation: self.relation,
        })
    }
}
