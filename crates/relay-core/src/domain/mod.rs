//! Domain model (ids, task records, parameters, execution context, ...).

pub mod command;
pub mod context;
pub mod entity;
pub mod errors;
pub mod ids;
pub mod params;
pub mod priority;
pub mod task;

pub use self::command::{Command, CommandType, ExecutionRequest, ExecutorType};
pub use self::context::{
    DataxTaskContext, ExecutionContext, ExecutionContextBuilder, ProcedureTaskContext,
    ResolvedResources, Routing, SqlTaskContext, TaskRelation,
};
pub use self::entity::{DataSource, DbType, Resource, Tenant, UdfFunc, UdfType, User};
pub use self::errors::{ErrorKind, RelayError};
pub use self::ids::{
    DataSourceId, ProcessDefinitionId, ProcessInstanceId, ProjectId, ResourceId, TaskInstanceId,
    TenantId, UdfFuncId, UserId,
};
pub use self::params::{
    DataxParameters, JarParameters, ProcedureParameters, ResourceInfo, ResourceRefs,
    ScriptParameters, SqlParameters, TaskNode, TaskParameters,
};
pub use self::priority::TaskReference;
pub use self::task::{
    ExecutionStatus, Priority, ProcessDefinition, ProcessInstance, TaskInstance, TaskStateChange,
    TaskType,
};
