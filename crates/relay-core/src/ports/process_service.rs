//! ProcessService port - the dependency service the resolver reads from.
//!
//! Every lookup is awaited to completion by the caller; timeouts belong to
//! the implementation.

use async_trait::async_trait;

use crate::domain::{
    DataSource, DataSourceId, ProcessInstanceId, Resource, ResourceId, TaskInstance,
    TaskInstanceId, TaskStateChange, Tenant, TenantId, UdfFunc, UdfFuncId, UserId,
};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("service rejected {operation}: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },
}

#[async_trait]
pub trait ProcessService: Send + Sync {
    /// Task instance with its process instance and definition attached.
    async fn task_instance_detail(
        &self,
        id: TaskInstanceId,
    ) -> Result<Option<TaskInstance>, ServiceError>;

    async fn tenant_for_process(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> Result<Option<Tenant>, ServiceError>;

    /// Queue explicitly associated with a process instance, if any.
    async fn user_queue_by_process_instance(
        &self,
        id: ProcessInstanceId,
    ) -> Result<Option<String>, ServiceError>;

    async fn change_task_state(&self, change: TaskStateChange) -> Result<(), ServiceError>;

    async fn find_data_source(
        &self,
        id: DataSourceId,
    ) -> Result<Option<DataSource>, ServiceError>;

    /// Functions for the given ids; unknown ids are absent from the result.
    async fn udf_funcs_by_ids(&self, ids: &[UdfFuncId]) -> Result<Vec<UdfFunc>, ServiceError>;

    /// Resources for the given ids; unknown ids are absent from the result.
    async fn resources_by_ids(&self, ids: &[ResourceId]) -> Result<Vec<Resource>, ServiceError>;
}
