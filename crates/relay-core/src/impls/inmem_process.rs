//! InMemoryProcessService - 開発・テスト用の ProcessService
//!
//! Records are loaded once from a [`ServiceSnapshot`]; the only write is
//! `change_task_state`, which updates the stored task and is kept in a log
//! for inspection.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::domain::{
    DataSource, DataSourceId, ProcessDefinition, ProcessDefinitionId, ProcessInstance,
    ProcessInstanceId, Resource, ResourceId, TaskInstance, TaskInstanceId, TaskStateChange,
    Tenant, TenantId, UdfFunc, UdfFuncId, User, UserId,
};
use crate::ports::{ProcessService, ServiceError};

/// Flat record dump, as read from a JSON fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceSnapshot {
    pub task_instances: Vec<TaskInstance>,
    pub process_instances: Vec<ProcessInstance>,
    pub process_definitions: Vec<ProcessDefinition>,
    pub tenants: Vec<Tenant>,
    pub users: Vec<User>,
    pub data_sources: Vec<DataSource>,
    pub udf_funcs: Vec<UdfFunc>,
    pub resources: Vec<Resource>,
}

#[derive(Default)]
struct Records {
    task_instances: HashMap<TaskInstanceId, TaskInstance>,
    process_instances: HashMap<ProcessInstanceId, ProcessInstance>,
    process_definitions: HashMap<ProcessDefinitionId, ProcessDefinition>,
    tenants: HashMap<TenantId, Tenant>,
    users: HashMap<UserId, User>,
    data_sources: HashMap<DataSourceId, DataSource>,
    udf_funcs: Vec<UdfFunc>,
    resources: Vec<Resource>,
    state_changes: Vec<TaskStateChange>,
}

fn by_id<K: std::hash::Hash + Eq, V>(items: Vec<V>, key: impl Fn(&V) -> K) -> HashMap<K, V> {
    items.into_iter().map(|v| (key(&v), v)).collect()
}

#[derive(Clone, Default)]
pub struct InMemoryProcessService {
    records: Arc<RwLock<Records>>,
}

impl InMemoryProcessService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: ServiceSnapshot) -> Self {
        let records = Records {
            task_instances: by_id(snapshot.task_instances, |t| t.id),
            process_instances: by_id(snapshot.process_instances, |p| p.id),
            process_definitions: by_id(snapshot.process_definitions, |d| d.id),
            tenants: by_id(snapshot.tenants, |t| t.id),
            users: by_id(snapshot.users, |u| u.id),
            data_sources: by_id(snapshot.data_sources, |d| d.id),
            udf_funcs: snapshot.udf_funcs,
            resources: snapshot.resources,
            state_changes: Vec::new(),
        };
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// Every status change written so far, oldest first.
    pub async fn state_changes(&self) -> Vec<TaskStateChange> {
        self.records.read().await.state_changes.clone()
    }

    pub async fn task_instance(&self, id: TaskInstanceId) -> Option<TaskInstance> {
        self.records.read().await.task_instances.get(&id).cloned()
    }
}

#[async_trait]
impl ProcessService for InMemoryProcessService {
    async fn task_instance_detail(
        &self,
        id: TaskInstanceId,
    ) -> Result<Option<TaskInstance>, ServiceError> {
        let records = self.records.read().await;
        let Some(task) = records.task_instances.get(&id) else {
            return Ok(None);
        };

        let mut detail = task.clone();
        detail.process_instance = records
            .process_instances
            .get(&task.process_instance_id)
            .cloned();
        detail.process_definition = records
            .process_definitions
            .get(&task.process_definition_id)
            .cloned();
        Ok(Some(detail))
    }

    async fn tenant_for_process(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> Result<Option<Tenant>, ServiceError> {
        let records = self.records.read().await;
        let effective = if tenant_id.get() >= 0 {
            Some(tenant_id)
        } else {
            records.users.get(&user_id).map(|user| user.tenant_id)
        };
        Ok(effective.and_then(|id| records.tenants.get(&id).cloned()))
    }

    async fn user_queue_by_process_instance(
        &self,
        id: ProcessInstanceId,
    ) -> Result<Option<String>, ServiceError> {
        let records = self.records.read().await;
        let queue = records
            .process_instances
            .get(&id)
            .and_then(|process| records.users.get(&process.executor_id))
            .and_then(|user| user.queue.clone());
        Ok(queue)
    }

    async fn change_task_state(&self, change: TaskStateChange) -> Result<(), ServiceError> {
        let mut records = self.records.write().await;
        let Some(task) = records.task_instances.get_mut(&change.task_instance_id) else {
            return Err(ServiceError::Rejected {
                operation: "change_task_state",
                reason: format!("unknown task instance {}", change.task_instance_id),
            });
        };
        task.state = change.status;
        task.start_time = change.start_time;
        task.host = change.host.clone();
        records.state_changes.push(change);
        Ok(())
    }

    async fn find_data_source(
        &self,
        id: DataSourceId,
    ) -> Result<Option<DataSource>, ServiceError> {
        Ok(self.records.read().await.data_sources.get(&id).cloned())
    }

    async fn udf_funcs_by_ids(&self, ids: &[UdfFuncId]) -> Result<Vec<UdfFunc>, ServiceError> {
        let records = self.records.read().await;
        Ok(records
            .udf_funcs
            .iter()
            .filter(|udf| ids.contains(&udf.id))
            .cloned()
            .collect())
    }

    async fn resources_by_ids(&self, ids: &[ResourceId]) -> Result<Vec<Resource>, ServiceError> {
        let records = self.records.read().await;
        Ok(records
            .resources
            .iter()
            .filter(|resource| ids.contains(&resource.id))
            .cloned()
            .collect())
    }
}
