//! ContextResolver - TaskReference から ExecutionContext を組み立てる
//!
//! Resolution order:
//! 1. task instance detail (with process instance and definition)
//! 2. tenant; a missing tenant marks the task FAILURE and yields `None`
//! 3. routing queue, execute path and worker group
//! 4. resource names
//! 5. the type-specific relation
//!
//! Only the tenant failure writes task status. Every other failure is
//! returned to the caller and leaves the task's status untouched.

use std::sync::Arc;

use tracing::{debug, error, instrument};

use crate::config::RelayConfig;
use crate::domain::{
    ExecutionContext, ExecutionContextBuilder, RelayError, Routing, TaskNode, TaskParameters,
    TaskReference, TaskStateChange, UserId,
};
use crate::ports::ProcessService;

use super::relation::RelationRegistry;
use super::resources::ResourceResolver;

/// Owner id used for the tenant lookup when the definition is missing.
const UNKNOWN_OWNER: UserId = UserId::new(0);

#[derive(Clone)]
pub struct ContextResolver {
    service: Arc<dyn ProcessService>,
    relations: Arc<RelationRegistry>,
    resources: ResourceResolver,
    config: Arc<RelayConfig>,
}

impl ContextResolver {
    pub fn new(
        service: Arc<dyn ProcessService>,
        relations: RelationRegistry,
        config: RelayConfig,
    ) -> Self {
        Self {
            resources: ResourceResolver::new(Arc::clone(&service), config.resource_policy),
            service,
            relations: Arc::new(relations),
            config: Arc::new(config),
        }
    }

    #[instrument(skip_all, fields(task_instance_id = %reference.task_instance_id))]
    pub async fn resolve(
        &self,
        reference: &TaskReference,
    ) -> Result<Option<ExecutionContext>, RelayError> {
        let id = reference.task_instance_id;
        let task = self
            .service
            .task_instance_detail(id)
            .await?
            .ok_or(RelayError::TaskInstanceNotFound(id))?;

        let task_type = task.task_type()?;
        let node = TaskNode::parse(task.id, &task.task_json)?;

        let process = task
            .process_instance
            .as_ref()
            .ok_or(RelayError::MissingProcessInstance {
                task_instance_id: task.id,
            })?;
        let owner = task
            .process_definition
            .as_ref()
            .map_or(UNKNOWN_OWNER, |definition| definition.user_id);

        let Some(tenant) = self
            .service
            .tenant_for_process(process.tenant_id, owner)
            .await?
        else {
            error!(
                process_instance_id = %process.id,
                task_instance_id = %task.id,
                "tenant not found, marking task failed"
            );
            self.service
                .change_task_state(TaskStateChange::failure(&task))
                .await?;
            return Ok(None);
        };

        let definition =
            task.process_definition
                .as_ref()
                .ok_or(RelayError::MissingProcessDefinition {
                    process_instance_id: process.id,
                })?;

        // インスタンス側のキュー指定がテナントのデフォルトより優先
        let queue = match self.service.user_queue_by_process_instance(process.id).await? {
            Some(queue) if !queue.is_empty() => queue,
            _ => tenant.queue.clone(),
        };

        let routing = Routing {
            tenant_code: tenant.tenant_code.clone(),
            queue,
            execute_path: self.config.execute_path(
                definition.project_id,
                definition.id,
                process.id,
                task.id,
            ),
            worker_group: task
                .worker_group
                .clone()
                .or_else(|| node.worker_group.clone())
                .filter(|group| !group.is_empty())
                .unwrap_or_else(|| self.config.default_worker_group.clone()),
        };

        let params = TaskParameters::parse(task_type, node.params_value(task_type)?)?;
        let resources = self.resources.resolve(&params).await?;
        let relation = self.relations.build(&params, self.service.as_ref()).await?;

        debug!(
            task_type = %task_type,
            tenant = %routing.tenant_code,
            queue = %routing.queue,
            worker_group = %routing.worker_group,
            "execution context resolved"
        );

        ExecutionContextBuilder::new()
            .task_instance(&task, task_type)
            .process_instance(process)
            .process_definition(definition)
            .routing(routing)
            .resources(resources)
            .relation(relation)
            .build()
            .map(Some)
    }
}
