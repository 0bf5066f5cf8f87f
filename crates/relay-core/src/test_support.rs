//! Seeded records and doubles shared by the unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;
use tokio::sync::{Mutex, Notify};

use crate::domain::{
    DataSource, DataSourceId, DbType, ExecutionContext, ExecutionRequest, ExecutionStatus,
    Priority, ProcessDefinition, ProcessDefinitionId, ProcessInstance, ProcessInstanceId,
    ProjectId, ResolvedResources, Resource, ResourceId, TaskInstance, TaskInstanceId,
    TaskReference, TaskRelation, TaskType, Tenant, TenantId, UdfFunc, UdfFuncId, UdfType, User,
    UserId,
};
use crate::impls::{InMemoryProcessService, ServiceSnapshot};
use crate::ports::{DispatchError, ExecutorDispatcher};

pub const OWNER: UserId = UserId::new(7);
pub const QUEUE_USER: UserId = UserId::new(8);

pub const PROJECT: ProjectId = ProjectId::new(1);
pub const DEFINITION: ProcessDefinitionId = ProcessDefinitionId::new(3);

/// Runs as OWNER, who has no queue of their own.
pub const PROCESS: ProcessInstanceId = ProcessInstanceId::new(20);
/// Runs as QUEUE_USER, whose queue overrides the tenant's.
pub const QUEUED_PROCESS: ProcessInstanceId = ProcessInstanceId::new(21);
/// Points at a tenant that does not exist.
pub const ORPHAN_PROCESS: ProcessInstanceId = ProcessInstanceId::new(22);
/// Points at a process definition that does not exist.
pub const UNDEFINED_PROCESS: ProcessInstanceId = ProcessInstanceId::new(23);

pub const SHELL_TASK: TaskInstanceId = TaskInstanceId::new(100);
pub const SQL_TASK: TaskInstanceId = TaskInstanceId::new(101);
pub const DATAX_TASK: TaskInstanceId = TaskInstanceId::new(102);
pub const PROCEDURE_TASK: TaskInstanceId = TaskInstanceId::new(103);
pub const SPARK_TASK: TaskInstanceId = TaskInstanceId::new(104);
pub const ORPHAN_TASK: TaskInstanceId = TaskInstanceId::new(105);
/// SQL task whose data source is missing.
pub const BROKEN_TASK: TaskInstanceId = TaskInstanceId::new(106);
pub const UNDEFINED_TASK: TaskInstanceId = TaskInstanceId::new(107);

pub const TENANT_QUEUE: &str = "tenant-queue";
pub const USER_QUEUE: &str = "user-queue";

pub fn task_instance(id: TaskInstanceId, task_type: &str, task_json: &str) -> TaskInstance {
    TaskInstance {
        id,
        name: format!("task-{}", id.get()),
        task_type: task_type.to_string(),
        task_json: task_json.to_string(),
        process_instance_id: PROCESS,
        process_definition_id: DEFINITION,
        state: ExecutionStatus::SubmittedSuccess,
        priority: Priority::Medium,
        host: Some("10.0.0.1:5678".to_string()),
        start_time: Some(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()),
        submit_time: None,
        worker_group: None,
        log_path: None,
        process_instance: None,
        process_definition: None,
    }
}

fn node(task_type: &str, params: serde_json::Value) -> String {
    json!({ "type": task_type, "name": "n", "params": params }).to_string()
}

fn process_instance(id: ProcessInstanceId, tenant: i64, executor: UserId) -> ProcessInstance {
    ProcessInstance {
        id,
        process_definition_id: DEFINITION,
        tenant_id: TenantId::new(tenant),
        executor_id: executor,
        priority: Priority::Medium,
        command_type: Some("START_PROCESS".to_string()),
        schedule_time: None,
        global_params: None,
    }
}

fn data_source(id: i64, db_type: DbType) -> DataSource {
    DataSource {
        id: DataSourceId::new(id),
        name: format!("ds-{id}"),
        db_type,
        connection_params: format!("{{\"address\":\"jdbc://db-{id}\"}}"),
    }
}

fn udf(id: i64) -> UdfFunc {
    UdfFunc {
        id: UdfFuncId::new(id),
        func_name: format!("fn_{id}"),
        class_name: format!("com.acme.Fn{id}"),
        udf_type: UdfType::Hive,
        resource_name: None,
    }
}

fn resource(id: i64, name: &str) -> Resource {
    Resource {
        id: ResourceId::new(id),
        full_name: name.to_string(),
        is_directory: false,
    }
}

pub fn snapshot() -> ServiceSnapshot {
    let mut spark = task_instance(
        SPARK_TASK,
        "SPARK",
        &node(
            "SPARK",
            json!({
                "mainJar": {"id": 5},
                "resourceList": [{"id": 5}, {"id": 8}]
            }),
        ),
    );
    spark.process_instance_id = QUEUED_PROCESS;
    spark.worker_group = Some("spark".to_string());

    let mut orphan = task_instance(ORPHAN_TASK, "SHELL", &node("SHELL", json!({})));
    orphan.process_instance_id = ORPHAN_PROCESS;

    let mut undefined = task_instance(UNDEFINED_TASK, "SHELL", &node("SHELL", json!({})));
    undefined.process_instance_id = UNDEFINED_PROCESS;
    undefined.process_definition_id = ProcessDefinitionId::new(404);

    let mut undefined_process = process_instance(UNDEFINED_PROCESS, 1, OWNER);
    undefined_process.process_definition_id = ProcessDefinitionId::new(404);

    ServiceSnapshot {
        task_instances: vec![
            task_instance(
                SHELL_TASK,
                "SHELL",
                &node("SHELL", json!({"rawScript": "echo hi", "resourceList": []})),
            ),
            task_instance(
                SQL_TASK,
                "SQL",
                &node(
                    "SQL",
                    json!({"type": "HIVE", "datasource": 20, "sql": "select 1", "udfs": "3,7,9"}),
                ),
            ),
            task_instance(
                DATAX_TASK,
                "DATAX",
                &node(
                    "DATAX",
                    json!({"dsType": "MYSQL", "dataSource": 10, "dtType": "HIVE", "dataTarget": 20}),
                ),
            ),
            task_instance(
                PROCEDURE_TASK,
                "PROCEDURE",
                &node(
                    "PROCEDURE",
                    json!({"type": "POSTGRESQL", "datasource": 30, "method": "call p()"}),
                ),
            ),
            spark,
            orphan,
            task_instance(
                BROKEN_TASK,
                "SQL",
                &node("SQL", json!({"type": "MYSQL", "datasource": 404})),
            ),
            undefined,
        ],
        process_instances: vec![
            process_instance(PROCESS, 1, OWNER),
            process_instance(QUEUED_PROCESS, 1, QUEUE_USER),
            process_instance(ORPHAN_PROCESS, 404, OWNER),
            undefined_process,
        ],
        process_definitions: vec![ProcessDefinition {
            id: DEFINITION,
            project_id: PROJECT,
            user_id: OWNER,
            name: "etl".to_string(),
            global_params: None,
        }],
        tenants: vec![Tenant {
            id: TenantId::new(1),
            tenant_code: "acme".to_string(),
            queue: TENANT_QUEUE.to_string(),
        }],
        users: vec![
            User {
                id: OWNER,
                user_name: "owner".to_string(),
                tenant_id: TenantId::new(1),
                queue: None,
            },
            User {
                id: QUEUE_USER,
                user_name: "queued".to_string(),
                tenant_id: TenantId::new(1),
                queue: Some(USER_QUEUE.to_string()),
            },
        ],
        data_sources: vec![
            data_source(10, DbType::Mysql),
            data_source(20, DbType::Hive),
            data_source(30, DbType::Postgresql),
        ],
        udf_funcs: vec![udf(9), udf(3), udf(7), udf(11)],
        resources: vec![
            resource(8, "/resources/lib.jar"),
            resource(5, "/resources/main.jar"),
        ],
    }
}

pub fn seeded_service() -> Arc<InMemoryProcessService> {
    Arc::new(InMemoryProcessService::from_snapshot(snapshot()))
}

pub fn reference(task_instance_id: TaskInstanceId, task_priority: Priority) -> TaskReference {
    TaskReference {
        process_priority: Priority::Medium,
        process_instance_id: PROCESS,
        task_priority,
        task_instance_id,
        submit_time: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        worker_group: "default".to_string(),
    }
}

pub fn sample_context() -> ExecutionContext {
    ExecutionContext {
        task_instance_id: SHELL_TASK,
        task_name: "echo".to_string(),
        task_type: TaskType::Shell,
        task_json: node("SHELL", json!({"rawScript": "echo hi"})),
        start_time: None,
        host: None,
        log_path: None,
        execute_path: "/tmp/relay/exec/1/3/20/100".to_string(),
        worker_group: "default".to_string(),
        resources: ResolvedResources::None,
        process_instance_id: PROCESS,
        tenant_code: "acme".to_string(),
        queue: TENANT_QUEUE.to_string(),
        executor_id: OWNER,
        command_type: None,
        schedule_time: None,
        global_params: None,
        process_define_id: DEFINITION,
        project_id: PROJECT,
        relation: TaskRelation::None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Accept,
    Decline,
    Fail,
    /// Panics on the first call, accepts afterwards.
    PanicOnce,
}

/// Dispatcher double that records every request it sees.
pub struct RecordingDispatcher {
    reply: Reply,
    delay: Option<Duration>,
    requests: Mutex<Vec<ExecutionRequest>>,
    panicked: AtomicBool,
    /// Signalled on entry to every `dispatch` call.
    pub entered: Notify,
}

impl RecordingDispatcher {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            delay: None,
            requests: Mutex::new(Vec::new()),
            panicked: AtomicBool::new(false),
            entered: Notify::new(),
        }
    }

    pub fn accepting() -> Arc<Self> {
        Arc::new(Self::new(Reply::Accept))
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::new(Reply::Accept)
        })
    }

    pub async fn requests(&self) -> Vec<ExecutionRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn dispatched_task_ids(&self) -> Vec<TaskInstanceId> {
        self.requests()
            .await
            .iter()
            .map(|r| r.command.execution_context().unwrap().task_instance_id)
            .collect()
    }
}

#[async_trait]
impl ExecutorDispatcher for RecordingDispatcher {
    async fn dispatch(&self, request: ExecutionRequest) -> Result<bool, DispatchError> {
        self.entered.notify_one();
        if self.reply == Reply::PanicOnce && !self.panicked.swap(true, Ordering::SeqCst) {
            panic!("dispatcher crashed");
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.requests.lock().await.push(request);
        match self.reply {
            Reply::Accept | Reply::PanicOnce => Ok(true),
            Reply::Decline => Ok(false),
            Reply::Fail => Err(DispatchError::Transport("connection reset".to_string())),
        }
    }
}
