//! Typed task parameters.
//!
//! A task instance stores its parameters as opaque JSON keyed by the type
//! tag. [`TaskParameters`] is the sum type over the shapes the relay knows;
//! every shape reports the resources it references through [`ResourceRefs`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::errors::RelayError;
use super::ids::{DataSourceId, ResourceId, TaskInstanceId};
use super::task::TaskType;

/// The serialized task node stored in `TaskInstance::task_json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskNode {
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub name: String,
    /// Either an inline object or a string holding JSON.
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub worker_group: Option<String>,
}

impl TaskNode {
    pub fn parse(task_instance_id: TaskInstanceId, json: &str) -> Result<Self, RelayError> {
        serde_json::from_str(json).map_err(|source| RelayError::InvalidTaskJson {
            task_instance_id,
            source,
        })
    }

    /// Params as a JSON object, unwrapping the string-encoded form.
    pub fn params_value(&self, task_type: TaskType) -> Result<serde_json::Value, RelayError> {
        match &self.params {
            serde_json::Value::String(raw) => serde_json::from_str(raw)
                .map_err(|source| RelayError::InvalidParameters { task_type, source }),
            serde_json::Value::Null => Ok(serde_json::json!({})),
            other => Ok(other.clone()),
        }
    }
}

/// Reference to a registered resource inside task parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    #[serde(default)]
    pub id: Option<ResourceId>,
    #[serde(default)]
    pub res: Option<String>,
}

/// Capability every parameter shape implements.
pub trait ResourceRefs {
    /// Ids of referenced resources, in field order, duplicates included.
    fn resource_ids(&self) -> Vec<ResourceId>;
}

fn ids_of<'a>(infos: impl IntoIterator<Item = &'a ResourceInfo>) -> Vec<ResourceId> {
    infos.into_iter().filter_map(|info| info.id).collect()
}

/// Shell and Python scripts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptParameters {
    #[serde(default)]
    pub raw_script: String,
    #[serde(default)]
    pub resource_list: Vec<ResourceInfo>,
}

impl ResourceRefs for ScriptParameters {
    fn resource_ids(&self) -> Vec<ResourceId> {
        ids_of(&self.resource_list)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlParameters {
    /// Data source flavour, e.g. "MYSQL" or "HIVE".
    #[serde(rename = "type")]
    pub sql_type: String,
    pub datasource: DataSourceId,
    #[serde(default)]
    pub sql: String,
    /// Comma-separated UDF ids.
    #[serde(default)]
    pub udfs: Option<String>,
}

impl ResourceRefs for SqlParameters {
    fn resource_ids(&self) -> Vec<ResourceId> {
        Vec::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureParameters {
    #[serde(rename = "type")]
    pub db_type: String,
    pub datasource: DataSourceId,
    #[serde(default)]
    pub method: String,
}

impl ResourceRefs for ProcedureParameters {
    fn resource_ids(&self) -> Vec<ResourceId> {
        Vec::new()
    }
}

/// Data transfer from one data source to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataxParameters {
    #[serde(default)]
    pub ds_type: String,
    pub data_source: DataSourceId,
    #[serde(default)]
    pub dt_type: String,
    pub data_target: DataSourceId,
    #[serde(default)]
    pub sql: String,
    #[serde(default)]
    pub target_table: String,
}

impl ResourceRefs for DataxParameters {
    fn resource_ids(&self) -> Vec<ResourceId> {
        Vec::new()
    }
}

/// Spark, Flink and MapReduce jobs: a main jar plus extra files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JarParameters {
    #[serde(default)]
    pub main_jar: Option<ResourceInfo>,
    #[serde(default)]
    pub main_class: Option<String>,
    #[serde(default)]
    pub main_args: Option<String>,
    #[serde(default)]
    pub resource_list: Vec<ResourceInfo>,
}

impl ResourceRefs for JarParameters {
    fn resource_ids(&self) -> Vec<ResourceId> {
        ids_of(self.main_jar.iter().chain(&self.resource_list))
    }
}

/// Parameters of a task, tagged by its type.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskParameters {
    Shell(ScriptParameters),
    Python(ScriptParameters),
    Sql(SqlParameters),
    Procedure(ProcedureParameters),
    Datax(DataxParameters),
    Spark(JarParameters),
    Flink(JarParameters),
    Mr(JarParameters),
    /// Types whose parameters the relay passes through untouched.
    Generic(TaskType, serde_json::Value),
}

impl TaskParameters {
    pub fn parse(task_type: TaskType, params: serde_json::Value) -> Result<Self, RelayError> {
        fn typed<T: DeserializeOwned>(
            task_type: TaskType,
            params: serde_json::Value,
        ) -> Result<T, RelayError> {
            serde_json::from_value(params)
                .map_err(|source| RelayError::InvalidParameters { task_type, source })
        }

        Ok(match task_type {
            TaskType::Shell => Self::Shell(typed(task_type, params)?),
            TaskType::Python => Self::Python(typed(task_type, params)?),
            TaskType::Sql => Self::Sql(typed(task_type, params)?),
            TaskType::Procedure => Self::Procedure(typed(task_type, params)?),
            TaskType::Datax => Self::Datax(typed(task_type, params)?),
            TaskType::Spark => Self::Spark(typed(task_type, params)?),
            TaskType::Flink => Self::Flink(typed(task_type, params)?),
            TaskType::Mr => Self::Mr(typed(task_type, params)?),
            TaskType::Http
            | TaskType::Sqoop
            | TaskType::Dependent
            | TaskType::SubProcess
            | TaskType::Conditions => Self::Generic(task_type, params),
        })
    }

    pub fn task_type(&self) -> TaskType {
        match self {
            Self::Shell(_) => TaskType::Shell,
            Self::Python(_) => TaskType::Python,
            Self::Sql(_) => TaskType::Sql,
            Self::Procedure(_) => TaskType::Procedure,
            Self::Datax(_) => TaskType::Datax,
            Self::Spark(_) => TaskType::Spark,
            Self::Flink(_) => TaskType::Flink,
            Self::Mr(_) => TaskType::Mr,
            Self::Generic(task_type, _) => *task_type,
        }
    }
}

impl ResourceRefs for TaskParameters {
    fn resource_ids(&self) -> Vec<ResourceId> {
        match self {
            Self::Shell(p) | Self::Python(p) => p.resource_ids(),
            Self::Sql(p) => p.resource_ids(),
            Self::Procedure(p) => p.resource_ids(),
            Self::Datax(p) => p.resource_ids(),
            Self::Spark(p) | Self::Flink(p) | Self::Mr(p) => p.resource_ids(),
            Self::Generic(..) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_node_accepts_string_encoded_params() {
        let node = TaskNode::parse(
            TaskInstanceId::new(1),
            r#"{"type":"SHELL","name":"s","params":"{\"rawScript\":\"echo hi\"}"}"#,
        )
        .unwrap();
        let value = node.params_value(TaskType::Shell).unwrap();
        assert_eq!(value["rawScript"], "echo hi");
    }

    #[test]
    fn malformed_task_json_names_the_task() {
        let err = TaskNode::parse(TaskInstanceId::new(77), "{not json").unwrap_err();
        assert!(matches!(
            err,
            RelayError::InvalidTaskJson { task_instance_id, .. } if task_instance_id.get() == 77
        ));
    }

    #[test]
    fn jar_parameters_list_main_jar_and_resource_list() {
        let params = TaskParameters::parse(
            TaskType::Spark,
            json!({
                "mainJar": {"id": 5},
                "resourceList": [{"id": 5}, {"id": 8}, {"res": "inline.txt"}]
            }),
        )
        .unwrap();
        let ids: Vec<i64> = params.resource_ids().iter().map(|id| id.get()).collect();
        assert_eq!(ids, vec![5, 5, 8]);
    }

    #[test]
    fn sql_parameters_reference_no_resources() {
        let params = TaskParameters::parse(
            TaskType::Sql,
            json!({"type": "HIVE", "datasource": 1, "sql": "select 1", "udfs": "3,7"}),
        )
        .unwrap();
        assert!(params.resource_ids().is_empty());
        assert_eq!(params.task_type(), TaskType::Sql);
    }

    #[test]
    fn missing_required_field_is_invalid_parameters() {
        let err = TaskParameters::parse(TaskType::Datax, json!({"dataSource": 1})).unwrap_err();
        assert!(matches!(
            err,
            RelayError::InvalidParameters { task_type: TaskType::Datax, .. }
        ));
    }

    #[test]
    fn generic_types_keep_raw_params() {
        let params = TaskParameters::parse(TaskType::Http, json!({"url": "http://x"})).unwrap();
        assert_eq!(params.task_type(), TaskType::Http);
        assert!(params.resource_ids().is_empty());
    }
}
