//! Read-only records the relay looks up while resolving a task.

use serde::{Deserialize, Serialize};

use super::ids::{DataSourceId, ResourceId, TenantId, UdfFuncId, UserId};

/// Isolation/routing identity a task runs under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: TenantId,
    pub tenant_code: String,
    /// Default routing queue for tasks of this tenant.
    #[serde(default)]
    pub queue: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub user_name: String,
    pub tenant_id: TenantId,
    /// Queue chosen by the user; wins over the tenant's queue when set.
    #[serde(default)]
    pub queue: Option<String>,
}

/// Database flavour of a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DbType {
    Mysql,
    Postgresql,
    Hive,
    Spark,
    Clickhouse,
    Oracle,
    Sqlserver,
    Db2,
    Presto,
}

impl DbType {
    /// Numeric code workers expect in data-transfer contexts.
    pub fn code(self) -> i32 {
        match self {
            DbType::Mysql => 0,
            DbType::Postgresql => 1,
            DbType::Hive => 2,
            DbType::Spark => 3,
            DbType::Clickhouse => 4,
            DbType::Oracle => 5,
            DbType::Sqlserver => 6,
            DbType::Db2 => 7,
            DbType::Presto => 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub id: DataSourceId,
    pub name: String,
    #[serde(rename = "type")]
    pub db_type: DbType,
    /// Opaque connection parameters, usually a JSON document.
    pub connection_params: String,
}

/// A registered file artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: ResourceId,
    pub full_name: String,
    #[serde(default)]
    pub is_directory: bool,
}

/// Engine a user-defined function is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UdfType {
    Hive,
    Spark,
}

impl UdfType {
    /// Recognizes the SQL `type` values that carry UDFs.
    pub fn from_sql_type(sql_type: &str) -> Option<Self> {
        match sql_type {
            "HIVE" => Some(UdfType::Hive),
            "SPARK" => Some(UdfType::Spark),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UdfFunc {
    pub id: UdfFuncId,
    pub func_name: String,
    pub class_name: String,
    #[serde(rename = "type")]
    pub udf_type: UdfType,
    #[serde(default)]
    pub resource_name: Option<String>,
}
