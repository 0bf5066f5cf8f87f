//! Relation builders - task type ごとの依存解決
//!
//! A relation is the type-specific part of an execution context: the
//! connection details of a SQL task's data source, the two ends of a data
//! transfer, and so on. Builders are looked up by [`TaskType`] in a
//! [`RelationRegistry`]; a type with no builder gets [`TaskRelation::None`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    DataSource, DataSourceId, DataxTaskContext, ProcedureTaskContext, RelayError,
    SqlParameters, SqlTaskContext, TaskParameters, TaskRelation, TaskType, UdfFunc, UdfFuncId,
    UdfType,
};
use crate::ports::ProcessService;

#[async_trait]
pub trait RelationBuilder: Send + Sync {
    async fn build(
        &self,
        params: &TaskParameters,
        service: &dyn ProcessService,
    ) -> Result<TaskRelation, RelayError>;
}

async fn data_source(
    service: &dyn ProcessService,
    id: DataSourceId,
) -> Result<DataSource, RelayError> {
    service
        .find_data_source(id)
        .await?
        .ok_or(RelayError::DataSourceNotFound(id))
}

fn mismatch(expected: TaskType, params: &TaskParameters) -> RelayError {
    RelayError::RelationMismatch {
        expected,
        actual: params.task_type(),
    }
}

/// Parses a comma-separated id list. Trailing empty entries are dropped
/// ("3,7,9," is three ids); any other malformed entry fails the whole list.
pub fn parse_udf_ids(raw: &str) -> Result<Vec<UdfFuncId>, RelayError> {
    let mut parts: Vec<&str> = raw.split(',').collect();
    while parts.len() > 1 && parts.last().is_some_and(|p| p.trim().is_empty()) {
        parts.pop();
    }

    parts
        .into_iter()
        .map(|part| {
            part.trim()
                .parse::<UdfFuncId>()
                .map_err(|source| RelayError::InvalidUdfId {
                    raw: part.to_string(),
                    source,
                })
        })
        .collect()
}

pub struct SqlRelation;

impl SqlRelation {
    async fn udf_funcs(
        params: &SqlParameters,
        service: &dyn ProcessService,
    ) -> Result<Vec<UdfFunc>, RelayError> {
        if UdfType::from_sql_type(&params.sql_type).is_none() {
            return Ok(Vec::new());
        }
        let Some(list) = params.udfs.as_deref().map(str::trim).filter(|l| !l.is_empty()) else {
            return Ok(Vec::new());
        };
        let ids = parse_udf_ids(list)?;
        Ok(service.udf_funcs_by_ids(&ids).await?)
    }
}

#[async_trait]
impl RelationBuilder for SqlRelation {
    async fn build(
        &self,
        params: &TaskParameters,
        service: &dyn ProcessService,
    ) -> Result<TaskRelation, RelayError> {
        let TaskParameters::Sql(sql) = params else {
            return Err(mismatch(TaskType::Sql, params));
        };
        let source = data_source(service, sql.datasource).await?;
        let udf_func_list = Self::udf_funcs(sql, service).await?;

        Ok(TaskRelation::Sql(SqlTaskContext {
            connection_params: source.connection_params,
            udf_func_list,
        }))
    }
}

/// Source and target are looked up independently, even when they share an
/// id.
pub struct DataxRelation;

#[async_trait]
impl RelationBuilder for DataxRelation {
    async fn build(
        &self,
        params: &TaskParameters,
        service: &dyn ProcessService,
    ) -> Result<TaskRelation, RelayError> {
        let TaskParameters::Datax(datax) = params else {
            return Err(mismatch(TaskType::Datax, params));
        };
        let source = data_source(service, datax.data_source).await?;
        let target = data_source(service, datax.data_target).await?;

        Ok(TaskRelation::Datax(DataxTaskContext {
            data_source_id: source.id,
            source_type: source.db_type.code(),
            source_connection_params: source.connection_params,
            data_target_id: target.id,
            target_type: target.db_type.code(),
            target_connection_params: target.connection_params,
        }))
    }
}

pub struct ProcedureRelation;

#[async_trait]
impl RelationBuilder for ProcedureRelation {
    async fn build(
        &self,
        params: &TaskParameters,
        service: &dyn ProcessService,
    ) -> Result<TaskRelation, RelayError> {
        let TaskParameters::Procedure(procedure) = params else {
            return Err(mismatch(TaskType::Procedure, params));
        };
        let source = data_source(service, procedure.datasource).await?;

        Ok(TaskRelation::Procedure(ProcedureTaskContext {
            connection_params: source.connection_params,
        }))
    }
}

/// TaskType → RelationBuilder.
#[derive(Clone, Default)]
pub struct RelationRegistry {
    builders: HashMap<TaskType, Arc<dyn RelationBuilder>>,
}

impl RelationRegistry {
    /// Empty registry; every type resolves to `TaskRelation::None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// SQL, DATAX and PROCEDURE builders.
    pub fn with_defaults() -> Self {
        let mut builders: HashMap<TaskType, Arc<dyn RelationBuilder>> = HashMap::new();
        builders.insert(TaskType::Sql, Arc::new(SqlRelation));
        builders.insert(TaskType::Datax, Arc::new(DataxRelation));
        builders.insert(TaskType::Procedure, Arc::new(ProcedureRelation));
        Self { builders }
    }

    pub fn register(
        &mut self,
        task_type: TaskType,
        builder: Arc<dyn RelationBuilder>,
    ) -> Result<(), RelayError> {
        if self.builders.contains_key(&task_type) {
            return Err(RelayError::DuplicateRelation(task_type));
        }
        self.builders.insert(task_type, builder);
        Ok(())
    }

    pub fn registered_types(&self) -> Vec<TaskType> {
        self.builders.keys().copied().collect()
    }

    pub async fn build(
        &self,
        params: &TaskParameters,
        service: &dyn ProcessService,
    ) -> Result<TaskRelation, RelayError> {
        match self.builders.get(&params.task_type()) {
            Some(builder) => builder.build(params, service).await,
            None => Ok(TaskRelation::None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DbType, ScriptParameters};
    use crate::test_support::seeded_service;
    use rstest::rstest;
    use serde_json::json;

    fn sql(params: serde_json::Value) -> TaskParameters {
        TaskParameters::parse(TaskType::Sql, params).unwrap()
    }

    fn udf_ids(relation: &TaskRelation) -> Vec<i64> {
        let TaskRelation::Sql(ctx) = relation else {
            panic!("expected a sql relation, got {relation:?}");
        };
        let mut ids: Vec<i64> = ctx.udf_func_list.iter().map(|u| u.id.get()).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn sql_attaches_connection_params_and_listed_udfs() {
        let service = seeded_service();
        let relation = SqlRelation
            .build(
                &sql(json!({"type": "HIVE", "datasource": 20, "udfs": "3,7,9"})),
                service.as_ref(),
            )
            .await
            .unwrap();

        assert_eq!(udf_ids(&relation), vec![3, 7, 9]);
        let TaskRelation::Sql(ctx) = relation else {
            unreachable!()
        };
        assert!(ctx.connection_params.contains("db-20"));
    }

    #[rstest]
    #[case(json!({"type": "HIVE", "datasource": 20}))]
    #[case(json!({"type": "HIVE", "datasource": 20, "udfs": ""}))]
    #[case(json!({"type": "SPARK", "datasource": 20, "udfs": "  "}))]
    #[case(json!({"type": "MYSQL", "datasource": 10, "udfs": "3,7,9"}))]
    #[tokio::test]
    async fn sql_without_usable_udf_list_gets_none(#[case] params: serde_json::Value) {
        let service = seeded_service();
        let relation = SqlRelation
            .build(&sql(params), service.as_ref())
            .await
            .unwrap();
        assert!(udf_ids(&relation).is_empty());
    }

    #[tokio::test]
    async fn malformed_udf_id_fails_the_task() {
        let service = seeded_service();
        let err = SqlRelation
            .build(
                &sql(json!({"type": "HIVE", "datasource": 20, "udfs": "3,seven"})),
                service.as_ref(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidUdfId { raw, .. } if raw == "seven"));
    }

    #[rstest]
    #[case(10, 20, DbType::Mysql, DbType::Hive)]
    #[case(10, 10, DbType::Mysql, DbType::Mysql)]
    #[tokio::test]
    async fn datax_resolves_both_ends_independently(
        #[case] source: i64,
        #[case] target: i64,
        #[case] source_type: DbType,
        #[case] target_type: DbType,
    ) {
        let service = seeded_service();
        let params = TaskParameters::parse(
            TaskType::Datax,
            json!({"dataSource": source, "dataTarget": target}),
        )
        .unwrap();

        let relation = DataxRelation.build(&params, service.as_ref()).await.unwrap();
        let TaskRelation::Datax(ctx) = relation else {
            panic!("expected a datax relation");
        };
        assert_eq!(ctx.data_source_id.get(), source);
        assert_eq!(ctx.data_target_id.get(), target);
        assert_eq!(ctx.source_type, source_type.code());
        assert_eq!(ctx.target_type, target_type.code());
        assert!(ctx.source_connection_params.contains(&format!("db-{source}")));
        assert!(ctx.target_connection_params.contains(&format!("db-{target}")));
    }

    #[tokio::test]
    async fn procedure_copies_connection_params() {
        let service = seeded_service();
        let params = TaskParameters::parse(
            TaskType::Procedure,
            json!({"type": "POSTGRESQL", "datasource": 30, "method": "call p()"}),
        )
        .unwrap();
        let relation = ProcedureRelation
            .build(&params, service.as_ref())
            .await
            .unwrap();
        assert!(matches!(
            relation,
            TaskRelation::Procedure(ctx) if ctx.connection_params.contains("db-30")
        ));
    }

    #[tokio::test]
    async fn missing_data_source_is_an_explicit_error() {
        let service = seeded_service();
        let err = DataxRelation
            .build(
                &TaskParameters::parse(
                    TaskType::Datax,
                    json!({"dataSource": 10, "dataTarget": 404}),
                )
                .unwrap(),
                service.as_ref(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::DataSourceNotFound(id) if id.get() == 404));
    }

    #[tokio::test]
    async fn builder_rejects_foreign_parameters() {
        let service = seeded_service();
        let err = SqlRelation
            .build(
                &TaskParameters::Shell(ScriptParameters::default()),
                service.as_ref(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RelayError::RelationMismatch {
                expected: TaskType::Sql,
                actual: TaskType::Shell
            }
        ));
    }

    #[tokio::test]
    async fn registry_leaves_other_types_without_relation() {
        let service = seeded_service();
        let registry = RelationRegistry::with_defaults();
        let relation = registry
            .build(
                &TaskParameters::Shell(ScriptParameters::default()),
                service.as_ref(),
            )
            .await
            .unwrap();
        assert_eq!(relation, TaskRelation::None);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = RelationRegistry::with_defaults();
        let err = registry
            .register(TaskType::Sql, Arc::new(SqlRelation))
            .unwrap_err();
        assert!(matches!(err, RelayError::DuplicateRelation(TaskType::Sql)));

        let mut types = registry.registered_types();
        types.sort_by_key(|t| t.as_str());
        assert_eq!(
            types,
            vec![TaskType::Datax, TaskType::Procedure, TaskType::Sql]
        );
    }

    #[rstest]
    #[case(" 3, 7 ,9")]
    #[case("3,7,9,")]
    #[case("3,7,9, ,")]
    fn udf_id_list_parses(#[case] raw: &str) {
        let ids: Vec<i64> = parse_udf_ids(raw)
            .unwrap()
            .iter()
            .map(|id| id.get())
            .collect();
        assert_eq!(ids, vec![3, 7, 9]);
    }

    #[rstest]
    #[case("3,,7", "")]
    #[case(",3", "")]
    #[case("3,x,", "x")]
    fn udf_id_list_rejects_inner_gaps(#[case] raw: &str, #[case] bad: &str) {
        let err = parse_udf_ids(raw).unwrap_err();
        assert!(matches!(err, RelayError::InvalidUdfId { raw, .. } if raw == bad));
    }
}
