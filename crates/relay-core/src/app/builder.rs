//! AppBuilder - コンシューマの構築とワイヤリング
//!
//! The composition root: collaborators are handed in explicitly and checked
//! once at `build()` time.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::domain::{RelayError, TaskType};
use crate::ports::{ExecutorDispatcher, ProcessService, TaskQueue};

use super::consumer::DispatchConsumer;
use super::relation::{RelationBuilder, RelationRegistry};
use super::resolver::ContextResolver;

/// AppBuilder は DispatchConsumer を構築
///
/// # 使用例
/// ```ignore
/// let consumer = AppBuilder::new()
///     .queue(queue)
///     .service(service)
///     .dispatcher(dispatcher)
///     .config(RelayConfig::from_env()?)
///     .expect_relations(&[TaskType::Sql])
///     .build()?;
/// let handle = consumer.start();
/// ```
///
/// # Fail-fast 設計
/// - queue / service / dispatcher のどれかが欠けていれば BuildError::MissingComponent
/// - expect_relations() で指定した task type に builder がなければ BuildError::MissingRelations
pub struct AppBuilder {
    queue: Option<Arc<dyn TaskQueue>>,
    service: Option<Arc<dyn ProcessService>>,
    dispatcher: Option<Arc<dyn ExecutorDispatcher>>,
    config: RelayConfig,
    relations: RelationRegistry,
    expected_relations: Option<Vec<TaskType>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing component: {0}. Set it on the builder before build().")]
    MissingComponent(&'static str),

    #[error("Missing relation builders for task types: {0:?}")]
    MissingRelations(Vec<TaskType>),
}

impl AppBuilder {
    /// Starts from the default relation builders (SQL, DATAX, PROCEDURE).
    pub fn new() -> Self {
        Self {
            queue: None,
            service: None,
            dispatcher: None,
            config: RelayConfig::default(),
            relations: RelationRegistry::with_defaults(),
            expected_relations: None,
        }
    }

    pub fn queue(mut self, queue: Arc<dyn TaskQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn service(mut self, service: Arc<dyn ProcessService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn ExecutorDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a relation builder for a task type that has none yet.
    pub fn register_relation(
        mut self,
        task_type: TaskType,
        builder: Arc<dyn RelationBuilder>,
    ) -> Result<Self, RelayError> {
        self.relations.register(task_type, builder)?;
        Ok(self)
    }

    pub fn expect_relations(mut self, task_types: &[TaskType]) -> Self {
        self.expected_relations = Some(task_types.to_vec());
        self
    }

    pub fn build(self) -> Result<DispatchConsumer, BuildError> {
        if let Some(expected) = &self.expected_relations {
            let registered = self.relations.registered_types();
            let missing: Vec<TaskType> = expected
                .iter()
                .filter(|t| !registered.contains(t))
                .copied()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingRelations(missing));
            }
        }

        let queue = self.queue.ok_or(BuildError::MissingComponent("queue"))?;
        let service = self.service.ok_or(BuildError::MissingComponent("service"))?;
        let dispatcher = self
            .dispatcher
            .ok_or(BuildError::MissingComponent("dispatcher"))?;

        let resolver = ContextResolver::new(service, self.relations, self.config);
        Ok(DispatchConsumer::new(queue, resolver, dispatcher))
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
