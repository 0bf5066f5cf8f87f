//! App - アプリケーション層
//!
//! ports を組み合わせて relay のロジックを実装します。
//!
//! # 主要コンポーネント
//! - **ContextResolver**: TaskReference → ExecutionContext
//! - **RelationRegistry**: task type ごとの依存解決（SQL / DATAX / PROCEDURE）
//! - **ResourceResolver**: 参照リソースの重複排除と名前解決
//! - **DispatchConsumer**: take → resolve → dispatch のループ
//! - **AppBuilder**: ワイヤリング

pub mod builder;
pub mod consumer;
pub mod relation;
pub mod resolver;
pub mod resources;

pub use self::builder::{AppBuilder, BuildError};
pub use self::consumer::{ConsumerHandle, DispatchConsumer, DispatchOutcome};
pub use self::relation::{
    DataxRelation, ProcedureRelation, RelationBuilder, RelationRegistry, SqlRelation,
};
pub use self::resolver::ContextResolver;
pub use self::resources::ResourceResolver;
