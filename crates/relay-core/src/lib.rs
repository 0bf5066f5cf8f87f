//! relay-core
//!
//! Core building blocks for the task dispatch relay: take a ready task from
//! the priority queue, resolve everything a worker needs to run it, and hand
//! it to a worker group.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task records, params, context, command, errors）
//! - **ports**: 抽象化レイヤー（TaskQueue, ProcessService, ExecutorDispatcher）
//! - **impls**: 実装（InMemoryTaskQueue, InMemoryProcessService, ChannelDispatcher）
//! - **app**: アプリケーションロジック（resolver, relation, resources, consumer, builder）
//! - **config**: 環境変数からの設定

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

#[cfg(test)]
pub(crate) mod test_support;

pub use app::{AppBuilder, ConsumerHandle, DispatchConsumer, DispatchOutcome};
pub use config::{RelayConfig, ResourcePolicy};
pub use domain::{ErrorKind, RelayError};
