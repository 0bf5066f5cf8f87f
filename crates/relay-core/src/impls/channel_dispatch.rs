//! ChannelDispatcher - worker group ごとの mpsc チャネルへ配送する
//!
//! Stand-in for a network dispatcher: each registered group owns the sending
//! half of a bounded channel and a worker process drains the receiver.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{ExecutionRequest, ExecutorType};
use crate::ports::{DispatchError, ExecutorDispatcher};

#[derive(Debug, Default)]
pub struct ChannelDispatcher {
    groups: HashMap<String, mpsc::Sender<ExecutionRequest>>,
}

impl ChannelDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `group` and returns the receiver its workers read from.
    /// Re-registering a group replaces the previous channel.
    pub fn register_group(
        &mut self,
        group: impl Into<String>,
        capacity: usize,
    ) -> mpsc::Receiver<ExecutionRequest> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.groups.insert(group.into(), tx);
        rx
    }
}

#[async_trait]
impl ExecutorDispatcher for ChannelDispatcher {
    async fn dispatch(&self, request: ExecutionRequest) -> Result<bool, DispatchError> {
        if request.executor_type != ExecutorType::Worker {
            return Err(DispatchError::UnsupportedExecutor(request.executor_type));
        }
        let sender = self
            .groups
            .get(&request.worker_group)
            .ok_or_else(|| DispatchError::UnknownWorkerGroup(request.worker_group.clone()))?;

        sender
            .send(request)
            .await
            .map_err(|e| DispatchError::Transport(format!("worker channel closed: {e}")))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_context;

    #[tokio::test]
    async fn delivers_to_the_named_group() {
        let mut dispatcher = ChannelDispatcher::new();
        let mut rx = dispatcher.register_group("default", 4);

        let request = ExecutionRequest::for_worker(&sample_context()).unwrap();
        let opaque = request.command.opaque;
        assert!(dispatcher.dispatch(request).await.unwrap());

        let received = rx.recv().await.unwrap();
        assert_eq!(received.command.opaque, opaque);
    }

    #[tokio::test]
    async fn unknown_group_is_an_error() {
        let dispatcher = ChannelDispatcher::new();
        let request = ExecutionRequest::for_worker(&sample_context()).unwrap();
        let err = dispatcher.dispatch(request).await.unwrap_err();
        assert!(matches!(err, DispatchError::UnknownWorkerGroup(group) if group == "default"));
    }

    #[tokio::test]
    async fn client_executor_is_unsupported() {
        let mut dispatcher = ChannelDispatcher::new();
        let _rx = dispatcher.register_group("default", 1);
        let mut request = ExecutionRequest::for_worker(&sample_context()).unwrap();
        request.executor_type = ExecutorType::Client;

        let err = dispatcher.dispatch(request).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::UnsupportedExecutor(ExecutorType::Client)
        ));
    }

    #[tokio::test]
    async fn closed_channel_is_a_transport_error() {
        let mut dispatcher = ChannelDispatcher::new();
        drop(dispatcher.register_group("default", 1));

        let request = ExecutionRequest::for_worker(&sample_context()).unwrap();
        let err = dispatcher.dispatch(request).await.unwrap_err();
        assert!(matches!(err, DispatchError::Transport(_)));
    }
}
