use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_core::domain::{ExecutionRequest, TaskReference};
use relay_core::impls::{InMemoryProcessService, InMemoryTaskQueue, ServiceSnapshot};
use relay_core::ports::{DispatchError, ExecutorDispatcher, TaskQueue};
use relay_core::{AppBuilder, RelayConfig};

const IDLE_POLL: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Resolve ready tasks from a fixture and print their execution requests", long_about = None)]
struct Cli {
    /// JSON fixture with records and ready task references
    #[arg(short, long)]
    fixture: PathBuf,

    /// Stop once the queue is drained instead of waiting for Ctrl-C
    #[arg(long)]
    exit_when_idle: bool,
}

/// Records plus the queue contents to seed.
///
/// When `ready` is empty every task instance in the fixture is enqueued.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixture {
    #[serde(flatten)]
    records: ServiceSnapshot,
    #[serde(default)]
    ready: Vec<String>,
}

impl Fixture {
    fn references(&self, default_group: &str) -> Result<Vec<TaskReference>> {
        if !self.ready.is_empty() {
            return self
                .ready
                .iter()
                .map(|raw| TaskReference::parse(raw).with_context(|| format!("ready entry {raw}")))
                .collect();
        }

        Ok(self
            .records
            .task_instances
            .iter()
            .map(|task| {
                let process_priority = self
                    .records
                    .process_instances
                    .iter()
                    .find(|p| p.id == task.process_instance_id)
                    .map(|p| p.priority)
                    .unwrap_or_default();
                TaskReference {
                    process_priority,
                    process_instance_id: task.process_instance_id,
                    task_priority: task.priority,
                    task_instance_id: task.id,
                    submit_time: task.submit_time.unwrap_or_else(Utc::now),
                    worker_group: task
                        .worker_group
                        .clone()
                        .unwrap_or_else(|| default_group.to_string()),
                }
            })
            .collect())
    }
}

/// Prints each request as one JSON line.
struct StdoutDispatcher;

#[async_trait]
impl ExecutorDispatcher for StdoutDispatcher {
    async fn dispatch(&self, request: ExecutionRequest) -> Result<bool, DispatchError> {
        let line = serde_json::to_string(&request)
            .map_err(|e| DispatchError::Transport(format!("encode request: {e}")))?;
        println!("{line}");
        Ok(true)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_core=info,relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = RelayConfig::from_env()?;

    let raw = std::fs::read_to_string(&cli.fixture)
        .with_context(|| format!("reading fixture {}", cli.fixture.display()))?;
    let fixture: Fixture = serde_json::from_str(&raw)
        .with_context(|| format!("parsing fixture {}", cli.fixture.display()))?;

    let queue = InMemoryTaskQueue::new();
    for reference in fixture.references(&config.default_worker_group)? {
        queue.put(reference).await?;
    }
    let ready = queue.len().await;
    tracing::info!(
        ready,
        exec_base_dir = %config.exec_base_dir.display(),
        resource_policy = %config.resource_policy,
        "fixture loaded"
    );

    let consumer = AppBuilder::new()
        .queue(Arc::new(queue.clone()))
        .service(Arc::new(InMemoryProcessService::from_snapshot(
            fixture.records,
        )))
        .dispatcher(Arc::new(StdoutDispatcher))
        .config(config)
        .build()?;
    let handle = consumer.start();

    if cli.exit_when_idle {
        while !queue.is_empty().await {
            tokio::time::sleep(IDLE_POLL).await;
        }
    } else {
        tokio::signal::ctrl_c()
            .await
            .context("waiting for Ctrl-C")?;
    }

    handle.stop_and_join().await;
    Ok(())
}
