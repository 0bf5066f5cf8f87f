//! Queue token for a ready-to-run task.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::errors::RelayError;
use super::ids::{ProcessInstanceId, TaskInstanceId};
use super::task::Priority;

/// A ready task as the priority queue carries it.
///
/// Text form: `{processPriority}_{processInstanceId}_{taskPriority}_{taskInstanceId}_{submitMillis}_{workerGroup}`.
/// The worker group is the remainder, so it may itself contain `_`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReference {
    pub process_priority: Priority,
    pub process_instance_id: ProcessInstanceId,
    pub task_priority: Priority,
    pub task_instance_id: TaskInstanceId,
    pub submit_time: DateTime<Utc>,
    pub worker_group: String,
}

impl TaskReference {
    pub fn encode(&self) -> String {
        format!(
            "{}_{}_{}_{}_{}_{}",
            self.process_priority.code(),
            self.process_instance_id.get(),
            self.task_priority.code(),
            self.task_instance_id.get(),
            self.submit_time.timestamp_millis(),
            self.worker_group,
        )
    }

    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        let invalid = || RelayError::InvalidTaskReference(raw.to_string());

        let parts: Vec<&str> = raw.splitn(6, '_').collect();
        let [process_priority, process_instance_id, task_priority, task_instance_id, submit, group] =
            parts.as_slice()
        else {
            return Err(invalid());
        };

        let priority = |s: &str| {
            s.parse::<u8>()
                .ok()
                .and_then(Priority::from_code)
                .ok_or_else(invalid)
        };
        let millis: i64 = submit.parse().map_err(|_| invalid())?;

        Ok(Self {
            process_priority: priority(*process_priority)?,
            process_instance_id: process_instance_id.parse().map_err(|_| invalid())?,
            task_priority: priority(*task_priority)?,
            task_instance_id: task_instance_id.parse().map_err(|_| invalid())?,
            submit_time: Utc
                .timestamp_millis_opt(millis)
                .single()
                .ok_or_else(invalid)?,
            worker_group: (*group).to_string(),
        })
    }
}

impl fmt::Display for TaskReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for TaskReference {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Smaller sorts first: the queue hands out the minimum.
impl Ord for TaskReference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.process_priority
            .cmp(&other.process_priority)
            .then_with(|| self.process_instance_id.cmp(&other.process_instance_id))
            .then_with(|| self.task_priority.cmp(&other.task_priority))
            .then_with(|| self.submit_time.cmp(&other.submit_time))
            .then_with(|| self.task_instance_id.cmp(&other.task_instance_id))
            .then_with(|| self.worker_group.cmp(&other.worker_group))
    }
}

impl PartialOrd for TaskReference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
