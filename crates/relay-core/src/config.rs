//! Relay configuration loaded from environment variables.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::{
    ProcessDefinitionId, ProcessInstanceId, ProjectId, RelayError, TaskInstanceId,
};

/// What to do when a referenced resource id does not resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResourcePolicy {
    /// Drop the id and carry on with the names that did resolve.
    #[default]
    Lenient,
    /// Fail resolution with `RelayError::MissingResources`.
    Strict,
}

impl FromStr for ResourcePolicy {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(ResourcePolicy::Lenient),
            "strict" => Ok(ResourcePolicy::Strict),
            other => Err(RelayError::Config(format!(
                "RELAY_RESOURCE_POLICY must be 'lenient' or 'strict', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ResourcePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourcePolicy::Lenient => f.write_str("lenient"),
            ResourcePolicy::Strict => f.write_str("strict"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Root of per-task execution directories.
    pub exec_base_dir: PathBuf,
    pub resource_policy: ResourcePolicy,
    /// Worker group for tasks that declare none.
    pub default_worker_group: String,
}

const DEFAULT_EXEC_BASE_DIR: &str = "/tmp/relay/exec";
const DEFAULT_WORKER_GROUP: &str = "default";

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            exec_base_dir: PathBuf::from(DEFAULT_EXEC_BASE_DIR),
            resource_policy: ResourcePolicy::default(),
            default_worker_group: DEFAULT_WORKER_GROUP.to_string(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default           |
    /// |------------------------------|-------------------|
    /// | `RELAY_EXEC_BASE_DIR`        | `/tmp/relay/exec` |
    /// | `RELAY_RESOURCE_POLICY`      | `lenient`         |
    /// | `RELAY_DEFAULT_WORKER_GROUP` | `default`         |
    pub fn from_env() -> Result<Self, RelayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RelayError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let exec_base_dir = non_empty("RELAY_EXEC_BASE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXEC_BASE_DIR));

        let resource_policy = match non_empty("RELAY_RESOURCE_POLICY") {
            Some(raw) => raw.parse()?,
            None => ResourcePolicy::default(),
        };

        let default_worker_group = non_empty("RELAY_DEFAULT_WORKER_GROUP")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| DEFAULT_WORKER_GROUP.to_string());

        Ok(Self {
            exec_base_dir,
            resource_policy,
            default_worker_group,
        })
    }

    /// `{base}/{project}/{definition}/{process instance}/{task instance}`.
    ///
    /// Unique per task instance id; the same ids always give the same path.
    pub fn execute_path(
        &self,
        project_id: ProjectId,
        process_definition_id: ProcessDefinitionId,
        process_instance_id: ProcessInstanceId,
        task_instance_id: TaskInstanceId,
    ) -> String {
        self.exec_base_dir
            .join(project_id.get().to_string())
            .join(process_definition_id.get().to_string())
            .join(process_instance_id.get().to_string())
            .join(task_instance_id.get().to_string())
            .to_string_lossy()
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = RelayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RelayConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("RELAY_EXEC_BASE_DIR", "/data/exec"),
            ("RELAY_RESOURCE_POLICY", "Strict"),
            ("RELAY_DEFAULT_WORKER_GROUP", "etl"),
        ]))
        .unwrap();
        assert_eq!(config.exec_base_dir, PathBuf::from("/data/exec"));
        assert_eq!(config.resource_policy, ResourcePolicy::Strict);
        assert_eq!(config.default_worker_group, "etl");
    }

    #[test]
    fn bad_policy_is_a_config_error() {
        let err =
            RelayConfig::from_lookup(lookup(&[("RELAY_RESOURCE_POLICY", "sometimes")])).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[test]
    fn execute_path_layout() {
        let config = RelayConfig::default();
        let path = config.execute_path(
            ProjectId::new(1),
            ProcessDefinitionId::new(2),
            ProcessInstanceId::new(3),
            TaskInstanceId::new(4),
        );
        assert_eq!(path, "/tmp/relay/exec/1/2/3/4");
    }
}
