//! Domain identifiers (strongly-typed numeric IDs).
//!
//! Every record the relay reads is keyed by a database integer. `Id<T>` keeps
//! those integers apart at compile time: a `DataSourceId` cannot be passed
//! where a `ResourceId` is expected, even though both are `i64` on the wire.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::num::ParseIntError;
use std::str::FromStr;

/// Marker trait for each id kind.
///
/// Provides the prefix used by `Display` ("task-", "tenant-", ...).
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// Generic numeric id.
///
/// Serializes as the bare integer so records round-trip through the same
/// JSON the upstream scheduler produces.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T: IdMarker> {
    value: i64,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub const fn new(value: i64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub const fn get(&self) -> i64 {
        self.value
    }
}

impl<T: IdMarker> From<i64> for Id<T> {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> FromStr for Id<T> {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self::new)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.value)
    }
}

impl<T: IdMarker> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.value)
    }
}

impl<'de, T: IdMarker> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::new)
    }
}

macro_rules! id_marker {
    ($(#[$doc:meta])* $marker:ident, $alias:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $marker {}

        impl IdMarker for $marker {
            fn prefix() -> &'static str {
                $prefix
            }
        }

        $(#[$doc])*
        pub type $alias = Id<$marker>;
    };
}

id_marker!(
    /// Identifier of one task run record.
    TaskInstance, TaskInstanceId, "task-"
);
id_marker!(
    /// Identifier of a workflow run.
    ProcessInstance, ProcessInstanceId, "process-"
);
id_marker!(ProcessDefinition, ProcessDefinitionId, "definition-");
id_marker!(Project, ProjectId, "project-");
id_marker!(Tenant, TenantId, "tenant-");
id_marker!(User, UserId, "user-");
id_marker!(DataSource, DataSourceId, "datasource-");
id_marker!(Resource, ResourceId, "resource-");
id_marker!(UdfFunc, UdfFuncId, "udf-");
