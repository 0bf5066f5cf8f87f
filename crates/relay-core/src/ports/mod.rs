//! Ports - seams to the relay's three collaborators.
//!
//! - TaskQueue: where ready tasks come from
//! - ProcessService: records the resolver reads and the one status write
//! - ExecutorDispatcher: where execution requests go

pub mod dispatcher;
pub mod process_service;
pub mod task_queue;

pub use self::dispatcher::{DispatchError, ExecutorDispatcher};
pub use self::process_service::{ProcessService, ServiceError};
pub use self::task_queue::{QueueError, TaskQueue};
