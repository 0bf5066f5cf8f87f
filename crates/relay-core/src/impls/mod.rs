//! Impls - in-process implementations of the ports (development and tests).

pub mod channel_dispatch;
pub mod inmem_process;
pub mod inmem_queue;

pub use self::channel_dispatch::ChannelDispatcher;
pub use self::inmem_process::{InMemoryProcessService, ServiceSnapshot};
pub use self::inmem_queue::InMemoryTaskQueue;
