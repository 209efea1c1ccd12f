//! Scheduling infrastructure for recurring feed synchronization
//!
//! One worker task per registered property, owned by an explicit registry
//! rather than ambient timers. All workers follow the same runtime rules:
//! - Explicit lifecycle management (register/deregister/shutdown)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout wrapping on every sync cycle

pub mod error;
pub mod registry;

pub use error::{SchedulerError, SchedulerResult};
pub use registry::{SyncRegistry, SyncRegistryConfig};
