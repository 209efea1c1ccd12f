//! External feed synchronization

pub mod ports;
pub mod service;

pub use service::{FeedSyncService, PropertySyncReport};
