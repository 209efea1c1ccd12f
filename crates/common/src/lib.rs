//! # Keystay Common
//!
//! Shared infrastructure plumbing with no business logic.
//!
//! This crate contains:
//! - Pooled SQLite storage (r2d2 + rusqlite) with connection pragmas
//! - Storage error types and lightweight pool metrics
//!
//! ## Architecture
//! - No dependencies on other Keystay crates
//! - Knows nothing about calendars, bookings, or feeds

pub mod storage;

pub use storage::{SqlitePool, SqlitePoolConfig, StorageError, StorageResult, StoreConnection};
