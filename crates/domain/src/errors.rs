//! Error types used throughout the engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Keystay
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum KeystayError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feed fetch error: {0}")]
    FeedFetch(String),

    #[error("Feed format error: {0}")]
    FeedFormat(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dates unavailable: conflicts with existing booking [{conflict_start}, {conflict_end})")]
    DatesUnavailable { conflict_start: NaiveDate, conflict_end: NaiveDate },

    #[error("Bulk apply incomplete: {applied} of {requested} dates written")]
    BulkApplyPartial { applied: usize, requested: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Keystay operations
pub type Result<T> = std::result::Result<T, KeystayError>;
