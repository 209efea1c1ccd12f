//! # Keystay Domain
//!
//! Business domain types and models for the Keystay booking engine.
//!
//! This crate contains:
//! - Domain data types (CalendarDay, Booking, ExternalCalendarFeed, etc.)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Half-open date-range arithmetic
//! - The pure iCalendar feed parser and export builder
//!
//! ## Architecture
//! - No dependencies on other Keystay crates
//! - Only external dependencies allowed
//! - Pure domain models, no I/O

pub mod config;
pub mod constants;
pub mod dates;
pub mod errors;
pub mod ical;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
// Re-export the feed parser surface
pub use ical::build::build_calendar;
pub use ical::parse::{parse_feed, FeedParseOutcome};
