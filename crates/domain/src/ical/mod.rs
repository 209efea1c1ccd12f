//! iCalendar feed parsing and export building.
//!
//! `parse` turns one external feed document into normalized blocked ranges;
//! `build` emits the mirror-direction export document. Both are pure and
//! share the same UTC date-projection policy so a document round-trips.

pub mod build;
pub mod parse;

pub use build::build_calendar;
pub use parse::{looks_like_calendar, parse_feed, FeedParseOutcome, SkippedEvent};
