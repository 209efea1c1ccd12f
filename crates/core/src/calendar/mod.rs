//! Calendar administration

pub mod ports;
pub mod service;

pub use service::{CalendarAdminService, DayOverride, DefaultPolicy};
