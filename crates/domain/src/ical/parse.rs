//! External calendar feed parser.
//!
//! Converts one raw iCalendar document into normalized blocked date ranges
//! for a single property. Timestamps are projected to date-only values under
//! a single policy: values carrying an explicit UTC marker or offset are
//! converted to UTC first, naive and `TZID`-local values are taken as UTC as
//! written. This keeps midnight boundaries stable across sources.
//!
//! A malformed event is skipped and reported in the outcome's diagnostics; a
//! document without a `BEGIN:VCALENDAR` envelope is a fatal format error for
//! the whole sync attempt.

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::types::BlockedRange;
use crate::{KeystayError, Result};

/// Placeholder source label on freshly parsed ranges. The caller knows which
/// feed the document came from and stamps the real name afterward.
pub const PENDING_SOURCE: &str = "pending";

/// Parse result: the ranges that survived plus per-event skip diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedParseOutcome {
    pub ranges: Vec<BlockedRange>,
    pub skipped: Vec<SkippedEvent>,
}

/// One event that failed to parse inside an otherwise valid document.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEvent {
    pub external_id: String,
    pub reason: String,
}

/// Cheap sanity check that a fetched body resembles an iCalendar document.
pub fn looks_like_calendar(raw: &str) -> bool {
    raw.lines().any(|line| line.trim().eq_ignore_ascii_case("BEGIN:VCALENDAR"))
}

/// Parse one feed document into blocked ranges for `property_id`.
///
/// # Errors
/// Returns [`KeystayError::FeedFormat`] when the document has no calendar
/// envelope. The error message carries a count of date-bearing lines found
/// by a fallback scan, for diagnostics only; no events are fabricated from
/// it.
pub fn parse_feed(raw: &str, property_id: &str) -> Result<FeedParseOutcome> {
    let lines = unfold_lines(raw);

    if !lines.iter().any(|line| line.trim().eq_ignore_ascii_case("BEGIN:VCALENDAR")) {
        let date_lines = count_date_bearing_lines(&lines);
        return Err(KeystayError::FeedFormat(format!(
            "document is not an iCalendar feed ({date_lines} date-bearing lines present)"
        )));
    }

    let mut ranges = Vec::new();
    let mut skipped = Vec::new();
    let mut ordinal = 0usize;
    let mut current: Option<RawEvent> = None;

    for line in &lines {
        let trimmed = line.trim_end();
        if trimmed.eq_ignore_ascii_case("BEGIN:VEVENT") {
            // An unterminated previous event is dropped rather than merged.
            current = Some(RawEvent::default());
            continue;
        }
        if trimmed.eq_ignore_ascii_case("END:VEVENT") {
            if let Some(event) = current.take() {
                ordinal += 1;
                match event.finalize(property_id, ordinal) {
                    Ok(range) => ranges.push(range),
                    Err(skip) => skipped.push(skip),
                }
            }
            continue;
        }
        if let Some(event) = current.as_mut() {
            event.absorb(trimmed);
        }
    }

    Ok(FeedParseOutcome { ranges, skipped })
}

/// One VEVENT's raw properties before date projection.
#[derive(Debug, Default)]
struct RawEvent {
    dtstart: Option<String>,
    dtend: Option<String>,
    summary: Option<String>,
    uid: Option<String>,
}

impl RawEvent {
    fn absorb(&mut self, line: &str) {
        let Some((name_part, value)) = line.split_once(':') else {
            return;
        };
        // Property parameters (VALUE=DATE, TZID=...) don't change the
        // projection policy, so only the property name matters.
        let name = name_part.split(';').next().unwrap_or(name_part).to_ascii_uppercase();

        match name.as_str() {
            "DTSTART" => self.dtstart = Some(value.trim().to_string()),
            "DTEND" => self.dtend = Some(value.trim().to_string()),
            "SUMMARY" => self.summary = Some(unescape_text(value.trim())),
            "UID" => self.uid = Some(value.trim().to_string()),
            _ => {}
        }
    }

    fn finalize(
        self,
        property_id: &str,
        ordinal: usize,
    ) -> std::result::Result<BlockedRange, SkippedEvent> {
        // Sources that omit UID still need a stable handle for diagnostics.
        let external_id =
            self.uid.filter(|uid| !uid.is_empty()).unwrap_or_else(|| format!("event-{ordinal}"));

        let skip = |reason: String| SkippedEvent { external_id: external_id.clone(), reason };

        let start_value = self.dtstart.ok_or_else(|| skip("missing DTSTART".into()))?;
        let start = project_date(&start_value).map_err(|e| skip(format!("DTSTART: {e}")))?;

        let end = match self.dtend {
            Some(value) => project_date(&value).map_err(|e| skip(format!("DTEND: {e}")))?,
            // RFC 5545 default for an all-day event without DTEND.
            None => start
                .checked_add_days(Days::new(1))
                .ok_or_else(|| skip("DTSTART out of range".into()))?,
        };

        if end < start {
            return Err(skip(format!("DTEND {end} precedes DTSTART {start}")));
        }

        Ok(BlockedRange {
            property_id: property_id.to_string(),
            start_date: start,
            end_date: end,
            source_name: PENDING_SOURCE.to_string(),
            external_id,
            summary: self.summary,
        })
    }
}

/// Project an iCalendar date or date-time value to a UTC calendar date.
fn project_date(value: &str) -> std::result::Result<NaiveDate, String> {
    let trimmed = value.trim();

    if trimmed.len() == 8 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(trimmed, "%Y%m%d")
            .map_err(|e| format!("invalid date '{trimmed}': {e}"));
    }

    if let Some((date_part, time_part)) = trimmed.split_once('T') {
        if time_part.contains('+') || time_part.contains('-') {
            return DateTime::parse_from_str(trimmed, "%Y%m%dT%H%M%S%z")
                .map(|dt| dt.with_timezone(&Utc).date_naive())
                .map_err(|e| format!("invalid offset timestamp '{trimmed}': {e}"));
        }
        // Trailing Z is already UTC; naive values are taken as UTC as
        // written. Either way the literal date portion is the projection.
        return NaiveDate::parse_from_str(date_part, "%Y%m%d")
            .map_err(|e| format!("invalid timestamp '{trimmed}': {e}"));
    }

    Err(format!("unrecognized date value '{trimmed}'"))
}

/// Join folded continuation lines (RFC 5545 §3.1: CRLF followed by a space
/// or tab continues the previous line).
fn unfold_lines(raw: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    for line in raw.split(['\n']) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(rest) = line.strip_prefix([' ', '\t']) {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        lines.push(line.to_string());
    }

    lines
}

fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') | Some('N') => out.push('\n'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Count lines that carry something shaped like a YYYYMMDD date, for the
/// fallback diagnostic when the envelope is missing.
fn count_date_bearing_lines(lines: &[String]) -> usize {
    lines.iter().filter(|line| line_has_date_token(line)).count()
}

fn line_has_date_token(line: &str) -> bool {
    let bytes = line.as_bytes();
    let mut run = 0usize;
    for (idx, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            run += 1;
            if run >= 8 {
                let start = idx + 1 - 8;
                if let Ok(token) = std::str::from_utf8(&bytes[start..idx + 1]) {
                    if NaiveDate::parse_from_str(token, "%Y%m%d").is_ok() {
                        return true;
                    }
                }
            }
        } else {
            run = 0;
        }
    }
    false
}
