//! Calendar export builder.
//!
//! Emits the property-level iCalendar document third parties subscribe to:
//! one all-day VEVENT per blocked range, half-open `DTEND`, folded to RFC
//! 5545 line length. The ranges come from the availability resolver so the
//! export always agrees with what a booking attempt would see.

use chrono::{DateTime, NaiveDate, Utc};

const PRODID: &str = "-//Keystay//Availability Export//EN";
const FOLD_LIMIT: usize = 75;

/// Build the export document for a property.
///
/// `ranges` are half-open `[start, end)` blocked ranges; `generated_at` is
/// stamped into `DTSTAMP` (passed in so the builder stays pure).
pub fn build_calendar(
    property_id: &str,
    property_label: &str,
    ranges: &[(NaiveDate, NaiveDate)],
    generated_at: DateTime<Utc>,
) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(8 + ranges.len() * 7);

    lines.push("BEGIN:VCALENDAR".into());
    lines.push("VERSION:2.0".into());
    lines.push(format!("PRODID:{PRODID}"));
    lines.push("CALSCALE:GREGORIAN".into());
    lines.push("METHOD:PUBLISH".into());
    lines.push(format!("X-WR-CALNAME:{}", escape_text(property_label)));

    let stamp = generated_at.format("%Y%m%dT%H%M%SZ");

    for (start, end) in ranges {
        lines.push("BEGIN:VEVENT".into());
        lines.push(format!("UID:{property_id}-{}@keystay", start.format("%Y%m%d")));
        lines.push(format!("DTSTAMP:{stamp}"));
        lines.push(format!("DTSTART;VALUE=DATE:{}", start.format("%Y%m%d")));
        lines.push(format!("DTEND;VALUE=DATE:{}", end.format("%Y%m%d")));
        lines.push(format!("SUMMARY:{} (Not available)", escape_text(property_label)));
        lines.push("END:VEVENT".into());
    }

    lines.push("END:VCALENDAR".into());

    let mut out = String::new();
    for line in &lines {
        fold_into(&mut out, line);
    }
    out
}

/// Escape TEXT values per RFC 5545 §3.3.11.
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Append `line` to `out`, folding at 75 octets with a space continuation.
fn fold_into(out: &mut String, line: &str) {
    let mut limit = FOLD_LIMIT;
    let mut used = 0usize;

    for c in line.chars() {
        let width = c.len_utf8();
        if used + width > limit {
            out.push_str("\r\n ");
            // Continuation lines lose one octet to the leading space.
            limit = FOLD_LIMIT - 1;
            used = 0;
        }
        out.push(c);
        used += width;
    }
    out.push_str("\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ical::parse::parse_feed;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn stamp() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-04-10T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn emits_one_event_per_range() {
        let ranges = vec![(d(2024, 5, 1), d(2024, 5, 4)), (d(2024, 6, 10), d(2024, 6, 12))];
        let ics = build_calendar("prop-1", "Sea Cottage", &ranges, stamp());

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.contains("DTSTART;VALUE=DATE:20240501\r\n"));
        assert!(ics.contains("DTEND;VALUE=DATE:20240504\r\n"));
        assert!(ics.contains("UID:prop-1-20240610@keystay\r\n"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn export_round_trips_through_the_parser() {
        let ranges = vec![(d(2024, 5, 1), d(2024, 5, 4)), (d(2024, 7, 1), d(2024, 7, 2))];
        let ics = build_calendar("prop-1", "Sea Cottage", &ranges, stamp());

        let outcome = parse_feed(&ics, "prop-1").unwrap();
        assert!(outcome.skipped.is_empty());
        let got: Vec<_> =
            outcome.ranges.iter().map(|r| (r.start_date, r.end_date)).collect();
        assert_eq!(got, ranges);
    }

    #[test]
    fn long_lines_are_folded_within_limit() {
        let label = "An extremely verbose property label that certainly exceeds the \
                     seventy-five octet line limit of the calendar format";
        let ics = build_calendar("prop-1", label, &[(d(2024, 5, 1), d(2024, 5, 2))], stamp());

        for line in ics.split("\r\n") {
            assert!(line.len() <= FOLD_LIMIT, "line too long: {line:?}");
        }
        // And the folded summary still unfolds to the original text.
        let outcome = parse_feed(&ics, "prop-1").unwrap();
        assert_eq!(
            outcome.ranges[0].summary.as_deref(),
            Some(format!("{label} (Not available)").as_str())
        );
    }

    #[test]
    fn label_special_characters_are_escaped() {
        let ics =
            build_calendar("prop-1", "Flat 2; sea view, central", &[(d(2024, 5, 1), d(2024, 5, 2))], stamp());
        assert!(ics.contains("SUMMARY:Flat 2\\; sea view\\, central (Not available)"));
    }
}
