//! Fetching and normalizing iCalendar feeds.
//!
//! A feed either fails as a whole (bad URL, transport error, non-2xx status,
//! body that is not iCalendar) or yields the subset of its VEVENTs that carry
//! a usable start date and a category keyword. Individual broken entries are
//! skipped, never fatal.

use super::models::{CalendarEvent, EventCategory};
use crate::error::{fetch_error, BotResult};
use chrono::NaiveDate;
use ical::parser::ical::component::IcalEvent;
use reqwest::Client;
use tracing::debug;
use url::Url;

/// Check that a feed URL is an absolute http(s) URL
pub fn validate_url(raw: &str) -> BotResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| fetch_error(&format!("Invalid URL {}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(fetch_error(&format!("Unsupported URL scheme: {}", scheme))),
    }
}

/// Download a feed and parse it into categorized events
pub async fn fetch_calendar(client: &Client, raw_url: &str) -> BotResult<Vec<CalendarEvent>> {
    let url = validate_url(raw_url)?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_error(&format!("Failed to fetch calendar: {}", e)))?;

    if !response.status().is_success() {
        return Err(fetch_error(&format!(
            "Failed to fetch calendar: HTTP {}",
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| fetch_error(&format!("Failed to read calendar body: {}", e)))?;

    parse_calendar(&body)
}

/// Parse iCalendar text into categorized events, in feed order.
///
/// Each VEVENT is parsed on its own, so a malformed or truncated entry only
/// loses that entry. Only a body without any VCALENDAR fails as a whole.
pub fn parse_calendar(text: &str) -> BotResult<Vec<CalendarEvent>> {
    let blocks = split_calendar(text)
        .ok_or_else(|| fetch_error("Response contained no calendar"))?;

    let mut events = Vec::new();
    for block in blocks {
        let wrapped = format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n{}END:VCALENDAR\r\n", block);
        let calendar = match ical::IcalParser::new(wrapped.as_bytes()).next() {
            Some(Ok(calendar)) => calendar,
            Some(Err(e)) => {
                debug!("Skipping malformed calendar entry: {}", e);
                continue;
            }
            None => continue,
        };

        for vevent in &calendar.events {
            match normalize_event(vevent) {
                Some(event) => events.push(event),
                None => debug!("Skipping calendar entry {:?}", property(vevent, "SUMMARY")),
            }
        }
    }

    Ok(events)
}

/// Cut a feed into complete `BEGIN:VEVENT`..`END:VEVENT` blocks.
///
/// Returns `None` when there is no `BEGIN:VCALENDAR` line at all. Unterminated
/// blocks are dropped.
fn split_calendar(text: &str) -> Option<Vec<String>> {
    let mut seen_calendar = false;
    let mut blocks = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        let marker = line.trim();

        if marker.eq_ignore_ascii_case("BEGIN:VCALENDAR") {
            seen_calendar = true;
        } else if marker.eq_ignore_ascii_case("BEGIN:VEVENT") {
            if current.is_some() {
                debug!("Dropping calendar entry without END:VEVENT");
            }
            current = Some(String::from("BEGIN:VEVENT\r\n"));
        } else if marker.eq_ignore_ascii_case("END:VEVENT") {
            if let Some(mut block) = current.take() {
                block.push_str("END:VEVENT\r\n");
                blocks.push(block);
            }
        } else if marker.eq_ignore_ascii_case("END:VCALENDAR") {
            if current.take().is_some() {
                debug!("Dropping calendar entry without END:VEVENT");
            }
        } else if let Some(block) = current.as_mut() {
            block.push_str(line);
            block.push_str("\r\n");
        }
    }

    if current.is_some() {
        debug!("Dropping calendar entry without END:VEVENT");
    }

    seen_calendar.then_some(blocks)
}

/// Turn one VEVENT into a `CalendarEvent`, or `None` if it is unusable or uncategorized
fn normalize_event(vevent: &IcalEvent) -> Option<CalendarEvent> {
    let summary = property(vevent, "SUMMARY").map(unescape_text)?;
    let description = property(vevent, "DESCRIPTION").map(unescape_text);

    let category = EventCategory::classify(&summary)
        .or_else(|| description.as_deref().and_then(EventCategory::classify))?;

    let date = property(vevent, "DTSTART").and_then(parse_ical_date)?;

    Some(CalendarEvent {
        date,
        category,
        label: summary.trim().to_string(),
    })
}

fn property<'a>(vevent: &'a IcalEvent, name: &str) -> Option<&'a str> {
    vevent
        .properties
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .and_then(|p| p.value.as_deref())
}

/// Date part of a DTSTART value: `YYYYMMDD`, `YYYYMMDDTHHMMSS` or `YYYYMMDDTHHMMSSZ`
fn parse_ical_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = value.get(..8)?;
    if value.len() > 8 && !value[8..].starts_with('T') {
        return None;
    }
    NaiveDate::parse_from_str(date_part, "%Y%m%d").ok()
}

/// Undo iCalendar TEXT escaping
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//School//Calendar//EN\r\n\
BEGIN:VEVENT\r\n\
UID:1\r\n\
SUMMARY:Dress Day - Winter Formal\r\n\
DTSTART;VALUE=DATE:20251201\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:2\r\n\
SUMMARY:Hall: Grade 9 Assembly\r\n\
DTSTART:20251202T080000Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:3\r\n\
SUMMARY:Math Test\r\n\
DTSTART;VALUE=DATE:20251203\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:4\r\n\
SUMMARY:Late Start\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:5\r\n\
SUMMARY:Late Start\r\n\
DTSTART;VALUE=DATE:notadate\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:6\r\n\
SUMMARY:Period 2\\, 3\r\n\
DESCRIPTION:Extended Homeroom for all grades\r\n\
DTSTART;VALUE=DATE:20251204\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_and_categorizes_events() {
        let events = parse_calendar(FEED).unwrap();
        assert_eq!(events.len(), 3);

        assert_eq!(events[0].category, EventCategory::DressDay);
        assert_eq!(events[0].date, date(2025, 12, 1));
        assert_eq!(events[0].label, "Dress Day - Winter Formal");

        assert_eq!(events[1].category, EventCategory::Hall);
        assert_eq!(events[1].date, date(2025, 12, 2));

        // Categorized by its description, label keeps the summary
        assert_eq!(events[2].category, EventCategory::ExtendedHomeroom);
        assert_eq!(events[2].label, "Period 2, 3");
    }

    #[test]
    fn broken_entries_do_not_sink_the_feed() {
        let feed = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Dress Day\r\n\
DTSTART;VALUE=DATE:20251201\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Late Start\r\n\
GARBAGE LINE WITHOUT COLON\r\n\
DTSTART;VALUE=DATE:20251202\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Hall: Grade 9 Assembly\r\n\
DTSTART;VALUE=DATE:20251203\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Late Start\r\n\
DTSTART;VALUE=DATE:20251204\r\n\
END:VCALENDAR\r\n";

        let events = parse_calendar(feed).unwrap();
        let labels: Vec<&str> = events.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Dress Day", "Hall: Grade 9 Assembly"]);
    }

    #[test]
    fn folded_lines_survive_splitting() {
        let feed = "BEGIN:VCALENDAR\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Extended \r\n Homeroom\r\n\
DTSTART:20251205T090000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let events = parse_calendar(feed).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].category, EventCategory::ExtendedHomeroom);
        assert_eq!(events[0].date, date(2025, 12, 5));
    }

    #[test]
    fn rejects_non_calendar_bodies() {
        assert!(parse_calendar("").is_err());
        assert!(parse_calendar("hello world").is_err());
    }

    #[test]
    fn empty_calendar_is_valid() {
        let events = parse_calendar("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR\r\n").unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn ical_dates() {
        assert_eq!(parse_ical_date("20251201"), Some(date(2025, 12, 1)));
        assert_eq!(parse_ical_date("20251201T083000"), Some(date(2025, 12, 1)));
        assert_eq!(parse_ical_date("20251201T083000Z"), Some(date(2025, 12, 1)));
        assert_eq!(parse_ical_date("2025120"), None);
        assert_eq!(parse_ical_date("20251301"), None);
        assert_eq!(parse_ical_date("20251201X"), None);
    }

    #[test]
    fn text_unescaping() {
        assert_eq!(unescape_text("a\\, b\\; c"), "a, b; c");
        assert_eq!(unescape_text("line\\nbreak"), "line\nbreak");
        assert_eq!(unescape_text("back\\\\slash"), "back\\slash");
    }

    #[test]
    fn url_validation() {
        assert!(validate_url("https://example.com/cal.ics").is_ok());
        assert!(validate_url("http://example.com/cal.ics").is_ok());
        assert!(validate_url("webcal://example.com/cal.ics").is_err());
        assert!(validate_url("not a url").is_err());
    }
}
