use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of school events the bot tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Hall,
    LateStart,
    DressDay,
    ExtendedHomeroom,
}

impl EventCategory {
    /// Every category, in keyword matching order
    pub const ALL: [EventCategory; 4] = [
        EventCategory::DressDay,
        EventCategory::Hall,
        EventCategory::LateStart,
        EventCategory::ExtendedHomeroom,
    ];

    /// Lowercase keyword searched for in an event's text
    pub fn keyword(&self) -> &'static str {
        match self {
            EventCategory::Hall => "hall:",
            EventCategory::LateStart => "late start",
            EventCategory::DressDay => "dress day",
            EventCategory::ExtendedHomeroom => "extended homeroom",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EventCategory::Hall => "Hall",
            EventCategory::LateStart => "Late Start",
            EventCategory::DressDay => "Dress Day",
            EventCategory::ExtendedHomeroom => "Extended Homeroom",
        }
    }

    /// Plural form used in the `/upcoming-*` titles
    pub fn plural_name(&self) -> &'static str {
        match self {
            EventCategory::Hall => "Halls",
            EventCategory::LateStart => "Late Starts",
            EventCategory::DressDay => "Dress Days",
            EventCategory::ExtendedHomeroom => "Extended Homerooms",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            EventCategory::Hall => "🏛️",
            EventCategory::LateStart => "⏰",
            EventCategory::DressDay => "🤵",
            EventCategory::ExtendedHomeroom => "🏠",
        }
    }

    /// Embed color for listings of this category
    pub fn color(&self) -> u32 {
        match self {
            EventCategory::Hall => 0x9B_59_B6,
            EventCategory::LateStart => 0xE6_7E_22,
            EventCategory::DressDay => 0x2E_CC_71,
            EventCategory::ExtendedHomeroom => 0x1A_BC_9C,
        }
    }

    /// Important categories may trigger an @everyone mention. Halls never do.
    pub fn is_important(&self) -> bool {
        !matches!(self, EventCategory::Hall)
    }

    /// Classify free text by the first category keyword it contains
    pub fn classify(text: &str) -> Option<EventCategory> {
        let text = text.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| text.contains(category.keyword()))
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A categorized school calendar entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub date: NaiveDate,
    pub category: EventCategory,
    pub label: String,
}

/// All events from one successful fetch of one feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarSnapshot {
    pub url: String,
    /// Sorted by date; events on the same date keep their feed order
    events: Vec<CalendarEvent>,
    pub fetched_at: DateTime<Utc>,
}

impl CalendarSnapshot {
    pub fn new(url: impl Into<String>, mut events: Vec<CalendarEvent>, fetched_at: DateTime<Utc>) -> Self {
        // Stable sort keeps feed order for ties
        events.sort_by_key(|event| event.date);
        Self {
            url: url.into(),
            events,
            fetched_at,
        }
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The next `count` events of `category` on or after `from`
    pub fn query_upcoming(&self, category: EventCategory, from: NaiveDate, count: usize) -> Vec<CalendarEvent> {
        self.events
            .iter()
            .filter(|event| event.category == category && event.date >= from)
            .take(count)
            .cloned()
            .collect()
    }

    /// Every event on `date`, any category
    pub fn events_on(&self, date: NaiveDate) -> Vec<CalendarEvent> {
        self.events
            .iter()
            .filter(|event| event.date == date)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(day: u32, category: EventCategory, label: &str) -> CalendarEvent {
        CalendarEvent {
            date: date(2025, 12, day),
            category,
            label: label.to_string(),
        }
    }

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(EventCategory::classify("DRESS DAY - Holiday"), Some(EventCategory::DressDay));
        assert_eq!(EventCategory::classify("Hall: Grade 9 Assembly"), Some(EventCategory::Hall));
        assert_eq!(EventCategory::classify("Late Start (10:00)"), Some(EventCategory::LateStart));
        assert_eq!(
            EventCategory::classify("extended homeroom"),
            Some(EventCategory::ExtendedHomeroom)
        );
        assert_eq!(EventCategory::classify("Hallway painting"), None);
        assert_eq!(EventCategory::classify("Math test"), None);
    }

    #[test]
    fn only_halls_are_unimportant() {
        assert!(!EventCategory::Hall.is_important());
        assert!(EventCategory::DressDay.is_important());
        assert!(EventCategory::LateStart.is_important());
        assert!(EventCategory::ExtendedHomeroom.is_important());
    }

    #[test]
    fn query_upcoming_filters_sorts_and_limits() {
        let snapshot = CalendarSnapshot::new(
            "https://example.com/cal.ics",
            vec![
                event(20, EventCategory::Hall, "Hall: late"),
                event(1, EventCategory::Hall, "Hall: past"),
                event(10, EventCategory::DressDay, "Dress Day"),
                event(5, EventCategory::Hall, "Hall: first on the 5th"),
                event(5, EventCategory::Hall, "Hall: second on the 5th"),
                event(8, EventCategory::Hall, "Hall: 8th"),
            ],
            Utc::now(),
        );

        let upcoming = snapshot.query_upcoming(EventCategory::Hall, date(2025, 12, 5), 3);
        let labels: Vec<_> = upcoming.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Hall: first on the 5th", "Hall: second on the 5th", "Hall: 8th"]
        );

        let all = snapshot.query_upcoming(EventCategory::Hall, date(2025, 12, 2), 5);
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].date <= w[1].date));
        assert!(all.iter().all(|e| e.date >= date(2025, 12, 2)));

        assert!(snapshot
            .query_upcoming(EventCategory::LateStart, date(2025, 12, 1), 5)
            .is_empty());
    }

    #[test]
    fn events_on_returns_every_category() {
        let snapshot = CalendarSnapshot::new(
            "https://example.com/cal.ics",
            vec![
                event(2, EventCategory::Hall, "Hall: Gym"),
                event(2, EventCategory::DressDay, "Dress Day"),
                event(3, EventCategory::LateStart, "Late Start"),
            ],
            Utc::now(),
        );
        let on_second = snapshot.events_on(date(2025, 12, 2));
        assert_eq!(on_second.len(), 2);
        assert_eq!(on_second[0].category, EventCategory::Hall);
        assert!(snapshot.events_on(date(2025, 12, 4)).is_empty());
    }
}
