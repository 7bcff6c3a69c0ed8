use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

/// Parse time string in HH:MM format
pub fn parse_time(time_str: &str) -> Option<NaiveTime> {
    let (hour, minute) = time_str.trim().split_once(':')?;
    let hour = hour.parse::<u32>().ok()?;
    let minute = minute.parse::<u32>().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Resolve a wall-clock time in `tz`. Ambiguous times take the earlier instant and
/// times that fall into a DST gap move one hour forward.
fn resolve_local(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
    }
}

/// Next instant strictly after `now` at which the wall clock in `now`'s timezone reads `at`
pub fn next_fire_time(now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut date = now.date_naive();

    for _ in 0..3 {
        if let Some(candidate) = resolve_local(&tz, date.and_time(at)) {
            if candidate > *now {
                return candidate;
            }
        }
        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    *now + Duration::days(1)
}

/// How long to sleep until `next`; never less than a second
pub fn wait_duration(now: &DateTime<Tz>, next: &DateTime<Tz>) -> std::time::Duration {
    next.signed_duration_since(now)
        .to_std()
        .unwrap_or_default()
        .max(std::time::Duration::from_secs(1))
}

/// Result of counting down to a target date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// Whole days left, at least 1
    Days(i64),
    Today,
    Passed,
}

/// Whole-day countdown from `today` to `target`
pub fn countdown(today: NaiveDate, target: NaiveDate) -> Countdown {
    let days = target.signed_duration_since(today).num_days();
    match days {
        d if d > 0 => Countdown::Days(d),
        0 => Countdown::Today,
        _ => Countdown::Passed,
    }
}

/// Format a date like "Monday, December 1st"
pub fn format_date(date: NaiveDate) -> String {
    let day = date.day();
    let suffix = match day {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    };
    format!("{} {}{}", date.format("%A, %B"), day, suffix)
}
