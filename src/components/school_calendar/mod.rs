mod actor;
mod handle;
pub mod models;
pub mod notifications;
pub mod scheduler;
pub mod source;

pub use handle::{feed_urls, CalendarHandle};
pub use models::{CalendarEvent, CalendarSnapshot, EventCategory};
pub use notifications::{compose_reminder, run_notification_pass, NotificationSink, PassReport, Reminder};
pub use scheduler::{CalendarRefresher, DailyNotifier};
