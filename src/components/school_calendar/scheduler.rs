use super::notifications::{run_notification_pass, DiscordSink, NotificationSink};
use crate::components::{AppContext, Component};
use crate::config::components;
use crate::error::BotResult;
use crate::utils::time::{next_fire_time, wait_duration};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// A background timer task that can be stopped from `shutdown`
#[derive(Default)]
struct TimerTask {
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TimerTask {
    /// Spawn the timer unless it is already running
    async fn start<F, Fut>(&self, name: &str, make: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut task = self.task.lock().await;
        if task.is_some() {
            warn!("{} is already running, skipping initialization", name);
            return;
        }
        info!("Starting {}", name);
        *task = Some(tokio::spawn(make(self.cancel.clone())));
    }

    async fn stop(&self) {
        self.cancel.cancel();
        if let Some(task) = self.task.lock().await.take() {
            if let Err(e) = task.await {
                error!("Timer task ended abnormally: {}", e);
            }
        }
    }
}

/// Posts tomorrow's events once a day at the configured time
#[derive(Default)]
pub struct DailyNotifier {
    timer: TimerTask,
}

impl DailyNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Component for DailyNotifier {
    fn name(&self) -> &'static str {
        components::DAILY_NOTIFIER
    }

    async fn init(&self, http: Arc<serenity::Http>, app: AppContext) -> BotResult<()> {
        let sink: Arc<dyn NotificationSink> = Arc::new(DiscordSink::new(http));
        self.timer
            .start("daily reminder timer", |cancel| notification_loop(app, sink, cancel))
            .await;
        Ok(())
    }

    async fn shutdown(&self) -> BotResult<()> {
        self.timer.stop().await;
        Ok(())
    }
}

/// Idle until the fire time, run one pass over all guilds, repeat
async fn notification_loop(app: AppContext, sink: Arc<dyn NotificationSink>, cancel: CancellationToken) {
    let mut last_fired: Option<DateTime<Utc>> = None;

    loop {
        let (timezone, at) = {
            let config = app.config.read().await;
            (config.timezone, config.notification_time)
        };

        // Never schedule at or before the previous firing, even if the clock lags
        let now_utc = match last_fired {
            Some(fired) if fired >= Utc::now() => fired,
            _ => Utc::now(),
        };
        let now = now_utc.with_timezone(&timezone);
        let next = next_fire_time(&now, at);
        info!("Next reminder pass scheduled for {}", next);

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(wait_duration(&now, &next)) => {}
        }

        last_fired = Some(next.with_timezone(&Utc));
        let today = next.date_naive();
        let default_url = app.default_calendar_url().await;

        match run_notification_pass(
            today,
            default_url.as_deref(),
            &app.settings,
            &app.calendar,
            sink.as_ref(),
        )
        .await
        {
            Ok(report) => info!(
                "Reminder pass for {} done: {} sent, {} failed, {} skipped",
                today,
                report.sent.len(),
                report.failed.len(),
                report.skipped.len()
            ),
            Err(e) => error!("Reminder pass failed: {}", e),
        }
    }

    info!("Daily reminder timer stopped");
}

/// Refreshes every feed in use on a fixed period, starting immediately
#[derive(Default)]
pub struct CalendarRefresher {
    timer: TimerTask,
}

impl CalendarRefresher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Component for CalendarRefresher {
    fn name(&self) -> &'static str {
        components::CALENDAR_REFRESHER
    }

    async fn init(&self, _http: Arc<serenity::Http>, app: AppContext) -> BotResult<()> {
        let hours = app.config.read().await.calendar_refresh_hours;
        let period = Duration::from_secs(hours * 3600);
        self.timer
            .start("calendar refresh timer", |cancel| refresh_loop(app, period, cancel))
            .await;
        Ok(())
    }

    async fn shutdown(&self) -> BotResult<()> {
        self.timer.stop().await;
        Ok(())
    }
}

async fn refresh_loop(app: AppContext, period: Duration, cancel: CancellationToken) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let results = app.refresh_all_feeds().await;
        let failed = results.iter().filter(|(_, result)| result.is_err()).count();
        info!(
            "Calendar refresh done: {} feeds, {} failed",
            results.len(),
            failed
        );
    }

    info!("Calendar refresh timer stopped");
}
