use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tokio::{
    sync::{RwLock, watch},
    task::{self, JoinHandle},
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;

use crate::models::reminder::{Reminder, ReminderId};

use super::{ReminderDeliveryChannel, ReminderScheduler, ScheduleRequest, ScheduledReminder};

const CANCEL_TIMEOUT: Duration = Duration::from_secs(5);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

struct ScheduledReminderHandle {
    task: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl ScheduledReminderHandle {
    async fn cancel(self, timeout: Duration) {
        self.cancellation_token.cancel();
        let _ = time::timeout(timeout, self.task).await;
    }
}

struct CleanupTask(watch::Sender<()>);

type ReminderTaskStore = RwLock<HashMap<ReminderId, ScheduledReminderHandle>>;

/// Wall clock that advances with the tokio clock, so paused-time tests see a consistent "now".
#[derive(Clone, Copy)]
struct SchedulerClock {
    started_utc: DateTime<Utc>,
    started_at: Instant,
}

impl SchedulerClock {
    fn new() -> Self {
        Self {
            started_utc: Utc::now(),
            started_at: Instant::now(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let elapsed = Instant::now().duration_since(self.started_at);
        self.started_utc
            + chrono::Duration::from_std(elapsed).expect("Elapsed time always fits in a Duration.")
    }
}

/// Runs every armed reminder as a tokio task that sleeps until the next occurrence.
pub struct DeliveryReminderScheduler {
    tasks: Arc<ReminderTaskStore>,
    delivery_channel: Arc<dyn ReminderDeliveryChannel>,
    timezone: Tz,
    clock: SchedulerClock,
    root_token: CancellationToken,
    cleanup_task: CleanupTask,
}

impl DeliveryReminderScheduler {
    pub fn new(delivery_channel: Arc<dyn ReminderDeliveryChannel>, timezone: Tz) -> Self {
        let tasks = Arc::new(RwLock::new(HashMap::new()));
        let cleanup_task = Self::spawn_cleanup_task(Arc::clone(&tasks));

        Self {
            tasks,
            delivery_channel,
            timezone,
            clock: SchedulerClock::new(),
            root_token: CancellationToken::new(),
            cleanup_task,
        }
    }
}

impl Drop for DeliveryReminderScheduler {
    fn drop(&mut self) {
        self.root_token.cancel();
        let _ = self.cleanup_task.0.send(());
    }
}

impl DeliveryReminderScheduler {
    fn create_reminder_task(&self, reminder: Reminder) -> ScheduledReminderHandle {
        let cancellation_token = self.root_token.child_token();
        let task_token = cancellation_token.clone();
        let delivery_channel = Arc::clone(&self.delivery_channel);
        let timezone = self.timezone;
        let clock = self.clock;

        log::info!(
            "Starting task for reminder [reminder_id = {}, fire_at = {}]",
            reminder.id,
            reminder.fire_at
        );

        let task = task::spawn(async move {
            run_reminder(reminder, delivery_channel.as_ref(), timezone, clock, task_token).await;
        });

        ScheduledReminderHandle {
            task,
            cancellation_token,
        }
    }

    fn spawn_cleanup_task(tasks: Arc<ReminderTaskStore>) -> CleanupTask {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(());
        task::spawn(async move {
            loop {
                tokio::select! {
                    _ = time::sleep(CLEANUP_INTERVAL) => {
                        Self::clean_finished_tasks(&tasks).await;
                    }
                    _ = shutdown_rx.changed() => {
                        log::info!("Cleanup task shutting down");
                        break;
                    }
                };
            }
        });

        CleanupTask(shutdown_tx)
    }

    async fn clean_finished_tasks(tasks: &ReminderTaskStore) {
        let mut tasks = tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, handle| !handle.task.is_finished());
        let after = tasks.len();

        if before != after {
            log::info!("Cleaned up {} finished reminder tasks", before - after);
        }
    }
}

#[async_trait]
impl ReminderScheduler for DeliveryReminderScheduler {
    async fn schedule_reminder(
        &self,
        schedule_request: ScheduleRequest,
    ) -> anyhow::Result<ScheduledReminder> {
        let reminder_id = schedule_request.reminder.id;
        let handle = self.create_reminder_task(schedule_request.reminder);

        let replaced = self.tasks.write().await.insert(reminder_id, handle);
        if let Some(previous) = replaced {
            log::info!("Replacing armed job for reminder [reminder_id = {reminder_id}]");
            previous.cancel(CANCEL_TIMEOUT).await;
        }

        Ok(ScheduledReminder { id: reminder_id })
    }

    async fn cancel_reminder(&self, scheduled_reminder: &ScheduledReminder) -> anyhow::Result<()> {
        let removed = self.tasks.write().await.remove(&scheduled_reminder.id);

        match removed {
            Some(handle) => {
                handle.cancel(CANCEL_TIMEOUT).await;
                log::info!(
                    "Cancelled job for reminder [reminder_id = {}]",
                    scheduled_reminder.id
                );
            }
            None => log::debug!(
                "No armed job to cancel [reminder_id = {}]",
                scheduled_reminder.id
            ),
        }

        Ok(())
    }

    async fn scheduled_reminder_ids(&self) -> anyhow::Result<Vec<ReminderId>> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .iter()
            .filter(|(_, handle)| !handle.task.is_finished())
            .map(|(id, _)| *id)
            .collect())
    }
}

async fn run_reminder(
    reminder: Reminder,
    delivery: &dyn ReminderDeliveryChannel,
    timezone: Tz,
    clock: SchedulerClock,
    cancellation_token: CancellationToken,
) {
    let mut fire_at = next_fire_time(&reminder, clock.now(), timezone);

    loop {
        let delay = get_target_delay(&fire_at, clock.now(), timezone);
        log::info!(
            "[SCHEDULE] Sleeping for {:?} delay. [reminder_id = {}]",
            delay,
            reminder.id
        );

        tokio::select! {
            _ = cancellation_token.cancelled() => {
                log::info!("Task for reminder was cancelled. [reminder_id = {}]", reminder.id);
                break;
            }
            _ = time::sleep(delay) => {
                delivery.send_reminder_notification(&reminder).await;
                fire_at += reminder.repeat.as_delta();
            }
        }
    }
}

pub(crate) fn to_utc(local: &NaiveDateTime, timezone: Tz) -> DateTime<Utc> {
    // A local time skipped by a DST jump has no mapping; treat it as UTC wall time.
    timezone
        .from_local_datetime(local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| local.and_utc())
}

/// First occurrence of the reminder that is not in the past.
pub(crate) fn next_fire_time(reminder: &Reminder, now: DateTime<Utc>, timezone: Tz) -> NaiveDateTime {
    let step = reminder.repeat.as_delta();
    let mut fire_at = reminder.fire_at;
    if to_utc(&fire_at, timezone) >= now {
        return fire_at;
    }

    let behind = now - to_utc(&fire_at, timezone);
    let skipped_steps = behind.num_seconds() / step.num_seconds();
    fire_at += step * skipped_steps as i32;
    while to_utc(&fire_at, timezone) < now {
        fire_at += step;
    }

    fire_at
}

pub(crate) fn get_target_delay(fire_at: &NaiveDateTime, now: DateTime<Utc>, timezone: Tz) -> Duration {
    (to_utc(fire_at, timezone) - now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}
