pub mod delivery;
mod delivery_scheduler;

use async_trait::async_trait;

use crate::models::reminder::{Reminder, ReminderId};

pub use delivery::{LogDeliveryChannel, ReminderDeliveryChannel};
pub use delivery_scheduler::DeliveryReminderScheduler;

pub struct ScheduleRequest {
    pub reminder: Reminder,
}

impl ScheduleRequest {
    pub fn new(reminder: Reminder) -> Self {
        Self { reminder }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledReminder {
    pub id: ReminderId,
}

impl ScheduledReminder {
    pub fn new(id: ReminderId) -> Self {
        Self { id }
    }
}

impl From<&Reminder> for ScheduledReminder {
    fn from(reminder: &Reminder) -> Self {
        Self { id: reminder.id }
    }
}

/// Arms and cancels timed jobs for reminders, addressed by reminder id.
#[async_trait]
pub trait ReminderScheduler: Send + Sync + 'static {
    /// Arming an id that is already armed replaces the previous job.
    async fn schedule_reminder(
        &self,
        schedule_request: ScheduleRequest,
    ) -> anyhow::Result<ScheduledReminder>;

    /// Cancelling an id with no armed job succeeds.
    async fn cancel_reminder(&self, scheduled_reminder: &ScheduledReminder) -> anyhow::Result<()>;

    async fn scheduled_reminder_ids(&self) -> anyhow::Result<Vec<ReminderId>>;
}
