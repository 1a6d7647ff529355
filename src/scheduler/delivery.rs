use async_trait::async_trait;

use crate::models::reminder::Reminder;

#[async_trait]
pub trait ReminderDeliveryChannel: Send + Sync + 'static {
    async fn send_reminder_notification(&self, reminder: &Reminder);
}

pub struct LogDeliveryChannel;

#[async_trait]
impl ReminderDeliveryChannel for LogDeliveryChannel {
    async fn send_reminder_notification(&self, reminder: &Reminder) {
        log::info!(
            "[REMINDER] {}: {} [reminder_id = {}, lesson_id = {}]",
            reminder.title,
            reminder.text,
            reminder.id,
            reminder.lesson_id
        );
    }
}
