use std::collections::{HashMap, HashSet};

use crate::models::{
    lesson::LessonId,
    reminder::{ReminderId, ReminderKind},
};
use crate::scheduler::{ScheduleRequest, ScheduledReminder};

use super::ReminderAttachmentCoordinator;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Lesson fields that pointed at a reminder which no longer exists.
    pub cleared_dangling_links: usize,
    /// Persisted reminders no lesson refers to.
    pub removed_orphaned_reminders: usize,
    pub rearmed_reminders: usize,
    /// Armed jobs with no persisted reminder behind them.
    pub cancelled_stray_jobs: usize,
    pub failures: usize,
}

impl ReminderAttachmentCoordinator {
    /// Repairs state left behind by interrupted attach/detach sequences and
    /// re-arms every attached reminder. Startup only: run it before the
    /// coordinator accepts toggles. Per-item failures are logged and counted.
    pub(crate) async fn reconcile(&self) -> anyhow::Result<ReconcileReport> {
        let mut targets = Vec::new();
        for lesson in self.lessons.list().await? {
            for kind in ReminderKind::ALL {
                targets.push(self.lock_target(lesson.id, kind).await);
            }
        }
        let _allocation = self.allocation_lock.lock().await;
        let mut report = ReconcileReport::default();

        let lessons = self.lessons.list().await?;
        let reminders: HashMap<ReminderId, _> = self
            .reminders
            .list()
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        let armed: HashSet<ReminderId> = self
            .scheduler
            .scheduled_reminder_ids()
            .await?
            .into_iter()
            .collect();

        let mut referenced: HashMap<ReminderId, (LessonId, ReminderKind)> = HashMap::new();
        for lesson in &lessons {
            for (kind, reminder_id) in lesson.reminders.attached() {
                if reminders.contains_key(&reminder_id) {
                    referenced.insert(reminder_id, (lesson.id, kind));
                    continue;
                }

                log::warn!(
                    "Lesson points at missing reminder, clearing [lesson_id = {}, kind = {}, reminder_id = {}]",
                    lesson.id,
                    kind,
                    reminder_id
                );
                match self.lessons.set_reminder_id(lesson.id, kind, None).await {
                    Ok(()) => report.cleared_dangling_links += 1,
                    Err(error) => {
                        log::error!("Could not clear lesson field [lesson_id = {}, error = {}]", lesson.id, error);
                        report.failures += 1;
                    }
                }
            }
        }

        for (id, reminder) in &reminders {
            if referenced.contains_key(id) {
                continue;
            }

            log::warn!(
                "Removing orphaned reminder [reminder_id = {}, lesson_id = {}]",
                id,
                reminder.lesson_id
            );
            if let Err(error) = self
                .scheduler
                .cancel_reminder(&ScheduledReminder::new(*id))
                .await
            {
                log::error!("Could not cancel orphaned reminder [reminder_id = {}, error = {:#}]", id, error);
                report.failures += 1;
                continue;
            }
            match self.reminders.delete(*id).await {
                Ok(()) => report.removed_orphaned_reminders += 1,
                Err(error) => {
                    log::error!("Could not delete orphaned reminder [reminder_id = {}, error = {}]", id, error);
                    report.failures += 1;
                }
            }
        }

        for id in referenced.keys() {
            if armed.contains(id) {
                continue;
            }

            let reminder = reminders[id].clone();
            match self
                .scheduler
                .schedule_reminder(ScheduleRequest::new(reminder))
                .await
            {
                Ok(_) => report.rearmed_reminders += 1,
                Err(error) => {
                    log::error!("Could not re-arm reminder [reminder_id = {}, error = {:#}]", id, error);
                    report.failures += 1;
                }
            }
        }

        for id in armed.iter().filter(|id| !reminders.contains_key(id)) {
            match self
                .scheduler
                .cancel_reminder(&ScheduledReminder::new(*id))
                .await
            {
                Ok(()) => report.cancelled_stray_jobs += 1,
                Err(error) => {
                    log::error!("Could not cancel stray job [reminder_id = {}, error = {:#}]", id, error);
                    report.failures += 1;
                }
            }
        }

        log::info!("Reconciled reminders {:?}", report);

        Ok(report)
    }
}
