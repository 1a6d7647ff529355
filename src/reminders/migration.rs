use std::sync::Arc;

use async_trait::async_trait;

use crate::models::settings::Settings;
use crate::scheduler::{ReminderScheduler, ScheduleRequest, ScheduledReminder};
use crate::settings::SettingsManager;
use crate::storage::ReminderStorage;

/// Moves armed reminders from one scheduling mechanism to another. Must be safe to run again
/// after a partial run.
#[async_trait]
pub trait SchedulerMigration: Send + Sync {
    async fn migrate(&self) -> anyhow::Result<()>;
}

/// Re-arms every persisted reminder on `current`, cancelling it on `legacy` first when one is
/// configured.
pub struct ReminderSchedulerMigration {
    reminders: Arc<dyn ReminderStorage>,
    legacy: Option<Arc<dyn ReminderScheduler>>,
    current: Arc<dyn ReminderScheduler>,
}

impl ReminderSchedulerMigration {
    pub fn new(reminders: Arc<dyn ReminderStorage>, current: Arc<dyn ReminderScheduler>) -> Self {
        Self {
            reminders,
            legacy: None,
            current,
        }
    }

    pub fn with_legacy(mut self, legacy: Arc<dyn ReminderScheduler>) -> Self {
        self.legacy = Some(legacy);
        self
    }
}

#[async_trait]
impl SchedulerMigration for ReminderSchedulerMigration {
    async fn migrate(&self) -> anyhow::Result<()> {
        let reminders = self.reminders.list().await?;
        log::info!("Migrating {} reminders to the current scheduler", reminders.len());

        for reminder in reminders {
            if let Some(legacy) = &self.legacy {
                legacy
                    .cancel_reminder(&ScheduledReminder::from(&reminder))
                    .await?;
            }
            self.current
                .schedule_reminder(ScheduleRequest::new(reminder))
                .await?;
        }

        Ok(())
    }
}

/// Runs the migration unless the persisted flag says it already completed.
/// Returns whether the migration ran.
pub async fn run_scheduler_migration(
    settings: &SettingsManager,
    migration: &dyn SchedulerMigration,
) -> anyhow::Result<bool> {
    if settings.get().await.scheduler_migration_done {
        return Ok(false);
    }

    migration.migrate().await?;
    settings
        .update(|s| Settings {
            scheduler_migration_done: true,
            ..s
        })
        .await?;
    log::info!("Scheduler migration finished");

    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use chrono::{NaiveDate, NaiveTime};

    use crate::models::lesson::{Lesson, LessonReminders};
    use crate::reminders::ReminderFactory;
    use crate::reminders::test_utils::{Call, CallLog, RecordingScheduler};
    use crate::storage::{InMemoryReminderStorage, InMemorySettingsStorage, SettingsStorage};

    use super::*;

    struct CountingMigration {
        runs: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SchedulerMigration for CountingMigration {
        async fn migrate(&self) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("Migration failed");
            }
            Ok(())
        }
    }

    async fn settings_manager() -> (Arc<InMemorySettingsStorage>, SettingsManager) {
        let storage = Arc::new(InMemorySettingsStorage::new());
        let manager = SettingsManager::load(storage.clone()).await.unwrap();
        (storage, manager)
    }

    #[tokio::test]
    async fn migration_runs_only_once() {
        let (storage, settings) = settings_manager().await;
        let migration = CountingMigration {
            runs: AtomicUsize::new(0),
            fail: false,
        };

        assert!(run_scheduler_migration(&settings, &migration).await.unwrap());
        assert!(!run_scheduler_migration(&settings, &migration).await.unwrap());

        assert_eq!(migration.runs.load(Ordering::SeqCst), 1);
        assert!(storage.load().await.unwrap().unwrap().scheduler_migration_done);
    }

    #[tokio::test]
    async fn failed_migration_is_retried() {
        let (_, settings) = settings_manager().await;
        let migration = CountingMigration {
            runs: AtomicUsize::new(0),
            fail: true,
        };

        assert!(run_scheduler_migration(&settings, &migration).await.is_err());
        assert!(!settings.get().await.scheduler_migration_done);
        assert!(run_scheduler_migration(&settings, &migration).await.is_err());
        assert_eq!(migration.runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reminders_move_from_legacy_to_current_scheduler() {
        let reminders = Arc::new(InMemoryReminderStorage::new());
        let lesson = Lesson {
            id: 1,
            name: None,
            teacher: None,
            classroom: None,
            sub_group: None,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            frequency: None,
            note: None,
            reminders: LessonReminders::default(),
        };
        let date = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        reminders
            .insert(ReminderFactory::default().before_lesson(&lesson, 1, date))
            .await
            .unwrap();

        let legacy_log = CallLog::default();
        let legacy = Arc::new(RecordingScheduler::new(legacy_log.clone()));
        let current = Arc::new(RecordingScheduler::new(CallLog::default()));
        let migration =
            ReminderSchedulerMigration::new(reminders, current.clone()).with_legacy(legacy);

        migration.migrate().await.unwrap();

        assert_eq!(legacy_log.calls(), vec![Call::Cancel(1)]);
        assert_eq!(current.armed(), vec![1]);
    }
}
