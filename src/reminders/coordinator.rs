use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, PoisonError},
};

use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::{
    lesson::{Lesson, LessonId},
    reminder::{Reminder, ReminderId, ReminderKind},
};
use crate::scheduler::{ReminderScheduler, ScheduleRequest, ScheduledReminder};
use crate::storage::{LessonStorage, ReminderStorage, StorageError};

use super::{allocator::generate_id, factory::ReminderFactory};

const MAX_ALLOCATION_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentChange {
    Attached(Reminder),
    Detached(ReminderId),
    Unchanged,
}

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("Lesson with id {0} does not exist")]
    LessonNotFound(LessonId),
    #[error(transparent)]
    Storage(StorageError),
    #[error("No free reminder id after {0} attempts")]
    AllocationExhausted(usize),
    #[error("Reminder {} was saved but could not be armed", .reminder.id)]
    Arm {
        reminder: Reminder,
        #[source]
        source: anyhow::Error,
    },
    #[error("Job for reminder {reminder_id} could not be cancelled")]
    Cancel {
        reminder_id: ReminderId,
        #[source]
        source: anyhow::Error,
    },
}

impl From<StorageError> for AttachmentError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::LessonNotFound(id) => AttachmentError::LessonNotFound(id),
            other => AttachmentError::Storage(other),
        }
    }
}

type TargetKey = (LessonId, ReminderKind);
type TargetLocks = StdMutex<HashMap<TargetKey, Arc<Mutex<()>>>>;

/// Holds one (lesson, kind) lock. Drops the map entry once nobody else uses it.
pub(super) struct TargetGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    key: TargetKey,
    locks: &'a TargetLocks,
}

impl Drop for TargetGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

/// Keeps the lesson's reminder fields, the reminder store and the scheduler's
/// armed jobs consistent with each other.
///
/// Operations on the same (lesson, kind) pair are serialized; id allocation is
/// serialized globally.
pub struct ReminderAttachmentCoordinator {
    pub(super) reminders: Arc<dyn ReminderStorage>,
    pub(super) lessons: Arc<dyn LessonStorage>,
    pub(super) scheduler: Arc<dyn ReminderScheduler>,
    factory: ReminderFactory,
    target_locks: TargetLocks,
    pub(super) allocation_lock: Mutex<()>,
}

impl ReminderAttachmentCoordinator {
    pub fn new(
        reminders: Arc<dyn ReminderStorage>,
        lessons: Arc<dyn LessonStorage>,
        scheduler: Arc<dyn ReminderScheduler>,
        factory: ReminderFactory,
    ) -> Self {
        Self {
            reminders,
            lessons,
            scheduler,
            factory,
            target_locks: StdMutex::new(HashMap::new()),
            allocation_lock: Mutex::new(()),
        }
    }

    pub fn factory(&self) -> &ReminderFactory {
        &self.factory
    }

    pub async fn attach(
        &self,
        lesson_id: LessonId,
        kind: ReminderKind,
        date: NaiveDate,
    ) -> Result<AttachmentChange, AttachmentError> {
        let _guard = self.lock_target(lesson_id, kind).await;
        let lesson = self.load_lesson(lesson_id).await?;
        self.attach_locked(&lesson, kind, date).await
    }

    pub async fn detach(
        &self,
        lesson_id: LessonId,
        kind: ReminderKind,
    ) -> Result<AttachmentChange, AttachmentError> {
        let _guard = self.lock_target(lesson_id, kind).await;
        let lesson = self.load_lesson(lesson_id).await?;
        self.detach_locked(&lesson, kind).await
    }

    /// Attaches when the lesson has no reminder of this kind, detaches otherwise.
    pub async fn toggle(
        &self,
        lesson_id: LessonId,
        kind: ReminderKind,
        date: NaiveDate,
    ) -> Result<AttachmentChange, AttachmentError> {
        let _guard = self.lock_target(lesson_id, kind).await;
        let lesson = self.load_lesson(lesson_id).await?;

        if lesson.reminders.is_attached(kind) {
            self.detach_locked(&lesson, kind).await
        } else {
            self.attach_locked(&lesson, kind, date).await
        }
    }

    /// Detaches every reminder of the lesson, then deletes the lesson record.
    pub async fn remove_lesson(&self, lesson_id: LessonId) -> Result<Vec<ReminderId>, AttachmentError> {
        let mut guards = Vec::with_capacity(ReminderKind::ALL.len());
        for kind in ReminderKind::ALL {
            guards.push(self.lock_target(lesson_id, kind).await);
        }

        let lesson = self.load_lesson(lesson_id).await?;
        let mut detached = Vec::new();
        for kind in ReminderKind::ALL {
            if let AttachmentChange::Detached(id) = self.detach_locked(&lesson, kind).await? {
                detached.push(id);
            }
        }

        self.lessons.delete(lesson_id).await?;
        log::info!(
            "Removed lesson [lesson_id = {}, detached_reminders = {:?}]",
            lesson_id,
            detached
        );

        Ok(detached)
    }

    async fn attach_locked(
        &self,
        lesson: &Lesson,
        kind: ReminderKind,
        date: NaiveDate,
    ) -> Result<AttachmentChange, AttachmentError> {
        if let Some(existing) = lesson.reminders.get(kind) {
            log::info!(
                "Reminder already attached, nothing to do [lesson_id = {}, kind = {}, reminder_id = {}]",
                lesson.id,
                kind,
                existing
            );
            return Ok(AttachmentChange::Unchanged);
        }

        let reminder = self.persist_new_reminder(lesson, kind, date).await?;

        if let Err(error) = self
            .lessons
            .set_reminder_id(lesson.id, kind, Some(reminder.id))
            .await
        {
            log::error!(
                "Could not link reminder to lesson, removing it [lesson_id = {}, reminder_id = {}, error = {}]",
                lesson.id,
                reminder.id,
                error
            );
            if let Err(cleanup_error) = self.reminders.delete(reminder.id).await {
                log::error!(
                    "Could not remove unlinked reminder [reminder_id = {}, error = {}]",
                    reminder.id,
                    cleanup_error
                );
            }
            return Err(error.into());
        }

        if let Err(source) = self
            .scheduler
            .schedule_reminder(ScheduleRequest::new(reminder.clone()))
            .await
        {
            log::error!(
                "Reminder saved but not armed [lesson_id = {}, reminder_id = {}, error = {:#}]",
                lesson.id,
                reminder.id,
                source
            );
            return Err(AttachmentError::Arm { reminder, source });
        }

        log::info!(
            "Attached reminder [lesson_id = {}, kind = {}, reminder_id = {}, fire_at = {}]",
            lesson.id,
            kind,
            reminder.id,
            reminder.fire_at
        );

        Ok(AttachmentChange::Attached(reminder))
    }

    async fn detach_locked(
        &self,
        lesson: &Lesson,
        kind: ReminderKind,
    ) -> Result<AttachmentChange, AttachmentError> {
        let Some(reminder_id) = lesson.reminders.get(kind) else {
            log::info!(
                "No reminder attached, nothing to do [lesson_id = {}, kind = {}]",
                lesson.id,
                kind
            );
            return Ok(AttachmentChange::Unchanged);
        };

        self.scheduler
            .cancel_reminder(&ScheduledReminder::new(reminder_id))
            .await
            .map_err(|source| {
                log::error!(
                    "Could not cancel job, reminder stays attached [lesson_id = {}, reminder_id = {}, error = {:#}]",
                    lesson.id,
                    reminder_id,
                    source
                );
                AttachmentError::Cancel {
                    reminder_id,
                    source,
                }
            })?;

        self.reminders.delete(reminder_id).await?;
        self.lessons.set_reminder_id(lesson.id, kind, None).await?;

        log::info!(
            "Detached reminder [lesson_id = {}, kind = {}, reminder_id = {}]",
            lesson.id,
            kind,
            reminder_id
        );

        Ok(AttachmentChange::Detached(reminder_id))
    }

    /// Reads the used ids, allocates and inserts under the allocation lock.
    /// A duplicate reported by the store triggers a fresh read and another try.
    async fn persist_new_reminder(
        &self,
        lesson: &Lesson,
        kind: ReminderKind,
        date: NaiveDate,
    ) -> Result<Reminder, AttachmentError> {
        let _allocation = self.allocation_lock.lock().await;

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let used = self.reminders.list_ids().await?;
            let id = generate_id(used);
            let reminder = self.factory.create(kind, lesson, id, date);

            match self.reminders.insert(reminder).await {
                Ok(reminder) => return Ok(reminder),
                Err(StorageError::DuplicateReminderId(id)) => {
                    log::warn!(
                        "Allocated reminder id is taken, retrying [reminder_id = {}, attempt = {}]",
                        id,
                        attempt
                    );
                }
                Err(error) => return Err(error.into()),
            }
        }

        Err(AttachmentError::AllocationExhausted(MAX_ALLOCATION_ATTEMPTS))
    }

    async fn load_lesson(&self, lesson_id: LessonId) -> Result<Lesson, AttachmentError> {
        self.lessons
            .get(lesson_id)
            .await?
            .ok_or(AttachmentError::LessonNotFound(lesson_id))
    }

    pub(super) async fn lock_target(&self, lesson_id: LessonId, kind: ReminderKind) -> TargetGuard<'_> {
        let key = (lesson_id, kind);
        let lock = {
            let mut locks = self
                .target_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key).or_default())
        };

        TargetGuard {
            guard: Some(lock.lock_owned().await),
            key,
            locks: &self.target_locks,
        }
    }

    #[cfg(test)]
    fn tracked_targets(&self) -> usize {
        self.target_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
