use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::NaiveTime;

use crate::models::{
    lesson::{Lesson, LessonId, NewLesson},
    reminder::{Reminder, ReminderId, ReminderKind},
};
use crate::scheduler::{ReminderScheduler, ScheduleRequest, ScheduledReminder};
use crate::storage::{
    InMemoryLessonStorage, InMemoryReminderStorage, LessonStorage, ReminderStorage, StorageError,
};

use super::{ReminderAttachmentCoordinator, ReminderFactory};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListIds,
    Insert(ReminderId),
    DeleteReminder(ReminderId),
    SetLessonField(LessonId, ReminderKind, Option<ReminderId>),
    Arm(ReminderId),
    Cancel(ReminderId),
}

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

#[derive(Clone)]
pub struct FailureSwitch(Arc<AtomicBool>);

impl FailureSwitch {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn set(&self, failing: bool) {
        self.0.store(failing, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct RecordingReminderStorage {
    inner: InMemoryReminderStorage,
    log: CallLog,
    pub fail_insert: FailureSwitch,
}

#[async_trait]
impl ReminderStorage for RecordingReminderStorage {
    async fn list(&self) -> Result<Vec<Reminder>, StorageError> {
        self.inner.list().await
    }

    async fn get(&self, id: ReminderId) -> Result<Option<Reminder>, StorageError> {
        self.inner.get(id).await
    }

    async fn insert(&self, reminder: Reminder) -> Result<Reminder, StorageError> {
        if self.fail_insert.is_set() {
            return Err(StorageError::Corrupted("insert failed".to_owned()));
        }
        self.log.push(Call::Insert(reminder.id));
        self.inner.insert(reminder).await
    }

    async fn delete(&self, id: ReminderId) -> Result<(), StorageError> {
        self.log.push(Call::DeleteReminder(id));
        self.inner.delete(id).await
    }

    async fn list_ids(&self) -> Result<Vec<ReminderId>, StorageError> {
        self.log.push(Call::ListIds);
        self.inner.list_ids().await
    }
}

pub struct RecordingLessonStorage {
    inner: InMemoryLessonStorage,
    log: CallLog,
    pub fail_link: FailureSwitch,
}

#[async_trait]
impl LessonStorage for RecordingLessonStorage {
    async fn get(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<Lesson>, StorageError> {
        self.inner.list().await
    }

    async fn insert(&self, lesson: NewLesson) -> Result<Lesson, StorageError> {
        self.inner.insert(lesson).await
    }

    async fn set_reminder_id(
        &self,
        id: LessonId,
        kind: ReminderKind,
        reminder_id: Option<ReminderId>,
    ) -> Result<(), StorageError> {
        if self.fail_link.is_set() {
            return Err(StorageError::Corrupted("update failed".to_owned()));
        }
        self.log.push(Call::SetLessonField(id, kind, reminder_id));
        self.inner.set_reminder_id(id, kind, reminder_id).await
    }

    async fn set_note(&self, id: LessonId, note: Option<String>) -> Result<(), StorageError> {
        self.inner.set_note(id, note).await
    }

    async fn delete(&self, id: LessonId) -> Result<(), StorageError> {
        self.inner.delete(id).await
    }
}

/// Scheduler double that records calls and keeps the set of armed ids.
pub struct RecordingScheduler {
    log: CallLog,
    armed: Mutex<Vec<ReminderId>>,
    pub fail_arm: FailureSwitch,
    pub fail_cancel: FailureSwitch,
}

impl RecordingScheduler {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            armed: Mutex::new(Vec::new()),
            fail_arm: FailureSwitch::new(),
            fail_cancel: FailureSwitch::new(),
        }
    }

    pub fn armed(&self) -> Vec<ReminderId> {
        let mut armed = self.armed.lock().unwrap().clone();
        armed.sort();
        armed
    }
}

#[async_trait]
impl ReminderScheduler for RecordingScheduler {
    async fn schedule_reminder(
        &self,
        schedule_request: ScheduleRequest,
    ) -> anyhow::Result<ScheduledReminder> {
        let id = schedule_request.reminder.id;
        self.log.push(Call::Arm(id));
        if self.fail_arm.is_set() {
            anyhow::bail!("Scheduler unavailable");
        }
        let mut armed = self.armed.lock().unwrap();
        if !armed.contains(&id) {
            armed.push(id);
        }
        Ok(ScheduledReminder::new(id))
    }

    async fn cancel_reminder(&self, scheduled_reminder: &ScheduledReminder) -> anyhow::Result<()> {
        self.log.push(Call::Cancel(scheduled_reminder.id));
        if self.fail_cancel.is_set() {
            anyhow::bail!("Scheduler unavailable");
        }
        self.armed
            .lock()
            .unwrap()
            .retain(|id| *id != scheduled_reminder.id);
        Ok(())
    }

    async fn scheduled_reminder_ids(&self) -> anyhow::Result<Vec<ReminderId>> {
        Ok(self.armed())
    }
}

pub struct TestContext {
    pub log: CallLog,
    pub reminders: Arc<RecordingReminderStorage>,
    pub lessons: Arc<RecordingLessonStorage>,
    pub scheduler: Arc<RecordingScheduler>,
    pub coordinator: ReminderAttachmentCoordinator,
}

impl TestContext {
    pub fn new() -> Self {
        let log = CallLog::default();
        let reminders = Arc::new(RecordingReminderStorage {
            inner: InMemoryReminderStorage::new(),
            log: log.clone(),
            fail_insert: FailureSwitch::new(),
        });
        let lessons = Arc::new(RecordingLessonStorage {
            inner: InMemoryLessonStorage::new(),
            log: log.clone(),
            fail_link: FailureSwitch::new(),
        });
        let scheduler = Arc::new(RecordingScheduler::new(log.clone()));
        let coordinator = ReminderAttachmentCoordinator::new(
            reminders.clone(),
            lessons.clone(),
            scheduler.clone(),
            ReminderFactory::default(),
        );

        Self {
            log,
            reminders,
            lessons,
            scheduler,
            coordinator,
        }
    }

    pub async fn lesson(&self) -> Lesson {
        self.lessons.insert(new_lesson(9, 0)).await.unwrap()
    }

    pub async fn reload(&self, id: LessonId) -> Lesson {
        self.lessons.get(id).await.unwrap().unwrap()
    }
}

pub fn new_lesson(hour: u32, minute: u32) -> NewLesson {
    NewLesson {
        name: Some("Discrete maths".to_owned()),
        teacher: Some("Petrova".to_owned()),
        classroom: Some("112".to_owned()),
        sub_group: None,
        start_time: NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(hour + 1, minute, 0).unwrap(),
        frequency: None,
    }
}
