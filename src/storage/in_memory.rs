use std::collections::{HashMap, hash_map::Entry};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{
    lesson::{Lesson, LessonId, LessonReminders, NewLesson},
    reminder::{Reminder, ReminderId, ReminderKind},
    settings::Settings,
};

use super::{LessonStorage, ReminderStorage, SettingsStorage, StorageError};

#[derive(Default)]
pub struct InMemoryReminderStorage {
    store: RwLock<HashMap<ReminderId, Reminder>>,
}

impl InMemoryReminderStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReminderStorage for InMemoryReminderStorage {
    async fn list(&self) -> Result<Vec<Reminder>, StorageError> {
        let store = self.store.read().await;
        Ok(store.values().cloned().collect())
    }

    async fn get(&self, id: ReminderId) -> Result<Option<Reminder>, StorageError> {
        let store = self.store.read().await;
        Ok(store.get(&id).cloned())
    }

    async fn insert(&self, reminder: Reminder) -> Result<Reminder, StorageError> {
        let mut store = self.store.write().await;
        match store.entry(reminder.id) {
            Entry::Occupied(_) => Err(StorageError::DuplicateReminderId(reminder.id)),
            Entry::Vacant(e) => {
                log::debug!("Inserted reminder [reminder_id = {}]", reminder.id);
                Ok(e.insert(reminder).clone())
            }
        }
    }

    async fn delete(&self, id: ReminderId) -> Result<(), StorageError> {
        self.store.write().await.remove(&id);
        Ok(())
    }
}

pub struct InMemoryLessonStorage {
    store: RwLock<(LessonId, HashMap<LessonId, Lesson>)>,
}

impl InMemoryLessonStorage {
    pub fn new() -> Self {
        InMemoryLessonStorage {
            store: RwLock::new((1, HashMap::new())),
        }
    }
}

impl Default for InMemoryLessonStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LessonStorage for InMemoryLessonStorage {
    async fn get(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let store = self.store.read().await;
        Ok(store.1.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Lesson>, StorageError> {
        let store = self.store.read().await;
        let mut lessons: Vec<Lesson> = store.1.values().cloned().collect();
        lessons.sort_by_key(|l| (l.start_time, l.id));
        Ok(lessons)
    }

    async fn insert(&self, lesson: NewLesson) -> Result<Lesson, StorageError> {
        let mut store = self.store.write().await;
        let current_id = store.0;
        let NewLesson {
            name,
            teacher,
            classroom,
            sub_group,
            start_time,
            end_time,
            frequency,
        } = lesson;
        let lesson = Lesson {
            id: current_id,
            name,
            teacher,
            classroom,
            sub_group,
            start_time,
            end_time,
            frequency,
            note: None,
            reminders: LessonReminders::default(),
        };

        store.1.insert(current_id, lesson.clone());
        store.0 += 1;
        Ok(lesson)
    }

    async fn set_reminder_id(
        &self,
        id: LessonId,
        kind: ReminderKind,
        reminder_id: Option<ReminderId>,
    ) -> Result<(), StorageError> {
        let mut store = self.store.write().await;
        let lesson = store.1.get_mut(&id).ok_or(StorageError::LessonNotFound(id))?;
        lesson.reminders.set(kind, reminder_id);
        Ok(())
    }

    async fn set_note(&self, id: LessonId, note: Option<String>) -> Result<(), StorageError> {
        let mut store = self.store.write().await;
        let lesson = store.1.get_mut(&id).ok_or(StorageError::LessonNotFound(id))?;
        lesson.note = note;
        Ok(())
    }

    async fn delete(&self, id: LessonId) -> Result<(), StorageError> {
        self.store.write().await.1.remove(&id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySettingsStorage {
    settings: RwLock<Option<Settings>>,
}

impl InMemorySettingsStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStorage for InMemorySettingsStorage {
    async fn load(&self) -> Result<Option<Settings>, StorageError> {
        Ok(self.settings.read().await.clone())
    }

    async fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        *self.settings.write().await = Some(settings.clone());
        Ok(())
    }
}
