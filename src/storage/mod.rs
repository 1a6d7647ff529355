mod in_memory;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    lesson::{Lesson, LessonId, NewLesson},
    reminder::{Reminder, ReminderId, ReminderKind},
    settings::Settings,
};

pub use in_memory::{InMemoryLessonStorage, InMemoryReminderStorage, InMemorySettingsStorage};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Reminder with id {0} already exists")]
    DuplicateReminderId(ReminderId),
    #[error("Lesson with id {0} does not exist")]
    LessonNotFound(LessonId),
    #[error("Stored row could not be read: {0}")]
    Corrupted(String),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

#[async_trait]
pub trait ReminderStorage: Send + Sync {
    async fn list(&self) -> Result<Vec<Reminder>, StorageError>;
    async fn get(&self, id: ReminderId) -> Result<Option<Reminder>, StorageError>;
    /// Fails with [`StorageError::DuplicateReminderId`] when the id is taken.
    async fn insert(&self, reminder: Reminder) -> Result<Reminder, StorageError>;
    /// Deleting an unknown id is a no-op.
    async fn delete(&self, id: ReminderId) -> Result<(), StorageError>;

    async fn list_ids(&self) -> Result<Vec<ReminderId>, StorageError> {
        Ok(self.list().await?.into_iter().map(|r| r.id).collect())
    }
}

#[async_trait]
pub trait LessonStorage: Send + Sync {
    async fn get(&self, id: LessonId) -> Result<Option<Lesson>, StorageError>;
    async fn list(&self) -> Result<Vec<Lesson>, StorageError>;
    async fn insert(&self, lesson: NewLesson) -> Result<Lesson, StorageError>;
    async fn set_reminder_id(
        &self,
        id: LessonId,
        kind: ReminderKind,
        reminder_id: Option<ReminderId>,
    ) -> Result<(), StorageError>;
    async fn set_note(&self, id: LessonId, note: Option<String>) -> Result<(), StorageError>;
    async fn delete(&self, id: LessonId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SettingsStorage: Send + Sync {
    async fn load(&self) -> Result<Option<Settings>, StorageError>;
    async fn save(&self, settings: &Settings) -> Result<(), StorageError>;
}
