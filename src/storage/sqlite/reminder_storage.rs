mod model;

use async_trait::async_trait;
use model::ReminderStorageModel;

use crate::models::reminder::{Reminder, ReminderId};
use crate::storage::{ReminderStorage, StorageError};

pub struct SqliteReminderStorage {
    pool: sqlx::SqlitePool,
}

impl SqliteReminderStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}

#[async_trait]
impl ReminderStorage for SqliteReminderStorage {
    async fn list(&self) -> Result<Vec<Reminder>, StorageError> {
        let reminders =
            sqlx::query_as::<_, ReminderStorageModel>("SELECT * FROM reminders ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        reminders.into_iter().map(TryInto::try_into).collect()
    }

    async fn get(&self, id: ReminderId) -> Result<Option<Reminder>, StorageError> {
        let reminder =
            sqlx::query_as::<_, ReminderStorageModel>("SELECT * FROM reminders WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        reminder.map(TryInto::try_into).transpose()
    }

    async fn insert(&self, reminder: Reminder) -> Result<Reminder, StorageError> {
        let ReminderStorageModel {
            id,
            kind,
            lesson_id,
            fire_at,
            repeat_interval,
            title,
            text,
        } = reminder.into();

        let created_reminder = sqlx::query_as::<_, ReminderStorageModel>(
            "INSERT INTO reminders (id, kind, lesson_id, fire_at, repeat_interval, title, text)
VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(id)
        .bind(kind)
        .bind(lesson_id)
        .bind(fire_at)
        .bind(repeat_interval)
        .bind(title)
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::DuplicateReminderId(id)
            } else {
                e.into()
            }
        })?;

        created_reminder.try_into()
    }

    async fn delete(&self, id: ReminderId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM reminders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<ReminderId>, StorageError> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM reminders")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }
}
