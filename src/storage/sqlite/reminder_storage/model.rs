use chrono::NaiveDateTime;

use crate::models::reminder::Reminder;
use crate::storage::StorageError;

#[derive(sqlx::FromRow)]
pub struct ReminderStorageModel {
    pub id: i64,
    pub kind: String,
    pub lesson_id: i64,
    pub fire_at: NaiveDateTime,
    pub repeat_interval: String,
    pub title: String,
    pub text: String,
}

impl From<Reminder> for ReminderStorageModel {
    fn from(value: Reminder) -> Self {
        Self {
            id: value.id,
            kind: value.kind.as_str().to_string(),
            lesson_id: value.lesson_id,
            fire_at: value.fire_at,
            repeat_interval: value.repeat.as_str().to_string(),
            title: value.title,
            text: value.text,
        }
    }
}

impl TryFrom<ReminderStorageModel> for Reminder {
    type Error = StorageError;

    fn try_from(value: ReminderStorageModel) -> Result<Self, Self::Error> {
        let kind = value
            .kind
            .parse()
            .map_err(|e: anyhow::Error| StorageError::Corrupted(e.to_string()))?;
        let repeat = value
            .repeat_interval
            .parse()
            .map_err(|e: anyhow::Error| StorageError::Corrupted(e.to_string()))?;

        Ok(Self {
            id: value.id,
            kind,
            lesson_id: value.lesson_id,
            fire_at: value.fire_at,
            repeat,
            title: value.title,
            text: value.text,
        })
    }
}
