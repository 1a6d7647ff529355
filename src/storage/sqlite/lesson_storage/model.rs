use chrono::NaiveTime;

use crate::models::lesson::{Lesson, LessonReminders};
use crate::storage::StorageError;

#[derive(sqlx::FromRow)]
pub struct LessonStorageModel {
    pub id: i64,
    pub name: Option<String>,
    pub teacher: Option<String>,
    pub classroom: Option<String>,
    pub sub_group: Option<String>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub frequency: Option<String>,
    pub note: Option<String>,
    pub id_of_reminder_before_lesson: Option<i64>,
    pub id_of_reminder_after_beginning_lesson: Option<i64>,
}

impl TryFrom<LessonStorageModel> for Lesson {
    type Error = StorageError;

    fn try_from(value: LessonStorageModel) -> Result<Self, Self::Error> {
        let frequency = value
            .frequency
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e: anyhow::Error| StorageError::Corrupted(e.to_string()))?;

        Ok(Self {
            id: value.id,
            name: value.name,
            teacher: value.teacher,
            classroom: value.classroom,
            sub_group: value.sub_group,
            start_time: value.start_time,
            end_time: value.end_time,
            frequency,
            note: value.note,
            reminders: LessonReminders {
                before_lesson: value.id_of_reminder_before_lesson,
                after_start: value.id_of_reminder_after_beginning_lesson,
            },
        })
    }
}
