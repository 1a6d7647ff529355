mod model;

use async_trait::async_trait;
use model::LessonStorageModel;

use crate::models::{
    lesson::{Lesson, LessonId, NewLesson},
    reminder::{ReminderId, ReminderKind},
};
use crate::storage::{LessonStorage, StorageError};

pub struct SqliteLessonStorage {
    pool: sqlx::SqlitePool,
}

impl SqliteLessonStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LessonStorage for SqliteLessonStorage {
    async fn get(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let lesson = sqlx::query_as::<_, LessonStorageModel>("SELECT * FROM lessons WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        lesson.map(TryInto::try_into).transpose()
    }

    async fn list(&self) -> Result<Vec<Lesson>, StorageError> {
        let lessons = sqlx::query_as::<_, LessonStorageModel>(
            "SELECT * FROM lessons ORDER BY start_time, id",
        )
        .fetch_all(&self.pool)
        .await?;

        lessons.into_iter().map(TryInto::try_into).collect()
    }

    async fn insert(&self, lesson: NewLesson) -> Result<Lesson, StorageError> {
        let NewLesson {
            name,
            teacher,
            classroom,
            sub_group,
            start_time,
            end_time,
            frequency,
        } = lesson;
        let frequency = frequency.map(|f| f.as_str());

        let created_lesson = sqlx::query_as::<_, LessonStorageModel>(
            "INSERT INTO lessons (name, teacher, classroom, sub_group, start_time, end_time, frequency)
VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(name)
        .bind(teacher)
        .bind(classroom)
        .bind(sub_group)
        .bind(start_time)
        .bind(end_time)
        .bind(frequency)
        .fetch_one(&self.pool)
        .await?;

        created_lesson.try_into()
    }

    async fn set_reminder_id(
        &self,
        id: LessonId,
        kind: ReminderKind,
        reminder_id: Option<ReminderId>,
    ) -> Result<(), StorageError> {
        let query = match kind {
            ReminderKind::BeforeLesson => {
                "UPDATE lessons SET id_of_reminder_before_lesson = ? WHERE id = ?"
            }
            ReminderKind::AfterStart => {
                "UPDATE lessons SET id_of_reminder_after_beginning_lesson = ? WHERE id = ?"
            }
        };

        let result = sqlx::query(query)
            .bind(reminder_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::LessonNotFound(id));
        }

        Ok(())
    }

    async fn set_note(&self, id: LessonId, note: Option<String>) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE lessons SET note = ? WHERE id = ?")
            .bind(note)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::LessonNotFound(id));
        }

        Ok(())
    }

    async fn delete(&self, id: LessonId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM lessons WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
