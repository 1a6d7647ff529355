use chrono::{NaiveDate, NaiveTime};

use crate::models::{
    lesson::{Frequency, NewLesson},
    reminder::{Reminder, ReminderKind, RepeatInterval},
    settings::Settings,
};
use crate::storage::{LessonStorage, ReminderStorage, SettingsStorage, StorageError};

use super::{
    lesson_storage::SqliteLessonStorage, memory_pool, reminder_storage::SqliteReminderStorage,
    settings_storage::SqliteSettingsStorage,
};

fn new_lesson() -> NewLesson {
    NewLesson {
        name: Some("Physics".to_owned()),
        teacher: Some("Ivanov".to_owned()),
        classroom: Some("204".to_owned()),
        sub_group: None,
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        frequency: Some(Frequency::Numerator),
    }
}

fn reminder(id: i64, lesson_id: i64) -> Reminder {
    Reminder {
        id,
        kind: ReminderKind::BeforeLesson,
        lesson_id,
        fire_at: NaiveDate::from_ymd_opt(2024, 9, 2)
            .unwrap()
            .and_hms_opt(8, 45, 0)
            .unwrap(),
        repeat: RepeatInterval::BiWeekly,
        title: "Physics".to_owned(),
        text: "Starts in 15 minutes".to_owned(),
    }
}

#[tokio::test]
async fn reminder_rows_survive_round_trip() {
    let storage = SqliteReminderStorage::new(memory_pool().await);

    let inserted = storage.insert(reminder(5, 1)).await.unwrap();
    let fetched = storage.get(5).await.unwrap();

    assert_eq!(Some(inserted), fetched);
    assert_eq!(storage.list_ids().await.unwrap(), vec![5]);
}

#[tokio::test]
async fn duplicate_reminder_id_maps_to_storage_error() {
    let storage = SqliteReminderStorage::new(memory_pool().await);
    storage.insert(reminder(5, 1)).await.unwrap();

    let result = storage.insert(reminder(5, 2)).await;

    assert!(matches!(result, Err(StorageError::DuplicateReminderId(5))));
}

#[tokio::test]
async fn reminder_delete_is_idempotent() {
    let storage = SqliteReminderStorage::new(memory_pool().await);
    storage.insert(reminder(5, 1)).await.unwrap();

    storage.delete(5).await.unwrap();
    storage.delete(5).await.unwrap();

    assert!(storage.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn lesson_reminder_fields_are_independent() {
    let storage = SqliteLessonStorage::new(memory_pool().await);
    let lesson = storage.insert(new_lesson()).await.unwrap();

    storage
        .set_reminder_id(lesson.id, ReminderKind::AfterStart, Some(11))
        .await
        .unwrap();
    let lesson = storage.get(lesson.id).await.unwrap().unwrap();

    assert_eq!(lesson.reminders.after_start, Some(11));
    assert_eq!(lesson.reminders.before_lesson, None);
    assert_eq!(lesson.frequency, Some(Frequency::Numerator));

    storage
        .set_reminder_id(lesson.id, ReminderKind::AfterStart, None)
        .await
        .unwrap();
    let lesson = storage.get(lesson.id).await.unwrap().unwrap();

    assert_eq!(lesson.reminders.after_start, None);
}

#[tokio::test]
async fn updating_missing_lesson_fails() {
    let storage = SqliteLessonStorage::new(memory_pool().await);

    let result = storage
        .set_reminder_id(99, ReminderKind::BeforeLesson, Some(1))
        .await;

    assert!(matches!(result, Err(StorageError::LessonNotFound(99))));
}

#[tokio::test]
async fn settings_are_upserted() {
    let storage = SqliteSettingsStorage::new(memory_pool().await);
    assert_eq!(storage.load().await.unwrap(), None);

    let mut settings = Settings::default();
    storage.save(&settings).await.unwrap();
    settings.scheduler_migration_done = true;
    storage.save(&settings).await.unwrap();

    assert_eq!(storage.load().await.unwrap(), Some(settings));
}
