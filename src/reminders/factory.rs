use chrono::{NaiveDate, TimeDelta};

use crate::models::{
    lesson::{self, Lesson},
    reminder::{Reminder, ReminderId, ReminderKind},
};

pub const DEFAULT_LEAD_TIME_MINUTES: i64 = 15;

/// Builds reminder values for a concrete lesson occurrence. Pure, no I/O.
#[derive(Debug, Clone, Copy)]
pub struct ReminderFactory {
    lead_time: TimeDelta,
}

impl Default for ReminderFactory {
    fn default() -> Self {
        Self::new(TimeDelta::minutes(DEFAULT_LEAD_TIME_MINUTES))
    }
}

impl ReminderFactory {
    pub fn new(lead_time: TimeDelta) -> Self {
        Self { lead_time }
    }

    pub fn lead_time(&self) -> TimeDelta {
        self.lead_time
    }

    pub fn create(
        &self,
        kind: ReminderKind,
        lesson: &Lesson,
        id: ReminderId,
        date: NaiveDate,
    ) -> Reminder {
        match kind {
            ReminderKind::BeforeLesson => self.before_lesson(lesson, id, date),
            ReminderKind::AfterStart => self.check_in(lesson, id, date),
        }
    }

    pub fn before_lesson(&self, lesson: &Lesson, id: ReminderId, date: NaiveDate) -> Reminder {
        let text = match lesson.classroom.as_deref() {
            Some(classroom) if !classroom.is_empty() => format!(
                "Starts in {} minutes in {} ({})",
                self.lead_time.num_minutes(),
                classroom,
                lesson.time_range()
            ),
            _ => format!(
                "Starts in {} minutes ({})",
                self.lead_time.num_minutes(),
                lesson.time_range()
            ),
        };

        Reminder {
            id,
            kind: ReminderKind::BeforeLesson,
            lesson_id: lesson.id,
            fire_at: date.and_time(lesson.start_time) - self.lead_time,
            repeat: lesson::repeat_interval(lesson.frequency),
            title: title(lesson),
            text,
        }
    }

    pub fn check_in(&self, lesson: &Lesson, id: ReminderId, date: NaiveDate) -> Reminder {
        Reminder {
            id,
            kind: ReminderKind::AfterStart,
            lesson_id: lesson.id,
            fire_at: date.and_time(lesson.start_time),
            repeat: lesson::repeat_interval(lesson.frequency),
            title: title(lesson),
            text: "The lesson has started, don't forget to check in".to_owned(),
        }
    }
}

fn title(lesson: &Lesson) -> String {
    lesson
        .name
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Lesson".to_owned())
}
