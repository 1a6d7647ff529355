use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use super::lesson::LessonId;

pub type ReminderId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderKind {
    /// Fires a lead time before the lesson starts.
    BeforeLesson,
    /// Fires when the lesson starts, as a prompt to check in.
    AfterStart,
}

impl ReminderKind {
    pub const ALL: [ReminderKind; 2] = [ReminderKind::BeforeLesson, ReminderKind::AfterStart];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::BeforeLesson => "BeforeLesson",
            ReminderKind::AfterStart => "AfterStart",
        }
    }
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReminderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BeforeLesson" | "before" => Ok(ReminderKind::BeforeLesson),
            "AfterStart" | "check-in" | "checkin" => Ok(ReminderKind::AfterStart),
            other => anyhow::bail!("Unknown reminder kind {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatInterval {
    Weekly,
    BiWeekly,
}

impl RepeatInterval {
    pub fn as_delta(&self) -> TimeDelta {
        match self {
            RepeatInterval::Weekly => TimeDelta::weeks(1),
            RepeatInterval::BiWeekly => TimeDelta::weeks(2),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatInterval::Weekly => "Weekly",
            RepeatInterval::BiWeekly => "BiWeekly",
        }
    }
}

impl std::str::FromStr for RepeatInterval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Weekly" => Ok(RepeatInterval::Weekly),
            "BiWeekly" => Ok(RepeatInterval::BiWeekly),
            other => anyhow::bail!("Unknown repeat interval {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: ReminderId,
    pub kind: ReminderKind,
    pub lesson_id: LessonId,
    /// Local wall-clock time of the next firing.
    pub fire_at: NaiveDateTime,
    pub repeat: RepeatInterval,
    pub title: String,
    pub text: String,
}

impl Reminder {
    pub fn next_occurrence(&self) -> NaiveDateTime {
        self.fire_at + self.repeat.as_delta()
    }
}
