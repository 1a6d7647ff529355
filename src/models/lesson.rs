use chrono::NaiveTime;

use super::reminder::{ReminderId, ReminderKind, RepeatInterval};

pub type LessonId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Every,
    /// Odd weeks only.
    Numerator,
    /// Even weeks only.
    Denominator,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Every => "Every",
            Frequency::Numerator => "Numerator",
            Frequency::Denominator => "Denominator",
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Every" | "weekly" => Ok(Frequency::Every),
            "Numerator" | "odd" => Ok(Frequency::Numerator),
            "Denominator" | "even" => Ok(Frequency::Denominator),
            other => anyhow::bail!("Unknown lesson frequency {other}"),
        }
    }
}

pub fn repeat_interval(frequency: Option<Frequency>) -> RepeatInterval {
    match frequency {
        None | Some(Frequency::Every) => RepeatInterval::Weekly,
        Some(Frequency::Numerator) | Some(Frequency::Denominator) => RepeatInterval::BiWeekly,
    }
}

/// Identifiers of the reminders currently attached to a lesson, one slot per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LessonReminders {
    pub before_lesson: Option<ReminderId>,
    pub after_start: Option<ReminderId>,
}

impl LessonReminders {
    pub fn get(&self, kind: ReminderKind) -> Option<ReminderId> {
        match kind {
            ReminderKind::BeforeLesson => self.before_lesson,
            ReminderKind::AfterStart => self.after_start,
        }
    }

    pub fn set(&mut self, kind: ReminderKind, id: Option<ReminderId>) {
        match kind {
            ReminderKind::BeforeLesson => self.before_lesson = id,
            ReminderKind::AfterStart => self.after_start = id,
        }
    }

    pub fn is_attached(&self, kind: ReminderKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn attached(&self) -> impl Iterator<Item = (ReminderKind, ReminderId)> + '_ {
        ReminderKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|id| (kind, id)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub id: LessonId,
    pub name: Option<String>,
    pub teacher: Option<String>,
    pub classroom: Option<String>,
    pub sub_group: Option<String>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub frequency: Option<Frequency>,
    pub note: Option<String>,
    pub reminders: LessonReminders,
}

impl Lesson {
    /// Lessons without a subgroup are shown to everyone.
    pub fn is_for_subgroup(&self, sub_group: Option<&str>) -> bool {
        match (self.sub_group.as_deref(), sub_group) {
            (None, _) | (_, None) => true,
            (Some(own), Some(selected)) => own.is_empty() || own == selected,
        }
    }

    pub fn time_range(&self) -> String {
        format!(
            "{} - {}",
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

pub struct NewLesson {
    pub name: Option<String>,
    pub teacher: Option<String>,
    pub classroom: Option<String>,
    pub sub_group: Option<String>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub frequency: Option<Frequency>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(sub_group: Option<&str>) -> Lesson {
        Lesson {
            id: 1,
            name: Some("Algebra".to_owned()),
            teacher: None,
            classroom: None,
            sub_group: sub_group.map(ToOwned::to_owned),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            frequency: None,
            note: None,
            reminders: LessonReminders::default(),
        }
    }

    #[test]
    fn setting_one_kind_leaves_other_untouched() {
        let mut reminders = LessonReminders::default();
        reminders.set(ReminderKind::BeforeLesson, Some(4));

        assert_eq!(reminders.get(ReminderKind::BeforeLesson), Some(4));
        assert!(!reminders.is_attached(ReminderKind::AfterStart));

        reminders.set(ReminderKind::AfterStart, Some(5));
        reminders.set(ReminderKind::BeforeLesson, None);

        assert_eq!(
            reminders.attached().collect::<Vec<_>>(),
            vec![(ReminderKind::AfterStart, 5)]
        );
    }

    #[test]
    fn subgroup_filter() {
        assert!(lesson(None).is_for_subgroup(Some("1")));
        assert!(lesson(Some("1")).is_for_subgroup(None));
        assert!(lesson(Some("1")).is_for_subgroup(Some("1")));
        assert!(!lesson(Some("2")).is_for_subgroup(Some("1")));
    }

    #[test]
    fn frequency_maps_to_repeat_interval() {
        assert_eq!(repeat_interval(None), RepeatInterval::Weekly);
        assert_eq!(repeat_interval(Some(Frequency::Every)), RepeatInterval::Weekly);
        assert_eq!(
            repeat_interval(Some(Frequency::Denominator)),
            RepeatInterval::BiWeekly
        );
    }
}
