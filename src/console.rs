use std::{str::FromStr, sync::Arc};

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::models::{
    lesson::{Frequency, Lesson, LessonId, NewLesson},
    reminder::ReminderKind,
    settings::Settings,
};
use crate::reminders::{AttachmentChange, AttachmentError, ReminderAttachmentCoordinator};
use crate::settings::SettingsManager;
use crate::storage::{LessonStorage, ReminderStorage};

const HELP: &str = "\
Commands:
  lessons                                      list lessons for the selected subgroup
  reminders                                    list stored reminders
  add-lesson <HH:MM> <HH:MM> <every|odd|even> <name>
  toggle <lesson> <before|check-in> <YYYY-MM-DD>
  note <lesson> [text]                         set or clear the lesson note
  delete-lesson <lesson>
  settings [notifications|notes on|off | subgroup <name|none>]
  help
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsChange {
    Notifications(bool),
    Notes(bool),
    SubGroup(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Lessons,
    Reminders,
    AddLesson {
        start_time: NaiveTime,
        end_time: NaiveTime,
        frequency: Frequency,
        name: String,
    },
    Toggle {
        lesson_id: LessonId,
        kind: ReminderKind,
        date: NaiveDate,
    },
    Note {
        lesson_id: LessonId,
        text: Option<String>,
    },
    DeleteLesson(LessonId),
    Settings(Option<SettingsChange>),
    Help,
    Quit,
}

fn parse_time(value: Option<&str>) -> anyhow::Result<NaiveTime> {
    let value = value.context("Missing time")?;
    NaiveTime::parse_from_str(value, "%H:%M").with_context(|| format!("Invalid time {value}"))
}

fn parse_lesson_id(value: Option<&str>) -> anyhow::Result<LessonId> {
    let value = value.context("Missing lesson id")?;
    value
        .parse()
        .with_context(|| format!("Invalid lesson id {value}"))
}

fn parse_switch(value: Option<&str>) -> anyhow::Result<bool> {
    match value {
        Some("on") => Ok(true),
        Some("off") => Ok(false),
        other => anyhow::bail!("Expected on or off, got {:?}", other),
    }
}

fn rest(words: std::str::SplitWhitespace<'_>) -> Option<String> {
    let text = words.collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = match words.next() {
            None | Some("help") => Command::Help,
            Some("quit") | Some("exit") => Command::Quit,
            Some("lessons") => Command::Lessons,
            Some("reminders") => Command::Reminders,
            Some("add-lesson") => {
                let start_time = parse_time(words.next())?;
                let end_time = parse_time(words.next())?;
                let frequency = match words.next() {
                    Some("every") => Frequency::Every,
                    Some(other) => other.parse()?,
                    None => anyhow::bail!("Missing frequency"),
                };
                let name = rest(words).context("Missing lesson name")?;
                Command::AddLesson {
                    start_time,
                    end_time,
                    frequency,
                    name,
                }
            }
            Some("toggle") => {
                let lesson_id = parse_lesson_id(words.next())?;
                let kind = words.next().context("Missing reminder kind")?.parse()?;
                let date = words.next().context("Missing date")?;
                let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .with_context(|| format!("Invalid date {date}"))?;
                Command::Toggle {
                    lesson_id,
                    kind,
                    date,
                }
            }
            Some("note") => Command::Note {
                lesson_id: parse_lesson_id(words.next())?,
                text: rest(words),
            },
            Some("delete-lesson") => Command::DeleteLesson(parse_lesson_id(words.next())?),
            Some("settings") => match words.next() {
                None => Command::Settings(None),
                Some("notifications") => Command::Settings(Some(SettingsChange::Notifications(
                    parse_switch(words.next())?,
                ))),
                Some("notes") => {
                    Command::Settings(Some(SettingsChange::Notes(parse_switch(words.next())?)))
                }
                Some("subgroup") => {
                    let sub_group = match words.next() {
                        None | Some("none") => None,
                        Some(name) => Some(name.to_owned()),
                    };
                    Command::Settings(Some(SettingsChange::SubGroup(sub_group)))
                }
                Some(other) => anyhow::bail!("Unknown setting {other}"),
            },
            Some(other) => anyhow::bail!("Unknown command {other}, try help"),
        };

        Ok(command)
    }
}

/// Line based stand-in for the lesson screen: one toggle per reminder checkbox.
pub struct Console {
    coordinator: Arc<ReminderAttachmentCoordinator>,
    lessons: Arc<dyn LessonStorage>,
    reminders: Arc<dyn ReminderStorage>,
    settings: Arc<SettingsManager>,
}

impl Console {
    pub fn new(
        coordinator: Arc<ReminderAttachmentCoordinator>,
        lessons: Arc<dyn LessonStorage>,
        reminders: Arc<dyn ReminderStorage>,
        settings: Arc<SettingsManager>,
    ) -> Self {
        Self {
            coordinator,
            lessons,
            reminders,
            settings,
        }
    }

    pub async fn run<R, W>(&self, input: R, mut output: W) -> anyhow::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(input).lines();
        output.write_all(b"Type help for the list of commands.\n").await?;
        output.flush().await?;

        while let Some(line) = lines.next_line().await? {
            let response = match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => self.execute(command).await?,
                Err(error) => format!("{error:#}"),
            };
            output.write_all(response.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }

        Ok(())
    }

    pub async fn execute(&self, command: Command) -> anyhow::Result<String> {
        let settings = self.settings.get().await;

        let response = match command {
            Command::Help | Command::Quit => HELP.to_owned(),
            Command::Lessons => self.list_lessons(&settings).await?,
            Command::Reminders => {
                let mut reminders = self.reminders.list().await?;
                reminders.sort_by_key(|r| r.id);
                if reminders.is_empty() {
                    "No reminders.".to_owned()
                } else {
                    reminders
                        .iter()
                        .map(|r| {
                            format!(
                                "#{} {} lesson {} at {} ({:?}): {}",
                                r.id, r.kind, r.lesson_id, r.fire_at, r.repeat, r.title
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            Command::AddLesson {
                start_time,
                end_time,
                frequency,
                name,
            } => {
                let lesson = self
                    .lessons
                    .insert(NewLesson {
                        name: Some(name),
                        teacher: None,
                        classroom: None,
                        sub_group: None,
                        start_time,
                        end_time,
                        frequency: Some(frequency),
                    })
                    .await?;
                format!("Added lesson {}.", lesson.id)
            }
            Command::Toggle {
                lesson_id,
                kind,
                date,
            } => {
                if !settings.notifications_about_lesson {
                    return Ok("Notifications about lessons are turned off in settings.".to_owned());
                }
                toggle_response(self.coordinator.toggle(lesson_id, kind, date).await)
            }
            Command::Note { lesson_id, text } => {
                if !settings.notes_about_lesson {
                    return Ok("Notes about lessons are turned off in settings.".to_owned());
                }
                let cleared = text.is_none();
                self.lessons.set_note(lesson_id, text).await?;
                if cleared {
                    "Note cleared.".to_owned()
                } else {
                    "Note saved.".to_owned()
                }
            }
            Command::DeleteLesson(lesson_id) => {
                match self.coordinator.remove_lesson(lesson_id).await {
                    Ok(detached) => format!(
                        "Deleted lesson {} and {} reminder(s).",
                        lesson_id,
                        detached.len()
                    ),
                    Err(error) => format!("Could not delete lesson: {error:#}"),
                }
            }
            Command::Settings(None) => describe_settings(&settings),
            Command::Settings(Some(change)) => {
                let updated = self
                    .settings
                    .update(|s| match change {
                        SettingsChange::Notifications(on) => Settings {
                            notifications_about_lesson: on,
                            ..s
                        },
                        SettingsChange::Notes(on) => Settings {
                            notes_about_lesson: on,
                            ..s
                        },
                        SettingsChange::SubGroup(sub_group) => Settings { sub_group, ..s },
                    })
                    .await?;
                describe_settings(&updated)
            }
        };

        Ok(response)
    }

    async fn list_lessons(&self, settings: &Settings) -> anyhow::Result<String> {
        let lessons: Vec<Lesson> = self
            .lessons
            .list()
            .await?
            .into_iter()
            .filter(|l| l.is_for_subgroup(settings.sub_group.as_deref()))
            .collect();

        if lessons.is_empty() {
            return Ok("No lessons.".to_owned());
        }

        Ok(lessons
            .iter()
            .map(|lesson| describe_lesson(lesson, settings))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn toggle_response(result: Result<AttachmentChange, AttachmentError>) -> String {
    match result {
        Ok(AttachmentChange::Attached(reminder)) => {
            format!("Reminder #{} set for {}.", reminder.id, reminder.fire_at)
        }
        Ok(AttachmentChange::Detached(id)) => format!("Reminder #{id} removed."),
        Ok(AttachmentChange::Unchanged) => "Nothing changed.".to_owned(),
        Err(AttachmentError::Arm { reminder, .. }) => format!(
            "Reminder #{} saved but not armed yet, it will be armed on next start.",
            reminder.id
        ),
        Err(error) => format!("Could not toggle reminder: {error:#}"),
    }
}

fn describe_lesson(lesson: &Lesson, settings: &Settings) -> String {
    let mut line = format!(
        "{}. {} {}",
        lesson.id,
        lesson.time_range(),
        lesson.name.as_deref().unwrap_or("-")
    );
    if let Some(frequency) = lesson.frequency {
        line.push_str(&format!(" ({})", frequency.as_str()));
    }
    if settings.notifications_about_lesson {
        let mark = |kind| match lesson.reminders.get(kind) {
            Some(id) => format!("[x] #{id}"),
            None => "[ ]".to_owned(),
        };
        line.push_str(&format!(
            " | before: {} | check-in: {}",
            mark(ReminderKind::BeforeLesson),
            mark(ReminderKind::AfterStart)
        ));
    }
    if settings.notes_about_lesson {
        if let Some(note) = lesson.note.as_deref().filter(|n| !n.is_empty()) {
            line.push_str(&format!(" | note: {note}"));
        }
    }
    line
}

fn describe_settings(settings: &Settings) -> String {
    let on_off = |on: bool| if on { "on" } else { "off" };
    format!(
        "notifications: {}\nnotes: {}\nsubgroup: {}",
        on_off(settings.notifications_about_lesson),
        on_off(settings.notes_about_lesson),
        settings.sub_group.as_deref().unwrap_or("all")
    )
}
