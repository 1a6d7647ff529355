use chrono::TimeDelta;
use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File, builder::DefaultState, ConfigBuilder};
use serde::Deserialize;

use crate::reminders::DEFAULT_LEAD_TIME_MINUTES;

#[derive(Deserialize, Debug)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Debug)]
pub struct ReminderSettings {
    pub lead_time_minutes: i64,
    pub timezone: String,
}

impl ReminderSettings {
    /// How long before the lesson start the before-lesson reminder fires. Must be positive.
    pub fn lead_time(&self) -> anyhow::Result<TimeDelta> {
        if self.lead_time_minutes <= 0 {
            anyhow::bail!(
                "Lead time must be a positive number of minutes, got {}",
                self.lead_time_minutes
            );
        }

        TimeDelta::try_minutes(self.lead_time_minutes).ok_or_else(|| {
            anyhow::anyhow!("Lead time of {} minutes is out of range", self.lead_time_minutes)
        })
    }

    pub fn timezone(&self) -> anyhow::Result<Tz> {
        self.timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid timezone {}: {}", self.timezone, e))
    }
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub database: DatabaseSettings,
    pub reminders: ReminderSettings,
}

impl AppSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("appsettings").required(true))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"));

        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .set_default("database.url", "sqlite://raspisanie.db")?
            .set_default("reminders.lead_time_minutes", DEFAULT_LEAD_TIME_MINUTES)?
            .set_default("reminders.timezone", "UTC")?
            .build()?
            .try_deserialize()
    }
}
