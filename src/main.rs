use std::sync::Arc;

use raspisanie::{
    appsettings::AppSettings,
    console::Console,
    reminders::{ReminderFactory, migration::ReminderSchedulerMigration},
    scheduler::{DeliveryReminderScheduler, LogDeliveryChannel, ReminderScheduler},
    settings::SettingsManager,
    startup::{self, Dependencies},
    storage::{
        LessonStorage, ReminderStorage,
        sqlite::{
            self, lesson_storage::SqliteLessonStorage, reminder_storage::SqliteReminderStorage,
            settings_storage::SqliteSettingsStorage,
        },
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let app_settings = AppSettings::load()?;
    let timezone = app_settings.reminders.timezone()?;
    let lead_time = app_settings.reminders.lead_time()?;
    log::info!(
        "Starting lesson reminders [timezone = {}, lead_time_minutes = {}]",
        timezone,
        app_settings.reminders.lead_time_minutes
    );

    let pool = sqlite::connect(&app_settings.database.url).await?;
    let reminders: Arc<dyn ReminderStorage> = Arc::new(SqliteReminderStorage::new(pool.clone()));
    let lessons: Arc<dyn LessonStorage> = Arc::new(SqliteLessonStorage::new(pool.clone()));
    let settings = Arc::new(SettingsManager::load(Arc::new(SqliteSettingsStorage::new(pool))).await?);
    let scheduler: Arc<dyn ReminderScheduler> = Arc::new(DeliveryReminderScheduler::new(
        Arc::new(LogDeliveryChannel),
        timezone,
    ));

    let migration = ReminderSchedulerMigration::new(reminders.clone(), scheduler.clone());
    let deps = Dependencies {
        reminders: reminders.clone(),
        lessons: lessons.clone(),
        scheduler,
        settings: settings.clone(),
        factory: ReminderFactory::new(lead_time),
    };
    let (coordinator, report) = startup::prepare_coordinator(deps, &migration).await?;
    log::info!("Startup reconciliation finished {:?}", report);

    let console = Console::new(Arc::new(coordinator), lessons, reminders, settings);
    console.run(tokio::io::stdin(), tokio::io::stdout()).await
}
