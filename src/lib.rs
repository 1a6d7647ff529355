pub mod appsettings;
pub mod console;
pub mod models;
pub mod reminders;
pub mod scheduler;
pub mod settings;
pub mod startup;
pub mod storage;
