pub mod lesson;
pub mod reminder;
pub mod settings;
