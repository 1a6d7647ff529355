use serde::{Deserialize, Serialize};

/// User facing settings persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub notifications_about_lesson: bool,
    pub notes_about_lesson: bool,
    pub sub_group: Option<String>,
    pub scheduler_migration_done: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications_about_lesson: true,
            notes_about_lesson: true,
            sub_group: None,
            scheduler_migration_done: false,
        }
    }
}

impl Settings {
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
