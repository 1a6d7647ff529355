use async_trait::async_trait;

use crate::models::settings::Settings;
use crate::storage::{SettingsStorage, StorageError};

/// Keeps the whole settings document as one JSON row.
pub struct SqliteSettingsStorage {
    pool: sqlx::SqlitePool,
}

impl SqliteSettingsStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStorage for SqliteSettingsStorage {
    async fn load(&self) -> Result<Option<Settings>, StorageError> {
        let json = sqlx::query_scalar::<_, String>("SELECT json FROM settings WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        Ok(json.as_deref().map(Settings::from_json_str).transpose()?)
    }

    async fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        let json = settings.to_json_string()?;
        sqlx::query(
            "INSERT INTO settings (id, json) VALUES (1, ?)
ON CONFLICT(id) DO UPDATE SET json = excluded.json",
        )
        .bind(json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
