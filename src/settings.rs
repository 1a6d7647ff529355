use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::settings::Settings;
use crate::storage::{SettingsStorage, StorageError};

/// In-memory copy of the persisted [`Settings`], written through on every update.
pub struct SettingsManager {
    storage: Arc<dyn SettingsStorage>,
    current: RwLock<Settings>,
}

impl SettingsManager {
    pub async fn load(storage: Arc<dyn SettingsStorage>) -> Result<Self, StorageError> {
        let current = storage.load().await?.unwrap_or_default();

        Ok(Self {
            storage,
            current: RwLock::new(current),
        })
    }

    pub async fn get(&self) -> Settings {
        self.current.read().await.clone()
    }

    /// Applies `saving` to the current settings and persists the result. The
    /// cached copy only changes once the write succeeded.
    pub async fn update(
        &self,
        saving: impl FnOnce(Settings) -> Settings,
    ) -> Result<Settings, StorageError> {
        let mut current = self.current.write().await;
        let updated = saving(current.clone());
        self.storage.save(&updated).await?;
        *current = updated.clone();
        Ok(updated)
    }
}
