pub mod lesson_storage;
pub mod reminder_storage;
pub mod settings_storage;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use sqlx;

use super::StorageError;

pub async fn connect(url: &str) -> Result<sqlx::SqlitePool, StorageError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Connected to database and applied migrations [url = {}]", url);

    Ok(pool)
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> sqlx::SqlitePool {
    // A single connection keeps every query on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests;
