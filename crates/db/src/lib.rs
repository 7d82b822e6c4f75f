use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use rustplex_core::SettingsError;
use rustplex_core::settings::SettingsStore;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl From<DbError> for SettingsError {
    fn from(e: DbError) -> Self {
        SettingsError::Backend(e.to_string())
    }
}

/// Create a SQLite connection pool with WAL mode enabled.
pub async fn connect(db_path: &str) -> Result<SqlitePool, DbError> {
    let parent = Path::new(db_path).parent().filter(|_| db_path != ":memory:");
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent).ok();
    }

    let opts = SqliteConnectOptions::from_str(db_path)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    // A single connection keeps `:memory:` databases alive and shared.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await?;

    Ok(pool)
}

const SETTINGS_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_ts INTEGER NOT NULL DEFAULT 0
)";

/// Client settings persisted in the `settings` table.
#[derive(Debug, Clone)]
pub struct SqliteSettings {
    pool: SqlitePool,
}

impl SqliteSettings {
    /// Wrap a pool whose `settings` table already exists.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `db_path` and create the `settings` table when missing.
    pub async fn open(db_path: &str) -> Result<Self, DbError> {
        let pool = connect(db_path).await?;
        sqlx::query(SETTINGS_SCHEMA).execute(&pool).await?;
        debug!(db_path, "settings schema ready");
        Ok(Self::new(pool))
    }

    async fn load(&self, key: &str) -> Result<Option<String>, DbError> {
        Ok(sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO settings (key, value, updated_ts) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_ts = excluded.updated_ts",
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SettingsStore for SqliteSettings {
    async fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(self.load(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        Ok(self.store(key, value).await?)
    }
}
