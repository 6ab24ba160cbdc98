use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::PersistenceError;
use crate::storage::SlotStore;

pub struct SqliteSlotStore {
    db: SqlitePool,
}

impl SqliteSlotStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Opens (creating if needed) the database file and applies migrations.
    pub async fn connect(database_url: &str) -> Result<Self, PersistenceError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| PersistenceError::Database(e.into()))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }
}

#[async_trait]
impl SlotStore for SqliteSlotStore {
    async fn ping(&self) -> Result<(), PersistenceError> {
        sqlx::query("select 1").execute(&self.db).await?;
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_slots WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        Ok(value)
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO kv_slots (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}
