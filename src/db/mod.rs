//! SQLite key-value cache for exchange-rate snapshots.
//!
//! One row per cache key: the capture timestamp plus the rates blob as JSON.
//! Expiry is decided by the reader, so an expired row can still serve as
//! the last known rates when the API is unreachable.

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::models::RatesSnapshot;

/// Key the rates snapshot is stored under.
pub const RATES_CACHE_KEY: &str = "forex_calculator_rates";

/// Database connection pool for the rate cache.
pub struct Database {
    pool: SqlitePool,
}

/// Stored cache row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CacheEntry {
    pub cache_key: String,
    pub payload: String,
}

impl Database {
    /// Create a new database connection.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            // sqlite::memory: is per-connection, so keep a single one
            .max_connections(1)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run all database migrations.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rate_cache (
                cache_key TEXT PRIMARY KEY,
                captured_at TEXT NOT NULL,
                payload TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create rate_cache table")?;

        Ok(())
    }

    /// Load the cached snapshot under `key`, fresh or not.
    pub async fn get_rates(&self, key: &str) -> Result<Option<RatesSnapshot>> {
        let entry: Option<CacheEntry> = sqlx::query_as(
            "SELECT cache_key, payload FROM rate_cache WHERE cache_key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to read rate cache")?;

        let Some(entry) = entry else {
            return Ok(None);
        };

        let snapshot: RatesSnapshot = serde_json::from_str(&entry.payload)
            .with_context(|| format!("Corrupt rate cache entry for {}", entry.cache_key))?;

        Ok(Some(snapshot))
    }

    /// Store `rates` under `key`, replacing any previous snapshot.
    pub async fn save_rates(&self, key: &str, rates: &RatesSnapshot) -> Result<()> {
        let payload = serde_json::to_string(rates).context("Failed to serialize rates")?;

        sqlx::query(
            r#"
            INSERT INTO rate_cache (cache_key, captured_at, payload, updated_at)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(cache_key) DO UPDATE SET
                captured_at = excluded.captured_at,
                payload = excluded.payload,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(rates.captured_at.to_rfc3339())
        .bind(&payload)
        .execute(&self.pool)
        .await
        .context("Failed to write rate cache")?;

        Ok(())
    }

    /// Drop the cached snapshot under `key`.
    pub async fn clear(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM rate_cache WHERE cache_key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .context("Failed to clear rate cache")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_save_and_load_rates() {
        let db = assert_ok!(Database::new("sqlite::memory:").await);
        assert!(assert_ok!(db.get_rates(RATES_CACHE_KEY).await).is_none());

        let mut rates = RatesSnapshot::fallback();
        rates.jpy = dec!(151.25);
        assert_ok!(db.save_rates(RATES_CACHE_KEY, &rates).await);

        let loaded = assert_ok!(db.get_rates(RATES_CACHE_KEY).await).unwrap();
        assert_eq!(loaded, rates);
    }

    #[tokio::test]
    async fn test_save_replaces_previous_snapshot() {
        let db = Database::new("sqlite::memory:").await.unwrap();

        let first = RatesSnapshot::fallback();
        db.save_rates(RATES_CACHE_KEY, &first).await.unwrap();

        let mut second = RatesSnapshot::fallback();
        second.eur = dec!(0.95);
        db.save_rates(RATES_CACHE_KEY, &second).await.unwrap();

        let loaded = db.get_rates(RATES_CACHE_KEY).await.unwrap().unwrap();
        assert_eq!(loaded.eur, dec!(0.95));

        assert_eq!(loaded.captured_at, second.captured_at);
    }

    #[tokio::test]
    async fn test_clear() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.save_rates(RATES_CACHE_KEY, &RatesSnapshot::fallback()).await.unwrap();
        db.clear(RATES_CACHE_KEY).await.unwrap();
        assert!(db.get_rates(RATES_CACHE_KEY).await.unwrap().is_none());
    }
}
