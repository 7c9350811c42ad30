use anyhow::Result;
use std::path::Path;
use sqlx::{SqlitePool, migrate::MigrateDatabase, Sqlite};
use tracing::info;

use crate::error::BotResult;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS places (
        name TEXT PRIMARY KEY NOT NULL,
        address TEXT NOT NULL,
        rating REAL NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ratings (
        name TEXT NOT NULL,
        score INTEGER NOT NULL CHECK (score BETWEEN 1 AND 10)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_ratings_name ON ratings (name)",
    r#"
    CREATE TABLE IF NOT EXISTS poll_data (
        poll_id TEXT PRIMARY KEY NOT NULL,
        kind TEXT NOT NULL,
        options TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS poll_results (
        poll_id TEXT NOT NULL,
        option_index INTEGER NOT NULL,
        votes INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (poll_id, option_index)
    )
    "#,
];

/// Creates the directory holding a file-backed SQLite database.
fn ensure_parent_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let path = path.trim_start_matches("//");
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            info!("Creating directory {}", parent.display());
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Names of the tables created by [`DatabaseManager::ensure_schema`].
pub const TABLES: &[&str] = &["places", "ratings", "poll_data", "poll_results"];

#[derive(Clone)]
pub struct DatabaseManager {
    pub pool: SqlitePool,
}

impl DatabaseManager {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_parent_dir(database_url)?;

        // Create database if it doesn't exist
        if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
            info!("Creating database {}", database_url);
            Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePool::connect(database_url).await?;

        Ok(Self { pool })
    }

    /// Creates the four tables if they are missing. Safe to call any number of times.
    pub async fn ensure_schema(&self) -> BotResult<()> {
        info!("Ensuring database schema");
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Lists the user tables currently present in the database.
    pub async fn list_tables(&self) -> BotResult<Vec<String>> {
        let tables = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tables)
    }

    /// Runs a trivial query to prove the store is reachable.
    pub async fn ping(&self) -> BotResult<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
