use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::error::{BotError, BotResult};
use crate::utils::logging::log_database_operation;

/// Which of the two linked polls a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollKind {
    TimeSlot,
    Place,
}

impl PollKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollKind::TimeSlot => "time",
            PollKind::Place => "place",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "time" => Some(PollKind::TimeSlot),
            "place" => Some(PollKind::Place),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct PollRow {
    poll_id: String,
    kind: String,
    options: String,
}

/// A published poll and the labels of its options, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRecord {
    pub poll_id: String,
    pub kind: PollKind,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PollResult {
    pub poll_id: String,
    pub option_index: i64,
    pub votes: i64,
}

impl PollRecord {
    /// Stores a published poll. Fails with [`BotError::Duplicate`] when the
    /// id is already known.
    pub async fn create(
        pool: &SqlitePool,
        poll_id: &str,
        kind: PollKind,
        options: &[String],
    ) -> BotResult<Self> {
        let encoded = serde_json::to_string(options)?;
        let inserted = sqlx::query(
            "INSERT INTO poll_data (poll_id, kind, options) VALUES (?, ?, ?) ON CONFLICT (poll_id) DO NOTHING",
        )
        .bind(poll_id)
        .bind(kind.as_str())
        .bind(&encoded)
        .execute(pool)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Err(BotError::Duplicate(poll_id.to_string()));
        }

        log_database_operation("INSERT", "poll_data", Some(poll_id));
        Ok(PollRecord {
            poll_id: poll_id.to_string(),
            kind,
            options: options.to_vec(),
        })
    }

    pub async fn exists(pool: &SqlitePool, poll_id: &str) -> BotResult<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM poll_data WHERE poll_id = ?")
            .bind(poll_id)
            .fetch_one(pool)
            .await?;
        Ok(found > 0)
    }

    /// Every open poll, oldest first.
    pub async fn list(pool: &SqlitePool) -> BotResult<Vec<Self>> {
        let rows = sqlx::query_as::<_, PollRow>("SELECT poll_id, kind, options FROM poll_data ORDER BY rowid")
            .fetch_all(pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let kind = PollKind::parse(&row.kind)
                    .ok_or_else(|| BotError::Validation(format!("unknown poll kind '{}'", row.kind)))?;
                let options: Vec<String> = serde_json::from_str(&row.options)?;
                Ok(PollRecord {
                    poll_id: row.poll_id,
                    kind,
                    options,
                })
            })
            .collect()
    }
}

impl PollResult {
    /// Adds one vote to an option, creating its row on the first vote.
    pub async fn record_vote(pool: &SqlitePool, poll_id: &str, option_index: i64) -> BotResult<()> {
        sqlx::query(
            r#"
            INSERT INTO poll_results (poll_id, option_index, votes) VALUES (?, ?, 1)
            ON CONFLICT (poll_id, option_index) DO UPDATE SET votes = votes + 1
            "#,
        )
        .bind(poll_id)
        .bind(option_index)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_poll(pool: &SqlitePool, poll_id: &str) -> BotResult<Vec<Self>> {
        let results = sqlx::query_as::<_, PollResult>(
            "SELECT poll_id, option_index, votes FROM poll_results WHERE poll_id = ? ORDER BY option_index",
        )
        .bind(poll_id)
        .fetch_all(pool)
        .await?;
        Ok(results)
    }

    /// Index of the option with the most votes. Ties go to the lowest index.
    pub async fn tally(pool: &SqlitePool, poll_id: &str) -> BotResult<usize> {
        let winner = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT option_index FROM poll_results
            WHERE poll_id = ? AND votes > 0
            ORDER BY votes DESC, option_index ASC
            LIMIT 1
            "#,
        )
        .bind(poll_id)
        .fetch_optional(pool)
        .await?;

        match winner {
            Some(index) => usize::try_from(index)
                .map_err(|_| BotError::Validation(format!("negative option index {index}"))),
            None => Err(BotError::InsufficientData),
        }
    }

    /// Drops every poll and its results.
    pub async fn clear_all(pool: &SqlitePool) -> BotResult<()> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM poll_results").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM poll_data").execute(&mut *tx).await?;
        tx.commit().await?;

        log_database_operation("CLEAR", "poll_data", None);
        Ok(())
    }
}
