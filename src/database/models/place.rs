use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::error::{BotError, BotResult};
use crate::utils::logging::log_database_operation;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Place {
    /// Lowercase, unique.
    pub name: String,
    pub address: String,
    /// Average of every score recorded for this place, 0 until rated.
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Rating {
    pub name: String,
    pub score: i64,
}

impl Place {
    pub async fn exists(pool: &SqlitePool, name: &str) -> BotResult<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM places WHERE name = ?")
            .bind(name)
            .fetch_one(pool)
            .await?;
        Ok(found > 0)
    }

    /// Inserts a new place. The primary key on `name` rejects duplicates, so
    /// two racing inserts of the same name cannot both succeed.
    ///
    /// The conflict is resolved in SQL rather than surfaced as a failed
    /// statement: a failed statement can leave the pooled connection holding
    /// a stale read snapshot.
    pub async fn insert(pool: &SqlitePool, name: &str, address: &str) -> BotResult<Self> {
        let inserted = sqlx::query(
            "INSERT INTO places (name, address, rating) VALUES (?, ?, 0) ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(address)
        .execute(pool)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Err(BotError::Duplicate(name.to_string()));
        }

        log_database_operation("INSERT", "places", Some(name));
        Ok(Place {
            name: name.to_string(),
            address: address.to_string(),
            rating: 0.0,
        })
    }

    pub async fn find(pool: &SqlitePool, name: &str) -> BotResult<Option<Self>> {
        let place = sqlx::query_as::<_, Place>("SELECT name, address, rating FROM places WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await?;
        Ok(place)
    }

    /// Deletes a place together with its ratings. Returns false if nothing matched.
    pub async fn delete(pool: &SqlitePool, name: &str) -> BotResult<bool> {
        let mut tx = pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM places WHERE name = ?")
            .bind(name)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted > 0 {
            sqlx::query("DELETE FROM ratings WHERE name = ?")
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        log_database_operation("DELETE", "places", Some(name));
        Ok(deleted > 0)
    }

    /// Every place in insertion order.
    pub async fn list(pool: &SqlitePool) -> BotResult<Vec<Self>> {
        let places = sqlx::query_as::<_, Place>("SELECT name, address, rating FROM places ORDER BY rowid")
            .fetch_all(pool)
            .await?;
        Ok(places)
    }

    pub async fn count(pool: &SqlitePool) -> BotResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM places")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    pub async fn random(pool: &SqlitePool) -> BotResult<Self> {
        let places = Self::list(pool).await?;
        places
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| BotError::NotFound("place".to_string()))
    }

    /// Picks up to `count` distinct places uniformly at random.
    pub async fn sample(pool: &SqlitePool, count: usize) -> BotResult<Vec<Self>> {
        let places = Self::list(pool).await?;
        let picked = places
            .choose_multiple(&mut rand::thread_rng(), count)
            .cloned()
            .collect();
        Ok(picked)
    }

    /// Appends a score and writes the new average back to the place.
    ///
    /// The insert runs first inside the transaction, so SQLite takes the write
    /// lock before the average is read and concurrent raters cannot lose
    /// updates. Returns the new average.
    pub async fn record_rating(pool: &SqlitePool, name: &str, score: i64) -> BotResult<f64> {
        let mut tx = pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO ratings (name, score) SELECT ?, ? WHERE EXISTS (SELECT 1 FROM places WHERE name = ?)",
        )
        .bind(name)
        .bind(score)
        .bind(name)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Err(BotError::NotFound(format!("place '{name}'")));
        }

        let average = sqlx::query_scalar::<_, f64>("SELECT AVG(score) FROM ratings WHERE name = ?")
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE places SET rating = ? WHERE name = ?")
            .bind(average)
            .bind(name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        log_database_operation("RATE", "places", Some(&format!("{name} -> {average:.2}")));
        Ok(average)
    }
}

impl Rating {
    pub async fn find_by_place(pool: &SqlitePool, name: &str) -> BotResult<Vec<Self>> {
        let ratings = sqlx::query_as::<_, Rating>("SELECT name, score FROM ratings WHERE name = ? ORDER BY rowid")
            .bind(name)
            .fetch_all(pool)
            .await?;
        Ok(ratings)
    }
}
