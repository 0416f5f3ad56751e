//! PostgreSQL implementation of the persistence layer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{ListingSnapshot, StoredEvent};
use crate::error::MarketError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct MarketPersistence {
    pool: PgPool,
}

impl MarketPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends an event to the event log.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::Persistence`] on database failure.
    pub async fn save_event(
        &self,
        listing_id: Uuid,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, MarketError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO market_events (listing_id, event_type, payload) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(listing_id)
        .bind(event_type)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| MarketError::Persistence(e.to_string()))?;

        Ok(row)
    }

    /// Saves a listing snapshot with its derived funding summary.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::Persistence`] on database failure.
    pub async fn save_snapshot(
        &self,
        listing_id: Uuid,
        listing_json: &serde_json::Value,
        summary_json: &serde_json::Value,
    ) -> Result<i64, MarketError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO listing_snapshots (listing_id, listing_json, summary_json) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(listing_id)
        .bind(listing_json)
        .bind(summary_json)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| MarketError::Persistence(e.to_string()))?;

        Ok(row)
    }

    /// Loads the latest snapshot for each listing using `DISTINCT ON`.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::Persistence`] on database failure.
    pub async fn load_latest_snapshots(&self) -> Result<Vec<ListingSnapshot>, MarketError> {
        let rows = sqlx::query_as::<
            _,
            (i64, Uuid, serde_json::Value, serde_json::Value, DateTime<Utc>),
        >(
            "SELECT DISTINCT ON (listing_id) id, listing_id, listing_json, summary_json, snapshot_at \
             FROM listing_snapshots ORDER BY listing_id, snapshot_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MarketError::Persistence(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, listing_id, listing_json, summary_json, snapshot_at)| ListingSnapshot {
                    id,
                    listing_id,
                    listing_json,
                    summary_json,
                    snapshot_at,
                },
            )
            .collect())
    }

    /// Loads events after the given timestamp, optionally filtered by
    /// listing ID.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::Persistence`] on database failure.
    pub async fn load_events_after(
        &self,
        after: DateTime<Utc>,
        listing_id: Option<Uuid>,
    ) -> Result<Vec<StoredEvent>, MarketError> {
        let rows = if let Some(lid) = listing_id {
            sqlx::query_as::<_, (i64, Uuid, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, listing_id, event_type, payload, created_at FROM market_events \
                 WHERE created_at > $1 AND listing_id = $2 ORDER BY created_at ASC",
            )
            .bind(after)
            .bind(lid)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, (i64, Uuid, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, listing_id, event_type, payload, created_at FROM market_events \
                 WHERE created_at > $1 ORDER BY created_at ASC",
            )
            .bind(after)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| MarketError::Persistence(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, listing_id, event_type, payload, created_at)| StoredEvent {
                    id,
                    listing_id,
                    event_type,
                    payload,
                    created_at,
                },
            )
            .collect())
    }

    /// Deletes snapshots older than the given number of days.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::Persistence`] on database failure.
    pub async fn delete_old_snapshots(&self, before_days: u64) -> Result<u64, MarketError> {
        let cutoff =
            Utc::now() - chrono::Duration::days(i64::try_from(before_days).unwrap_or(i64::MAX));

        let result = sqlx::query("DELETE FROM listing_snapshots WHERE snapshot_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| MarketError::Persistence(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
