//! Database models for the event log and listing snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored event row from the `market_events` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Auto-increment row ID.
    pub id: i64,
    /// Listing the event was scoped to.
    pub listing_id: Uuid,
    /// Event type discriminator (e.g. `"transaction_settled"`).
    pub event_type: String,
    /// JSONB payload with event-specific data.
    pub payload: serde_json::Value,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A listing snapshot row from the `listing_snapshots` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSnapshot {
    /// Auto-increment row ID.
    pub id: i64,
    /// Listing that was snapshotted.
    pub listing_id: Uuid,
    /// Full listing record as JSONB.
    pub listing_json: serde_json::Value,
    /// Derived funding summary as JSONB.
    pub summary_json: serde_json::Value,
    /// Snapshot timestamp.
    pub snapshot_at: DateTime<Utc>,
}
