//! Domain events reflecting marketplace state mutations.
//!
//! Every state change emits a [`MarketEvent`] through the
//! [`super::EventBus`]. Events are broadcast to WebSocket subscribers and
//! optionally appended to the PostgreSQL event log.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::chat::ChatMessage;
use super::funding::TransactionStatus;
use super::listing::ListingStatus;
use super::{DeveloperId, ListingId, RepositoryId, TransactionId};

/// Domain event emitted after every state mutation.
///
/// Monetary amounts are [`Decimal`] and serialize as JSON strings to
/// preserve exact values.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum MarketEvent {
    /// Emitted after a reconciliation created or refreshed a repository.
    RepositorySynced {
        /// Resolved developer.
        developer_id: DeveloperId,
        /// Resolved repository.
        repository_id: RepositoryId,
        /// Host-assigned repository identifier.
        external_id: String,
        /// External account handle that drove the reconciliation.
        handle: String,
        /// `true` if this sync created the repository record.
        created: bool,
        /// Reconciliation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a new listing is registered.
    ListingRegistered {
        /// Listing identifier.
        listing_id: ListingId,
        /// Owning developer.
        developer_id: DeveloperId,
        /// Bound repository.
        repository_id: RepositoryId,
        /// Campaign name.
        name: String,
        /// Funding goal in display currency.
        funding_goal: Decimal,
        /// Registration timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when review settles a pending listing.
    ListingReviewed {
        /// Listing identifier.
        listing_id: ListingId,
        /// Resulting status (`verified` or `rejected`).
        status: ListingStatus,
        /// Review timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a funding transaction is recorded.
    TransactionRecorded {
        /// Target listing.
        listing_id: ListingId,
        /// Transaction identifier.
        transaction_id: TransactionId,
        /// Funder identity.
        funder: String,
        /// Amount in display currency.
        amount_display: Decimal,
        /// Settlement currency code.
        currency: String,
        /// `true` if the record call replayed a known external reference.
        replayed: bool,
        /// Record timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a pending transaction reaches a terminal status.
    TransactionSettled {
        /// Target listing.
        listing_id: ListingId,
        /// Transaction identifier.
        transaction_id: TransactionId,
        /// Terminal status (`completed` or `failed`).
        status: TransactionStatus,
        /// Settlement timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a completed transaction changes a listing's
    /// aggregate funding state.
    SummaryUpdated {
        /// Target listing.
        listing_id: ListingId,
        /// Exact raised total.
        raised: Decimal,
        /// Distinct completed-funder count.
        funders: u64,
        /// Percent of goal (may exceed 100).
        percentage: Decimal,
        /// Recomputation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a chat message is appended to a listing's stream.
    MessagePosted {
        /// Target listing.
        listing_id: ListingId,
        /// The full appended message, for subscriber delivery.
        message: ChatMessage,
        /// Append timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl MarketEvent {
    /// Returns the listing this event is scoped to, if any.
    ///
    /// Repository syncs happen before a listing exists and return `None`;
    /// WebSocket subscriptions only match listing-scoped events.
    #[must_use]
    pub const fn listing_id(&self) -> Option<ListingId> {
        match self {
            Self::RepositorySynced { .. } => None,
            Self::ListingRegistered { listing_id, .. }
            | Self::ListingReviewed { listing_id, .. }
            | Self::TransactionRecorded { listing_id, .. }
            | Self::TransactionSettled { listing_id, .. }
            | Self::SummaryUpdated { listing_id, .. }
            | Self::MessagePosted { listing_id, .. } => Some(*listing_id),
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::RepositorySynced { .. } => "repository_synced",
            Self::ListingRegistered { .. } => "listing_registered",
            Self::ListingReviewed { .. } => "listing_reviewed",
            Self::TransactionRecorded { .. } => "transaction_recorded",
            Self::TransactionSettled { .. } => "transaction_settled",
            Self::SummaryUpdated { .. } => "summary_updated",
            Self::MessagePosted { .. } => "message_posted",
        }
    }
}
