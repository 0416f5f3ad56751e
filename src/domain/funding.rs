//! Funding transaction records and the derived per-listing summary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ListingId, TransactionId};

/// Lifecycle of a funding transaction.
///
/// Transitions only `Pending → Completed` or `Pending → Failed`; terminal
/// records are never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Observed but not yet confirmed by the settlement collaborator.
    Pending,
    /// Confirmed; counts toward the funding summary.
    Completed,
    /// Confirmation failed; does not count toward the summary.
    Failed,
}

impl TransactionStatus {
    /// Returns `true` for `Completed` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One funding event against a listing.
#[derive(Debug, Clone, Serialize)]
pub struct FundingTransaction {
    /// Internal identifier (immutable after creation).
    pub id: TransactionId,

    /// Target listing.
    pub listing_id: ListingId,

    /// Opaque funder identity (wallet address or equivalent).
    pub funder: String,

    /// Amount in the listing's display currency. Always positive.
    pub amount_display: Decimal,

    /// Amount actually transferred in the settlement currency. Always
    /// positive.
    pub amount_settlement: Decimal,

    /// Settlement currency code (e.g. `"ETH"`).
    pub currency: String,

    /// External transaction reference, unique when present. Used purely
    /// for deduplication, never parsed.
    pub external_ref: Option<String>,

    /// Lifecycle status.
    pub status: TransactionStatus,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Timestamp of reaching a terminal status.
    pub settled_at: Option<DateTime<Utc>>,
}

impl FundingTransaction {
    /// Returns `true` if a replayed submission carries the same intent as
    /// this record: same listing, funder, amounts, and currency.
    #[must_use]
    pub fn matches_replay(
        &self,
        listing_id: ListingId,
        funder: &str,
        amount_display: Decimal,
        amount_settlement: Decimal,
        currency: &str,
    ) -> bool {
        self.listing_id == listing_id
            && self.funder == funder
            && self.amount_display == amount_display
            && self.amount_settlement == amount_settlement
            && self.currency == currency
    }
}

/// Derived per-listing funding aggregate.
///
/// Always a pure function of the listing's completed transactions — a
/// query result, never a second source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundingSummary {
    /// Listing the summary describes.
    pub listing_id: ListingId,
    /// Funding goal passed through from the listing.
    pub funding_goal: Decimal,
    /// Exact sum of `amount_display` over completed transactions.
    pub raised: Decimal,
    /// Count of distinct funder identities with at least one completed
    /// transaction.
    pub funders: u64,
    /// `100 × raised / goal`. May exceed 100 when over-funded.
    pub percentage: Decimal,
}

impl FundingSummary {
    /// Folds a transaction set into its summary.
    ///
    /// Pending and failed transactions are ignored; duplicate funder
    /// identities collapse into one.
    #[must_use]
    pub fn compute<'a, I>(listing_id: ListingId, funding_goal: Decimal, transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a FundingTransaction>,
    {
        let mut raised = Decimal::ZERO;
        let mut funders = std::collections::HashSet::new();
        for tx in transactions {
            if tx.status == TransactionStatus::Completed {
                raised += tx.amount_display;
                funders.insert(tx.funder.as_str());
            }
        }
        let percentage = if funding_goal.is_zero() {
            Decimal::ZERO
        } else {
            raised * Decimal::ONE_HUNDRED / funding_goal
        };
        Self {
            listing_id,
            funding_goal,
            raised,
            funders: funders.len() as u64,
            percentage,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_transaction(
    listing_id: ListingId,
    funder: &str,
    amount: u64,
    status: TransactionStatus,
) -> FundingTransaction {
    FundingTransaction {
        id: TransactionId::new(),
        listing_id,
        funder: funder.to_string(),
        amount_display: Decimal::from(amount),
        amount_settlement: Decimal::from(amount) / Decimal::from(2500),
        currency: "ETH".to_string(),
        external_ref: None,
        status,
        created_at: Utc::now(),
        settled_at: status.is_terminal().then(Utc::now),
    }
}
