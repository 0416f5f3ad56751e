//! Funding DTOs: transaction record/settle/fund and summary reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{FundingSummary, FundingTransaction, TransactionStatus};

/// Request body for `POST /listings/:id/transactions`.
///
/// Amounts are decimal strings; the display/settlement conversion rate
/// is the caller's concern, so both amounts arrive explicitly.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordTransactionRequest {
    /// Funder identity (wallet address or equivalent).
    pub funder: String,
    /// Amount in the listing's display currency.
    pub amount_display: String,
    /// Amount transferred in the settlement currency.
    pub amount_settlement: String,
    /// Settlement currency code.
    pub currency: String,
    /// External transaction reference for idempotent replay, if any.
    #[serde(default)]
    pub external_ref: Option<String>,
}

/// Response body for `POST /listings/:id/transactions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordTransactionResponse {
    /// Stored transaction id — the prior one on an idempotent replay.
    pub transaction_id: uuid::Uuid,
    /// Current transaction status.
    pub status: TransactionStatus,
    /// `true` when the call replayed an already-recorded reference.
    pub replayed: bool,
    /// Record timestamp of the stored transaction.
    pub recorded_at: DateTime<Utc>,
}

/// Settlement outcome accepted by `POST /transactions/:id/settle`.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SettleOutcome {
    /// The external transfer was confirmed.
    Completed,
    /// The external transfer failed.
    Failed,
}

impl From<SettleOutcome> for TransactionStatus {
    fn from(outcome: SettleOutcome) -> Self {
        match outcome {
            SettleOutcome::Completed => Self::Completed,
            SettleOutcome::Failed => Self::Failed,
        }
    }
}

/// Request body for `POST /transactions/:id/settle`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SettleTransactionRequest {
    /// Confirmed terminal outcome.
    pub outcome: SettleOutcome,
}

/// Full transaction detail returned by settle and fund endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionResponse {
    /// Transaction id.
    pub transaction_id: uuid::Uuid,
    /// Target listing.
    pub listing_id: uuid::Uuid,
    /// Funder identity.
    pub funder: String,
    /// Display-currency amount as a decimal string.
    pub amount_display: String,
    /// Settlement-currency amount as a decimal string.
    pub amount_settlement: String,
    /// Settlement currency code.
    pub currency: String,
    /// External transaction reference, if any.
    pub external_ref: Option<String>,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Terminal-status timestamp, if settled.
    pub settled_at: Option<DateTime<Utc>>,
}

impl From<&FundingTransaction> for TransactionResponse {
    fn from(tx: &FundingTransaction) -> Self {
        Self {
            transaction_id: *tx.id.as_uuid(),
            listing_id: *tx.listing_id.as_uuid(),
            funder: tx.funder.clone(),
            amount_display: tx.amount_display.to_string(),
            amount_settlement: tx.amount_settlement.to_string(),
            currency: tx.currency.clone(),
            external_ref: tx.external_ref.clone(),
            status: tx.status,
            created_at: tx.created_at,
            settled_at: tx.settled_at,
        }
    }
}

/// Request body for `POST /listings/:id/fund`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FundRequest {
    /// Funder identity.
    pub funder: String,
    /// Amount in the listing's display currency.
    pub amount_display: String,
    /// Amount to transfer in the settlement currency.
    pub amount_settlement: String,
    /// Settlement currency code.
    pub currency: String,
}

/// Derived funding summary for `GET /listings/:id/summary`.
#[derive(Debug, Serialize, ToSchema)]
pub struct FundingSummaryResponse {
    /// Listing id.
    pub listing_id: uuid::Uuid,
    /// Funding goal as a decimal string.
    pub funding_goal: String,
    /// Exact raised total as a decimal string.
    pub raised: String,
    /// Distinct completed-funder count.
    pub funders: u64,
    /// Percent of goal as a decimal string (may exceed `"100"`).
    pub percentage: String,
}

impl From<&FundingSummary> for FundingSummaryResponse {
    fn from(summary: &FundingSummary) -> Self {
        Self {
            listing_id: *summary.listing_id.as_uuid(),
            funding_goal: summary.funding_goal.to_string(),
            raised: summary.raised.to_string(),
            funders: summary.funders,
            percentage: summary.percentage.to_string(),
        }
    }
}
