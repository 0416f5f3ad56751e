//! Concurrent funding-transaction storage with external-ref deduplication.
//!
//! [`LedgerBook`] keeps every funding transaction in a `HashMap` behind a
//! [`tokio::sync::RwLock`], with a per-listing index and a unique index on
//! the external transaction reference. Recording runs under one write
//! lock, so a retried client submission that replays an already-recorded
//! reference resolves to the original row instead of a duplicate.
//! Summaries fold the transaction set under the read lock and are
//! therefore a consistent snapshot of the completed set at one point in
//! time.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::funding::{FundingSummary, FundingTransaction, TransactionStatus};
use super::{ListingId, TransactionId};
use crate::error::MarketError;

#[derive(Debug, Default)]
struct LedgerInner {
    transactions: HashMap<TransactionId, FundingTransaction>,
    by_listing: HashMap<ListingId, Vec<TransactionId>>,
    by_external_ref: HashMap<String, TransactionId>,
}

/// Result of recording a funding transaction.
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    /// The stored transaction — newly created, or the original row when
    /// the submission replayed a known external reference.
    pub transaction: FundingTransaction,
    /// `true` if the call was an idempotent replay of a prior record.
    pub replayed: bool,
}

/// Central store for funding transactions.
#[derive(Debug, Default)]
pub struct LedgerBook {
    inner: RwLock<LedgerInner>,
}

impl LedgerBook {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a funding transaction in `Pending` status.
    ///
    /// A submission whose `external_ref` is already recorded returns the
    /// prior transaction unchanged when listing, funder, amounts, and
    /// currency all match.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ReplayMismatch`] when a known
    /// `external_ref` arrives with different data.
    pub async fn record(
        &self,
        listing_id: ListingId,
        funder: String,
        amount_display: Decimal,
        amount_settlement: Decimal,
        currency: String,
        external_ref: Option<String>,
    ) -> Result<RecordOutcome, MarketError> {
        let mut inner = self.inner.write().await;

        if let Some(ext_ref) = external_ref.as_deref()
            && let Some(existing_id) = inner.by_external_ref.get(ext_ref)
        {
            let existing = inner
                .transactions
                .get(existing_id)
                .ok_or(MarketError::TransactionNotFound(*existing_id))?;
            if existing.matches_replay(
                listing_id,
                &funder,
                amount_display,
                amount_settlement,
                &currency,
            ) {
                return Ok(RecordOutcome {
                    transaction: existing.clone(),
                    replayed: true,
                });
            }
            return Err(MarketError::ReplayMismatch {
                external_ref: ext_ref.to_string(),
            });
        }

        let transaction = FundingTransaction {
            id: TransactionId::new(),
            listing_id,
            funder,
            amount_display,
            amount_settlement,
            currency,
            external_ref,
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
            settled_at: None,
        };
        let id = transaction.id;
        if let Some(ext_ref) = transaction.external_ref.clone() {
            inner.by_external_ref.insert(ext_ref, id);
        }
        inner.by_listing.entry(listing_id).or_default().push(id);
        inner.transactions.insert(id, transaction.clone());

        Ok(RecordOutcome {
            transaction,
            replayed: false,
        })
    }

    /// Drives a pending transaction to a terminal status.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::TransactionNotFound`] if absent,
    /// [`MarketError::Validation`] if `outcome` is not terminal, or
    /// [`MarketError::InvalidTransition`] if the transaction already
    /// settled.
    pub async fn settle(
        &self,
        id: TransactionId,
        outcome: TransactionStatus,
    ) -> Result<FundingTransaction, MarketError> {
        if !outcome.is_terminal() {
            return Err(MarketError::Validation(
                "settlement outcome must be completed or failed".to_string(),
            ));
        }
        let mut inner = self.inner.write().await;
        let transaction = inner
            .transactions
            .get_mut(&id)
            .ok_or(MarketError::TransactionNotFound(id))?;
        if transaction.status.is_terminal() {
            return Err(MarketError::InvalidTransition(format!(
                "transaction {id} already settled as {:?}",
                transaction.status
            )));
        }
        transaction.status = outcome;
        transaction.settled_at = Some(Utc::now());
        Ok(transaction.clone())
    }

    /// Returns a transaction by id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::TransactionNotFound`] if absent.
    pub async fn get(&self, id: TransactionId) -> Result<FundingTransaction, MarketError> {
        let inner = self.inner.read().await;
        inner
            .transactions
            .get(&id)
            .cloned()
            .ok_or(MarketError::TransactionNotFound(id))
    }

    /// Returns all transactions recorded against a listing, in record
    /// order.
    pub async fn transactions_for(&self, listing_id: ListingId) -> Vec<FundingTransaction> {
        let inner = self.inner.read().await;
        inner
            .by_listing
            .get(&listing_id)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.transactions.get(id))
            .cloned()
            .collect()
    }

    /// Folds the listing's transaction set into a [`FundingSummary`].
    ///
    /// Runs entirely under the read lock: the result reflects the
    /// completed-transaction set at a single point in time, with no
    /// partial double-count and no lost update.
    pub async fn summary(&self, listing_id: ListingId, funding_goal: Decimal) -> FundingSummary {
        let inner = self.inner.read().await;
        let transactions = inner
            .by_listing
            .get(&listing_id)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.transactions.get(id));
        FundingSummary::compute(listing_id, funding_goal, transactions)
    }

    /// Returns the total number of recorded transactions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.transactions.len()
    }

    /// Returns `true` if no transactions are recorded.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.transactions.is_empty()
    }
}
