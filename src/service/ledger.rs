//! Funding ledger: records transactions and derives funding summaries.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::collaborators::WalletProvider;
use crate::domain::{
    EventBus, FundingSummary, FundingTransaction, IdentityDirectory, LedgerBook, ListingBook,
    ListingId, MarketEvent, RecordOutcome, TransactionId, TransactionStatus,
};
use crate::error::MarketError;

/// Orchestrates funding-transaction writes and summary reads.
///
/// Owns the [`LedgerBook`] for transaction state and reads listings for
/// goals and payout routing; it never mutates listing or identity
/// records.
#[derive(Debug, Clone)]
pub struct FundingLedger {
    ledger: Arc<LedgerBook>,
    listings: Arc<ListingBook>,
    directory: Arc<IdentityDirectory>,
    event_bus: EventBus,
}

impl FundingLedger {
    /// Creates a new `FundingLedger`.
    #[must_use]
    pub fn new(
        ledger: Arc<LedgerBook>,
        listings: Arc<ListingBook>,
        directory: Arc<IdentityDirectory>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            ledger,
            listings,
            directory,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`LedgerBook`].
    #[must_use]
    pub fn ledger(&self) -> &Arc<LedgerBook> {
        &self.ledger
    }

    /// Records a funding transaction in `pending` status.
    ///
    /// A submission replaying an already-recorded `external_ref` with
    /// identical data returns the prior transaction instead of creating
    /// a duplicate, preserving idempotent retry semantics for flaky
    /// clients.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Validation`] for non-positive amounts or
    /// missing fields, [`MarketError::ListingNotFound`] for an unknown
    /// listing, and [`MarketError::ReplayMismatch`] when a known
    /// reference arrives with different data.
    pub async fn record_transaction(
        &self,
        listing_id: ListingId,
        funder: String,
        amount_display: Decimal,
        amount_settlement: Decimal,
        currency: String,
        external_ref: Option<String>,
    ) -> Result<RecordOutcome, MarketError> {
        if funder.trim().is_empty() {
            return Err(MarketError::Validation(
                "funder identity must not be empty".to_string(),
            ));
        }
        if amount_display <= Decimal::ZERO || amount_settlement <= Decimal::ZERO {
            return Err(MarketError::Validation(
                "amounts must be positive".to_string(),
            ));
        }
        if currency.trim().is_empty() {
            return Err(MarketError::Validation(
                "currency code must not be empty".to_string(),
            ));
        }
        if external_ref.as_deref().is_some_and(|r| r.trim().is_empty()) {
            return Err(MarketError::Validation(
                "external reference must not be empty when present".to_string(),
            ));
        }
        // Listing must exist before any write.
        let _listing = self.listings.get(listing_id).await?;

        let outcome = self
            .ledger
            .record(
                listing_id,
                funder,
                amount_display,
                amount_settlement,
                currency,
                external_ref,
            )
            .await?;

        let _ = self.event_bus.publish(MarketEvent::TransactionRecorded {
            listing_id,
            transaction_id: outcome.transaction.id,
            funder: outcome.transaction.funder.clone(),
            amount_display: outcome.transaction.amount_display,
            currency: outcome.transaction.currency.clone(),
            replayed: outcome.replayed,
            timestamp: Utc::now(),
        });

        tracing::info!(
            %listing_id,
            transaction_id = %outcome.transaction.id,
            replayed = outcome.replayed,
            "funding transaction recorded"
        );
        Ok(outcome)
    }

    /// Drives a pending transaction to a terminal status, based on the
    /// external settlement collaborator's confirmation.
    ///
    /// A completion also recomputes and broadcasts the listing's funding
    /// summary.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::TransactionNotFound`] or
    /// [`MarketError::InvalidTransition`] for an already-settled
    /// transaction.
    pub async fn settle_transaction(
        &self,
        transaction_id: TransactionId,
        outcome: TransactionStatus,
    ) -> Result<FundingTransaction, MarketError> {
        let transaction = self.ledger.settle(transaction_id, outcome).await?;
        let listing_id = transaction.listing_id;

        let _ = self.event_bus.publish(MarketEvent::TransactionSettled {
            listing_id,
            transaction_id,
            status: transaction.status,
            timestamp: Utc::now(),
        });

        if transaction.status == TransactionStatus::Completed {
            let summary = self.get_summary(listing_id).await?;
            let _ = self.event_bus.publish(MarketEvent::SummaryUpdated {
                listing_id,
                raised: summary.raised,
                funders: summary.funders,
                percentage: summary.percentage,
                timestamp: Utc::now(),
            });
        }

        tracing::info!(%transaction_id, status = ?transaction.status, "transaction settled");
        Ok(transaction)
    }

    /// Returns the listing's derived funding summary.
    ///
    /// The summary is a snapshot-consistent fold of the listing's
    /// completed transactions at call time.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ListingNotFound`] for an unknown listing.
    pub async fn get_summary(&self, listing_id: ListingId) -> Result<FundingSummary, MarketError> {
        let listing = self.listings.get(listing_id).await?;
        Ok(self.ledger.summary(listing_id, listing.funding_goal).await)
    }

    /// Returns a transaction by id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::TransactionNotFound`] if absent.
    pub async fn get_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<FundingTransaction, MarketError> {
        self.ledger.get(transaction_id).await
    }

    /// Full funding flow: transfer through the wallet collaborator, then
    /// record and settle the resulting transaction.
    ///
    /// The transfer goes to the founder's payout address; the wallet's
    /// receipt reference doubles as the idempotency key, so a retried
    /// call that reuses a receipt resolves to the original transaction.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Validation`] when the founder has no
    /// payout address, [`MarketError::CollaboratorUnavailable`] when the
    /// wallet fails, plus any error [`Self::record_transaction`] can
    /// return.
    pub async fn fund(
        &self,
        listing_id: ListingId,
        funder: String,
        amount_display: Decimal,
        amount_settlement: Decimal,
        currency: String,
        wallet: &dyn WalletProvider,
    ) -> Result<FundingTransaction, MarketError> {
        let listing = self.listings.get(listing_id).await?;
        let founder = self.directory.developer(listing.developer_id).await?;
        let Some(payout_address) = founder.payout_address else {
            return Err(MarketError::Validation(format!(
                "founder of listing {listing_id} has no payout address"
            )));
        };

        let receipt = wallet
            .send_transfer(&payout_address, amount_settlement, &currency)
            .await?;

        let outcome = self
            .record_transaction(
                listing_id,
                funder,
                amount_display,
                amount_settlement,
                currency,
                Some(receipt.reference),
            )
            .await?;

        if outcome.transaction.status.is_terminal() {
            // Replay of a receipt that already settled.
            return Ok(outcome.transaction);
        }
        self.settle_transaction(outcome.transaction.id, TransactionStatus::Completed)
            .await
    }
}
