//! Background persistence tasks: event-log writer and snapshot loop.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::postgres::MarketPersistence;
use crate::domain::MarketEvent;
use crate::service::{FundingLedger, ListingRegistrar};

/// Appends every listing-scoped bus event to the durable event log.
///
/// Runs until the event bus closes. Events without a listing scope
/// (repository syncs) are skipped; write failures are logged and the
/// stream continues.
pub async fn run_event_log_writer(
    persistence: MarketPersistence,
    mut events: broadcast::Receiver<MarketEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let Some(listing_id) = event.listing_id() else {
                    continue;
                };
                let payload = match serde_json::to_value(&event) {
                    Ok(payload) => payload,
                    Err(error) => {
                        tracing::error!(%error, "event serialization failed");
                        continue;
                    }
                };
                if let Err(error) = persistence
                    .save_event(*listing_id.as_uuid(), event.event_type_str(), &payload)
                    .await
                {
                    tracing::warn!(%error, %listing_id, "event log write failed");
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(lagged = n, "event log writer lagged behind bus");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    tracing::debug!("event log writer stopped");
}

/// Periodically snapshots every listing with its funding summary, and
/// prunes old snapshots.
pub async fn run_snapshot_loop(
    persistence: MarketPersistence,
    registrar: Arc<ListingRegistrar>,
    funding: Arc<FundingLedger>,
    interval_secs: u64,
    cleanup_after_days: u64,
) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
    loop {
        interval.tick().await;

        for summary in registrar.list_listings(false).await {
            let listing = match registrar.get_listing(summary.id).await {
                Ok(listing) => listing,
                Err(error) => {
                    tracing::warn!(%error, listing_id = %summary.id, "snapshot listing read failed");
                    continue;
                }
            };
            let funding_summary = match funding.get_summary(summary.id).await {
                Ok(funding_summary) => funding_summary,
                Err(error) => {
                    tracing::warn!(%error, listing_id = %summary.id, "snapshot summary read failed");
                    continue;
                }
            };

            let listing_json = serde_json::to_value(&listing).unwrap_or_default();
            let summary_json = serde_json::to_value(&funding_summary).unwrap_or_default();
            if let Err(error) = persistence
                .save_snapshot(*summary.id.as_uuid(), &listing_json, &summary_json)
                .await
            {
                tracing::warn!(%error, listing_id = %summary.id, "snapshot write failed");
            }
        }

        if cleanup_after_days > 0 {
            match persistence.delete_old_snapshots(cleanup_after_days).await {
                Ok(deleted) if deleted > 0 => {
                    tracing::info!(deleted, "old snapshots pruned");
                }
                Ok(_) => {}
                Err(error) => tracing::warn!(%error, "snapshot cleanup failed"),
            }
        }
    }
}
