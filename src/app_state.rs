//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::collaborators::{AnalysisCache, WalletProvider};
use crate::domain::EventBus;
use crate::service::{EngagementGateway, FundingLedger, IdentityReconciler, ListingRegistrar};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
///
/// Collaborator slots are `None` when the embedder runs without the
/// corresponding external service; the affected endpoints then report a
/// retryable unavailability error.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Identity reconciliation service.
    pub reconciler: Arc<IdentityReconciler>,
    /// Listing registration and review service.
    pub registrar: Arc<ListingRegistrar>,
    /// Funding ledger service.
    pub funding: Arc<FundingLedger>,
    /// Listing-scoped chat service.
    pub engagement: Arc<EngagementGateway>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Cached AI analysis collaborator, when configured.
    pub analysis: Option<Arc<AnalysisCache>>,
    /// Wallet collaborator, when configured.
    pub wallet: Option<Arc<dyn WalletProvider>>,
}
