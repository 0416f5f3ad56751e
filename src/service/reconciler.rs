//! Identity reconciler: maps external identities onto internal records.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    Developer, DeveloperId, EventBus, IdentityDirectory, MarketEvent, ReconcileReport, RepoSnapshot,
};
use crate::error::MarketError;

/// Orchestrates identity reconciliation.
///
/// Stateless coordinator: owns a reference to the [`IdentityDirectory`]
/// for state and the [`EventBus`] for event emission. The directory's
/// single-write-lock upsert gives the idempotency guarantee; this layer
/// adds input validation, event emission, and tracing.
#[derive(Debug, Clone)]
pub struct IdentityReconciler {
    directory: Arc<IdentityDirectory>,
    event_bus: EventBus,
}

impl IdentityReconciler {
    /// Creates a new `IdentityReconciler`.
    #[must_use]
    pub fn new(directory: Arc<IdentityDirectory>, event_bus: EventBus) -> Self {
        Self {
            directory,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`IdentityDirectory`].
    #[must_use]
    pub fn directory(&self) -> &Arc<IdentityDirectory> {
        &self.directory
    }

    /// Reconciles an external (handle, repository snapshot) pair into
    /// internal records.
    ///
    /// Calling this any number of times with identical inputs, including
    /// concurrently, leaves exactly one developer and one repository
    /// record; later calls observe the first call's ids.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Validation`] for an empty handle or
    /// external repository id, and [`MarketError::OwnershipConflict`]
    /// when the snapshot's repository already belongs to a different
    /// developer.
    pub async fn reconcile(
        &self,
        handle: &str,
        snapshot: RepoSnapshot,
    ) -> Result<ReconcileReport, MarketError> {
        if handle.trim().is_empty() {
            return Err(MarketError::Validation(
                "external handle must not be empty".to_string(),
            ));
        }
        if snapshot.external_id.trim().is_empty() {
            return Err(MarketError::Validation(
                "external repository id must not be empty".to_string(),
            ));
        }

        let report = self.directory.reconcile(handle, snapshot).await?;

        let _ = self.event_bus.publish(MarketEvent::RepositorySynced {
            developer_id: report.developer.id,
            repository_id: report.repository.id,
            external_id: report.repository.external_id.clone(),
            handle: handle.to_string(),
            created: report.repository_created,
            timestamp: Utc::now(),
        });

        tracing::info!(
            developer_id = %report.developer.id,
            repository_id = %report.repository.id,
            created = report.repository_created,
            "repository reconciled"
        );
        Ok(report)
    }

    /// Attaches a payout address to a developer.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Validation`] for an empty address or
    /// [`MarketError::DeveloperNotFound`] for an unknown developer.
    pub async fn attach_payout_address(
        &self,
        developer_id: DeveloperId,
        address: String,
    ) -> Result<Developer, MarketError> {
        if address.trim().is_empty() {
            return Err(MarketError::Validation(
                "payout address must not be empty".to_string(),
            ));
        }
        let developer = self
            .directory
            .attach_payout_address(developer_id, address)
            .await?;
        tracing::info!(%developer_id, "payout address attached");
        Ok(developer)
    }

    /// Looks up a developer by external handle.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Validation`] for an empty handle; an
    /// unknown handle yields `Ok(None)`.
    pub async fn find_developer(&self, handle: &str) -> Result<Option<Developer>, MarketError> {
        if handle.trim().is_empty() {
            return Err(MarketError::Validation(
                "external handle must not be empty".to_string(),
            ));
        }
        Ok(self.directory.developer_by_handle(handle).await)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::developer::test_snapshot;

    fn make_reconciler() -> IdentityReconciler {
        IdentityReconciler::new(Arc::new(IdentityDirectory::new()), EventBus::new(100))
    }

    #[tokio::test]
    async fn empty_handle_is_a_validation_error() {
        let reconciler = make_reconciler();
        let result = reconciler.reconcile("  ", test_snapshot("9001", "widget")).await;
        assert!(matches!(result, Err(MarketError::Validation(_))));
    }

    #[tokio::test]
    async fn reconcile_emits_sync_event() {
        let reconciler = make_reconciler();
        let mut rx = reconciler.event_bus.subscribe();

        let result = reconciler.reconcile("octocat", test_snapshot("9001", "widget")).await;
        assert!(result.is_ok());

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "repository_synced");
    }

    #[tokio::test]
    async fn repeat_reconcile_returns_same_ids() {
        let reconciler = make_reconciler();
        let Ok(first) = reconciler.reconcile("octocat", test_snapshot("9001", "widget")).await
        else {
            panic!("first reconcile failed");
        };
        let Ok(second) = reconciler.reconcile("octocat", test_snapshot("9001", "widget")).await
        else {
            panic!("second reconcile failed");
        };
        assert_eq!(first.developer.id, second.developer.id);
        assert_eq!(first.repository.id, second.repository.id);
    }

    #[tokio::test]
    async fn find_developer_resolves_after_reconcile() {
        let reconciler = make_reconciler();
        let Ok(report) = reconciler.reconcile("octocat", test_snapshot("9001", "widget")).await
        else {
            panic!("reconcile failed");
        };

        let found = reconciler.find_developer("octocat").await;
        let Ok(Some(found)) = found else {
            panic!("lookup failed");
        };
        assert_eq!(found.id, report.developer.id);

        let Ok(missing) = reconciler.find_developer("nobody").await else {
            panic!("lookup errored");
        };
        assert!(missing.is_none());
    }
}
