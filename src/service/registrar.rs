//! Listing registrar: creates and administers funding campaigns.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::domain::{
    DeveloperId, EventBus, IdentityDirectory, ListingBook, ListingDraft, ListingEdits, ListingId,
    ListingSummary, MarketEvent, RepositoryId, StartupListing,
};
use crate::error::MarketError;

/// Orchestrates listing registration, review, and edits.
///
/// Field validation and the founder-owns-repository check happen here;
/// the one-active-listing-per-repository invariant is enforced by the
/// [`ListingBook`] under its write lock.
#[derive(Debug, Clone)]
pub struct ListingRegistrar {
    directory: Arc<IdentityDirectory>,
    listings: Arc<ListingBook>,
    event_bus: EventBus,
}

impl ListingRegistrar {
    /// Creates a new `ListingRegistrar`.
    #[must_use]
    pub fn new(
        directory: Arc<IdentityDirectory>,
        listings: Arc<ListingBook>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            directory,
            listings,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`ListingBook`].
    #[must_use]
    pub fn listings(&self) -> &Arc<ListingBook> {
        &self.listings
    }

    /// Registers a new listing in `pending` status.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Validation`] for missing required fields or
    /// a non-positive goal, a not-found error when the developer or
    /// repository is unknown, [`MarketError::Forbidden`] when the
    /// developer does not own the repository, and
    /// [`MarketError::RepositoryAlreadyListed`] when the repository
    /// already carries an active campaign.
    pub async fn register_listing(
        &self,
        developer_id: DeveloperId,
        repository_id: RepositoryId,
        draft: ListingDraft,
    ) -> Result<ListingId, MarketError> {
        validate_draft(&draft)?;

        let _developer = self.directory.developer(developer_id).await?;
        let repository = self.directory.repository(repository_id).await?;
        if repository.developer_id != developer_id {
            return Err(MarketError::Forbidden(format!(
                "developer {developer_id} does not own repository {repository_id}"
            )));
        }

        let listing = StartupListing::new(developer_id, repository_id, draft);
        let name = listing.name.clone();
        let funding_goal = listing.funding_goal;
        let listing_id = self.listings.insert(listing).await?;

        let _ = self.event_bus.publish(MarketEvent::ListingRegistered {
            listing_id,
            developer_id,
            repository_id,
            name,
            funding_goal,
            timestamp: Utc::now(),
        });

        tracing::info!(%listing_id, %developer_id, %repository_id, "listing registered");
        Ok(listing_id)
    }

    /// Applies the one-shot review decision.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ListingNotFound`] or
    /// [`MarketError::InvalidTransition`] when the listing already left
    /// review.
    pub async fn verify_listing(
        &self,
        listing_id: ListingId,
        approved: bool,
    ) -> Result<StartupListing, MarketError> {
        let listing = self.listings.review(listing_id, approved).await?;

        let _ = self.event_bus.publish(MarketEvent::ListingReviewed {
            listing_id,
            status: listing.status,
            timestamp: Utc::now(),
        });

        tracing::info!(%listing_id, status = ?listing.status, "listing reviewed");
        Ok(listing)
    }

    /// Applies optional-field edits on behalf of the owning developer.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Validation`] for empty edits or
    /// non-positive numeric fields, [`MarketError::ListingNotFound`], or
    /// [`MarketError::Forbidden`] when `editor` does not own the listing.
    pub async fn update_listing(
        &self,
        listing_id: ListingId,
        editor: DeveloperId,
        edits: ListingEdits,
    ) -> Result<StartupListing, MarketError> {
        if edits.is_empty() {
            return Err(MarketError::Validation(
                "no fields to update".to_string(),
            ));
        }
        if edits.team_size == Some(0) {
            return Err(MarketError::Validation(
                "team_size must be positive".to_string(),
            ));
        }
        if edits.timeline_months == Some(0) {
            return Err(MarketError::Validation(
                "timeline_months must be positive".to_string(),
            ));
        }
        self.listings.apply_edits(listing_id, editor, edits).await
    }

    /// Returns a listing by id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ListingNotFound`] if absent.
    pub async fn get_listing(&self, listing_id: ListingId) -> Result<StartupListing, MarketError> {
        self.listings.get(listing_id).await
    }

    /// Returns listing summaries, optionally only verified ones.
    pub async fn list_listings(&self, verified_only: bool) -> Vec<ListingSummary> {
        self.listings.list(verified_only).await
    }

    /// Returns the listings owned by one developer.
    pub async fn list_by_developer(&self, developer_id: DeveloperId) -> Vec<ListingSummary> {
        self.listings.list_by_developer(developer_id).await
    }
}

fn validate_draft(draft: &ListingDraft) -> Result<(), MarketError> {
    if draft.name.trim().is_empty() {
        return Err(MarketError::Validation("name is required".to_string()));
    }
    if draft.description.trim().is_empty() {
        return Err(MarketError::Validation(
            "description is required".to_string(),
        ));
    }
    if draft.contact.trim().is_empty() {
        return Err(MarketError::Validation(
            "contact identity is required".to_string(),
        ));
    }
    if draft.funding_goal <= Decimal::ZERO {
        return Err(MarketError::Validation(
            "funding goal must be positive".to_string(),
        ));
    }
    if draft.team_size == Some(0) {
        return Err(MarketError::Validation(
            "team_size must be positive".to_string(),
        ));
    }
    if draft.timeline_months == Some(0) {
        return Err(MarketError::Validation(
            "timeline_months must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::developer::test_snapshot;
    use crate::domain::listing::test_draft;
    use crate::service::IdentityReconciler;

    async fn make_registrar_with_repo() -> (ListingRegistrar, DeveloperId, RepositoryId) {
        let directory = Arc::new(IdentityDirectory::new());
        let event_bus = EventBus::new(100);
        let reconciler = IdentityReconciler::new(Arc::clone(&directory), event_bus.clone());
        let Ok(report) = reconciler.reconcile("octocat", test_snapshot("9001", "widget")).await
        else {
            panic!("reconcile failed");
        };
        let registrar =
            ListingRegistrar::new(directory, Arc::new(ListingBook::new()), event_bus);
        (registrar, report.developer.id, report.repository.id)
    }

    #[tokio::test]
    async fn register_emits_event() {
        let (registrar, developer, repository) = make_registrar_with_repo().await;
        let mut rx = registrar.event_bus.subscribe();

        let result = registrar
            .register_listing(developer, repository, test_draft("widget", 50_000))
            .await;
        assert!(result.is_ok());

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "listing_registered");
    }

    #[tokio::test]
    async fn non_positive_goal_is_rejected() {
        let (registrar, developer, repository) = make_registrar_with_repo().await;
        let mut draft = test_draft("widget", 1);
        draft.funding_goal = Decimal::ZERO;
        let result = registrar.register_listing(developer, repository, draft).await;
        assert!(matches!(result, Err(MarketError::Validation(_))));
    }

    #[tokio::test]
    async fn stranger_cannot_list_someone_elses_repository() {
        let (registrar, _developer, repository) = make_registrar_with_repo().await;
        let stranger = DeveloperId::new();
        let result = registrar
            .register_listing(stranger, repository, test_draft("widget", 50_000))
            .await;
        // The stranger does not exist in the directory at all.
        assert!(matches!(result, Err(MarketError::DeveloperNotFound(_))));
    }

    #[tokio::test]
    async fn relisting_reports_the_existing_campaign() {
        let (registrar, developer, repository) = make_registrar_with_repo().await;
        let Ok(first) = registrar
            .register_listing(developer, repository, test_draft("widget", 50_000))
            .await
        else {
            panic!("first registration failed");
        };

        let result = registrar
            .register_listing(developer, repository, test_draft("widget again", 10_000))
            .await;
        assert!(matches!(
            result,
            Err(MarketError::RepositoryAlreadyListed { listing_id, .. }) if listing_id == first
        ));
    }

    #[tokio::test]
    async fn update_rejects_empty_edit_set() {
        let (registrar, developer, repository) = make_registrar_with_repo().await;
        let Ok(listing_id) = registrar
            .register_listing(developer, repository, test_draft("widget", 50_000))
            .await
        else {
            panic!("registration failed");
        };
        let result = registrar
            .update_listing(listing_id, developer, ListingEdits::default())
            .await;
        assert!(matches!(result, Err(MarketError::Validation(_))));
    }
}
