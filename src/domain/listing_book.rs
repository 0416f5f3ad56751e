//! Concurrent listing storage enforcing one active listing per repository.
//!
//! [`ListingBook`] keeps all listings in a `HashMap` behind a
//! [`tokio::sync::RwLock`], with a secondary index from repository id to
//! its active (non-rejected) listing. The check-then-insert of
//! registration runs under one write lock, so re-listing an already
//! campaigned repository is rejected instead of duplicated.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::listing::{ListingEdits, ListingStatus, ListingSummary, StartupListing};
use super::{DeveloperId, ListingId, RepositoryId};
use crate::error::MarketError;

#[derive(Debug, Default)]
struct BookInner {
    listings: HashMap<ListingId, StartupListing>,
    by_repository: HashMap<RepositoryId, ListingId>,
}

/// Central store for startup listings.
#[derive(Debug, Default)]
pub struct ListingBook {
    inner: RwLock<BookInner>,
}

impl ListingBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new listing, binding its repository.
    ///
    /// A repository slot held by a rejected listing is released and may
    /// be re-bound here.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::RepositoryAlreadyListed`] if the repository
    /// is already bound to a non-rejected listing.
    pub async fn insert(&self, listing: StartupListing) -> Result<ListingId, MarketError> {
        let mut inner = self.inner.write().await;
        if let Some(existing_id) = inner.by_repository.get(&listing.repository_id)
            && let Some(existing) = inner.listings.get(existing_id)
            && existing.status != ListingStatus::Rejected
        {
            return Err(MarketError::RepositoryAlreadyListed {
                repository_id: listing.repository_id,
                listing_id: *existing_id,
            });
        }
        let id = listing.id;
        inner.by_repository.insert(listing.repository_id, id);
        inner.listings.insert(id, listing);
        Ok(id)
    }

    /// Returns a listing by id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ListingNotFound`] if absent.
    pub async fn get(&self, id: ListingId) -> Result<StartupListing, MarketError> {
        let inner = self.inner.read().await;
        inner
            .listings
            .get(&id)
            .cloned()
            .ok_or(MarketError::ListingNotFound(id))
    }

    /// Returns the active listing bound to a repository, if any.
    pub async fn active_listing_for(&self, repository_id: RepositoryId) -> Option<ListingId> {
        let inner = self.inner.read().await;
        let id = inner.by_repository.get(&repository_id)?;
        let listing = inner.listings.get(id)?;
        (listing.status != ListingStatus::Rejected).then_some(*id)
    }

    /// Applies the one-shot review decision to a pending listing.
    ///
    /// Rejection releases the repository's listing slot.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ListingNotFound`] if absent, or
    /// [`MarketError::InvalidTransition`] if the listing already left
    /// `Pending`.
    pub async fn review(
        &self,
        id: ListingId,
        approved: bool,
    ) -> Result<StartupListing, MarketError> {
        let mut inner = self.inner.write().await;
        let listing = inner
            .listings
            .get_mut(&id)
            .ok_or(MarketError::ListingNotFound(id))?;
        if listing.status != ListingStatus::Pending {
            return Err(MarketError::InvalidTransition(format!(
                "listing {id} was already reviewed"
            )));
        }
        listing.verified = approved;
        listing.status = if approved {
            ListingStatus::Verified
        } else {
            ListingStatus::Rejected
        };
        let snapshot = listing.clone();
        if snapshot.status == ListingStatus::Rejected
            && inner.by_repository.get(&snapshot.repository_id) == Some(&id)
        {
            inner.by_repository.remove(&snapshot.repository_id);
        }
        Ok(snapshot)
    }

    /// Applies optional-field edits on behalf of the owning developer.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ListingNotFound`] if absent, or
    /// [`MarketError::Forbidden`] if `editor` does not own the listing.
    pub async fn apply_edits(
        &self,
        id: ListingId,
        editor: DeveloperId,
        edits: ListingEdits,
    ) -> Result<StartupListing, MarketError> {
        let mut inner = self.inner.write().await;
        let listing = inner
            .listings
            .get_mut(&id)
            .ok_or(MarketError::ListingNotFound(id))?;
        if listing.developer_id != editor {
            return Err(MarketError::Forbidden(format!(
                "developer {editor} does not own listing {id}"
            )));
        }
        listing.apply_edits(edits);
        Ok(listing.clone())
    }

    /// Returns summaries of all listings, optionally only verified ones.
    pub async fn list(&self, verified_only: bool) -> Vec<ListingSummary> {
        let inner = self.inner.read().await;
        let mut summaries: Vec<ListingSummary> = inner
            .listings
            .values()
            .filter(|l| !verified_only || l.verified)
            .map(ListingSummary::from)
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    /// Returns summaries of the listings owned by one developer.
    pub async fn list_by_developer(&self, developer_id: DeveloperId) -> Vec<ListingSummary> {
        let inner = self.inner.read().await;
        let mut summaries: Vec<ListingSummary> = inner
            .listings
            .values()
            .filter(|l| l.developer_id == developer_id)
            .map(ListingSummary::from)
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

}
