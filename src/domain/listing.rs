//! Startup listing records: funding campaigns bound to one repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{DeveloperId, ListingId, RepositoryId};

/// How the campaign intends to compensate its backers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FundingType {
    /// No-strings grant funding.
    Grant,
    /// Equity stake.
    Equity,
    /// Revenue-share agreement.
    RevenueShare,
    /// Funds released per milestone.
    MilestoneBased,
}

/// Maturity of the underlying project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStage {
    /// Concept only.
    Idea,
    /// Early prototype.
    Prototype,
    /// Minimum viable product.
    Mvp,
    /// Beta with real users.
    Beta,
    /// In production.
    Production,
}

/// Review lifecycle of a listing.
///
/// Flips away from `Pending` exactly once, by an out-of-band review
/// process; a `Rejected` listing releases its repository for re-listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Awaiting review.
    Pending,
    /// Approved and publicly visible.
    Verified,
    /// Rejected by review.
    Rejected,
}

/// Required and optional campaign fields supplied at registration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingDraft {
    /// Campaign name.
    pub name: String,
    /// Campaign description.
    pub description: String,
    /// Funding goal in the listing's display currency. Must be positive.
    pub funding_goal: Decimal,
    /// Contact identity for the campaign (email or equivalent).
    pub contact: String,
    /// Compensation model.
    #[serde(default)]
    pub funding_type: Option<FundingType>,
    /// Project maturity.
    #[serde(default)]
    pub project_stage: Option<ProjectStage>,
    /// Team head count.
    #[serde(default)]
    pub team_size: Option<u32>,
    /// Expected timeline in months.
    #[serde(default)]
    pub timeline_months: Option<u32>,
    /// Free-form breakdown of how funds will be used.
    #[serde(default)]
    pub use_of_funds: Option<String>,
    /// Project website.
    #[serde(default)]
    pub website_url: Option<String>,
    /// Ordered classification tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Optional-field edits permitted to the owning developer after creation.
///
/// `None` leaves a field untouched; `Some` replaces it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingEdits {
    /// New compensation model.
    #[serde(default)]
    pub funding_type: Option<FundingType>,
    /// New project maturity.
    #[serde(default)]
    pub project_stage: Option<ProjectStage>,
    /// New team head count.
    #[serde(default)]
    pub team_size: Option<u32>,
    /// New timeline in months.
    #[serde(default)]
    pub timeline_months: Option<u32>,
    /// New use-of-funds breakdown.
    #[serde(default)]
    pub use_of_funds: Option<String>,
    /// New project website.
    #[serde(default)]
    pub website_url: Option<String>,
    /// Replacement tag list.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl ListingEdits {
    /// Returns `true` if no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.funding_type.is_none()
            && self.project_stage.is_none()
            && self.team_size.is_none()
            && self.timeline_months.is_none()
            && self.use_of_funds.is_none()
            && self.website_url.is_none()
            && self.tags.is_none()
    }
}

/// A funding campaign bound to exactly one developer and one repository.
#[derive(Debug, Clone, Serialize)]
pub struct StartupListing {
    /// Internal identifier (immutable after creation).
    pub id: ListingId,

    /// Owning developer (immutable after creation).
    pub developer_id: DeveloperId,

    /// Bound repository (immutable after creation).
    pub repository_id: RepositoryId,

    /// Campaign name.
    pub name: String,

    /// Campaign description.
    pub description: String,

    /// Funding goal in display currency. Always positive.
    pub funding_goal: Decimal,

    /// Contact identity.
    pub contact: String,

    /// Whether review approved the listing.
    pub verified: bool,

    /// Review lifecycle status.
    pub status: ListingStatus,

    /// Compensation model.
    pub funding_type: Option<FundingType>,

    /// Project maturity.
    pub project_stage: Option<ProjectStage>,

    /// Team head count.
    pub team_size: Option<u32>,

    /// Expected timeline in months.
    pub timeline_months: Option<u32>,

    /// Free-form breakdown of how funds will be used.
    pub use_of_funds: Option<String>,

    /// Project website.
    pub website_url: Option<String>,

    /// Ordered classification tags.
    pub tags: Vec<String>,

    /// Creation timestamp (immutable after creation).
    pub created_at: DateTime<Utc>,
}

impl StartupListing {
    /// Creates a pending listing from a validated draft.
    #[must_use]
    pub fn new(developer_id: DeveloperId, repository_id: RepositoryId, draft: ListingDraft) -> Self {
        Self {
            id: ListingId::new(),
            developer_id,
            repository_id,
            name: draft.name,
            description: draft.description,
            funding_goal: draft.funding_goal,
            contact: draft.contact,
            verified: false,
            status: ListingStatus::Pending,
            funding_type: draft.funding_type,
            project_stage: draft.project_stage,
            team_size: draft.team_size,
            timeline_months: draft.timeline_months,
            use_of_funds: draft.use_of_funds,
            website_url: draft.website_url,
            tags: draft.tags,
            created_at: Utc::now(),
        }
    }

    /// Applies optional-field edits in place.
    pub fn apply_edits(&mut self, edits: ListingEdits) {
        if let Some(v) = edits.funding_type {
            self.funding_type = Some(v);
        }
        if let Some(v) = edits.project_stage {
            self.project_stage = Some(v);
        }
        if let Some(v) = edits.team_size {
            self.team_size = Some(v);
        }
        if let Some(v) = edits.timeline_months {
            self.timeline_months = Some(v);
        }
        if let Some(v) = edits.use_of_funds {
            self.use_of_funds = Some(v);
        }
        if let Some(v) = edits.website_url {
            self.website_url = Some(v);
        }
        if let Some(v) = edits.tags {
            self.tags = v;
        }
    }
}

/// Lightweight listing view for list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ListingSummary {
    /// Listing identifier.
    pub id: ListingId,
    /// Campaign name.
    pub name: String,
    /// Funding goal in display currency.
    pub funding_goal: Decimal,
    /// Review status.
    pub status: ListingStatus,
    /// Whether review approved the listing.
    pub verified: bool,
    /// Project maturity.
    pub project_stage: Option<ProjectStage>,
    /// Classification tags.
    pub tags: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&StartupListing> for ListingSummary {
    fn from(listing: &StartupListing) -> Self {
        Self {
            id: listing.id,
            name: listing.name.clone(),
            funding_goal: listing.funding_goal,
            status: listing.status,
            verified: listing.verified,
            project_stage: listing.project_stage,
            tags: listing.tags.clone(),
            created_at: listing.created_at,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_draft(name: &str, goal: u64) -> ListingDraft {
    ListingDraft {
        name: name.to_string(),
        description: "an open source startup".to_string(),
        funding_goal: Decimal::from(goal),
        contact: "founder@example.com".to_string(),
        funding_type: Some(FundingType::Grant),
        project_stage: Some(ProjectStage::Mvp),
        team_size: Some(3),
        timeline_months: Some(12),
        use_of_funds: None,
        website_url: None,
        tags: vec!["rust".to_string()],
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_listing_starts_pending_and_unverified() {
        let listing = StartupListing::new(
            DeveloperId::new(),
            RepositoryId::new(),
            test_draft("widget", 50_000),
        );
        assert_eq!(listing.status, ListingStatus::Pending);
        assert!(!listing.verified);
    }

    #[test]
    fn edits_touch_only_supplied_fields() {
        let mut listing = StartupListing::new(
            DeveloperId::new(),
            RepositoryId::new(),
            test_draft("widget", 50_000),
        );
        listing.apply_edits(ListingEdits {
            team_size: Some(5),
            ..ListingEdits::default()
        });
        assert_eq!(listing.team_size, Some(5));
        assert_eq!(listing.project_stage, Some(ProjectStage::Mvp));
        assert_eq!(listing.timeline_months, Some(12));
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ListingStatus::Pending).unwrap_or_default();
        assert_eq!(json, "\"pending\"");
        let json = serde_json::to_string(&FundingType::RevenueShare).unwrap_or_default();
        assert_eq!(json, "\"revenue_share\"");
    }
}
