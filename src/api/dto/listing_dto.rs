//! Listing DTOs for register, review, edit, and list operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::{
    FundingType, ListingEdits, ListingStatus, ListingSummary, ProjectStage, StartupListing,
};

/// Request body for `POST /listings`.
///
/// Monetary amounts travel as decimal strings to preserve exactness.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterListingRequest {
    /// Registering developer.
    pub developer_id: uuid::Uuid,
    /// Repository to bind the campaign to.
    pub repository_id: uuid::Uuid,
    /// Campaign name.
    pub name: String,
    /// Campaign description.
    pub description: String,
    /// Funding goal as a decimal string (e.g. `"50000"`).
    pub funding_goal: String,
    /// Contact identity.
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
    /// Use-of-funds breakdown.
    #[serde(default)]
    pub use_of_funds: Option<String>,
    /// Project website.
    #[serde(default)]
    pub website_url: Option<String>,
    /// Ordered classification tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Response body for `POST /listings` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterListingResponse {
    /// New listing id.
    pub listing_id: uuid::Uuid,
    /// Initial review status (always `pending`).
    pub status: ListingStatus,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Full listing detail for `GET /listings/:id`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListingDetailResponse {
    /// Listing id.
    pub listing_id: uuid::Uuid,
    /// Owning developer.
    pub developer_id: uuid::Uuid,
    /// Bound repository.
    pub repository_id: uuid::Uuid,
    /// Campaign name.
    pub name: String,
    /// Campaign description.
    pub description: String,
    /// Funding goal as a decimal string.
    pub funding_goal: String,
    /// Contact identity.
    pub contact: String,
    /// Whether review approved the listing.
    pub verified: bool,
    /// Review status.
    pub status: ListingStatus,
    /// Compensation model.
    pub funding_type: Option<FundingType>,
    /// Project maturity.
    pub project_stage: Option<ProjectStage>,
    /// Team head count.
    pub team_size: Option<u32>,
    /// Expected timeline in months.
    pub timeline_months: Option<u32>,
    /// Use-of-funds breakdown.
    pub use_of_funds: Option<String>,
    /// Project website.
    pub website_url: Option<String>,
    /// Classification tags.
    pub tags: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&StartupListing> for ListingDetailResponse {
    fn from(listing: &StartupListing) -> Self {
        Self {
            listing_id: *listing.id.as_uuid(),
            developer_id: *listing.developer_id.as_uuid(),
            repository_id: *listing.repository_id.as_uuid(),
            name: listing.name.clone(),
            description: listing.description.clone(),
            funding_goal: listing.funding_goal.to_string(),
            contact: listing.contact.clone(),
            verified: listing.verified,
            status: listing.status,
            funding_type: listing.funding_type,
            project_stage: listing.project_stage,
            team_size: listing.team_size,
            timeline_months: listing.timeline_months,
            use_of_funds: listing.use_of_funds.clone(),
            website_url: listing.website_url.clone(),
            tags: listing.tags.clone(),
            created_at: listing.created_at,
        }
    }
}

/// Listing summary for list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListingSummaryDto {
    /// Listing id.
    pub listing_id: uuid::Uuid,
    /// Campaign name.
    pub name: String,
    /// Funding goal as a decimal string.
    pub funding_goal: String,
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

impl From<ListingSummary> for ListingSummaryDto {
    fn from(summary: ListingSummary) -> Self {
        Self {
            listing_id: *summary.id.as_uuid(),
            name: summary.name,
            funding_goal: summary.funding_goal.to_string(),
            status: summary.status,
            verified: summary.verified,
            project_stage: summary.project_stage,
            tags: summary.tags,
            created_at: summary.created_at,
        }
    }
}

/// Paginated list response for `GET /listings`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListingListResponse {
    /// Listing summaries.
    pub data: Vec<ListingSummaryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Filter query parameters for `GET /listings`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListingFilterParams {
    /// When `true`, only verified listings are returned.
    #[serde(default)]
    pub verified: bool,
}

/// Request body for `POST /listings/:id/verify`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyListingRequest {
    /// Review decision: `true` verifies, `false` rejects.
    pub approved: bool,
}

/// Request body for `PATCH /listings/:id`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateListingRequest {
    /// Developer performing the edit; must own the listing.
    pub developer_id: uuid::Uuid,
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

impl UpdateListingRequest {
    /// Extracts the edit set, leaving the editor id to the handler.
    #[must_use]
    pub fn into_edits(self) -> ListingEdits {
        ListingEdits {
            funding_type: self.funding_type,
            project_stage: self.project_stage,
            team_size: self.team_size,
            timeline_months: self.timeline_months,
            use_of_funds: self.use_of_funds,
            website_url: self.website_url,
            tags: self.tags,
        }
    }
}
