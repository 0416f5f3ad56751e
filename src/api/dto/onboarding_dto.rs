//! Onboarding DTOs: repository sync and developer lookups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::listing_dto::ListingSummaryDto;
use crate::domain::{Developer, RepoMetadata, RepoSnapshot, ReconcileReport};

/// Repository observation carried by a sync request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RepoSnapshotDto {
    /// Host-assigned repository identifier (opaque).
    pub external_id: String,
    /// Short repository name.
    pub name: String,
    /// `owner/name` form.
    pub full_name: String,
    /// Repository description.
    #[serde(default)]
    pub description: Option<String>,
    /// Web URL of the repository.
    pub html_url: String,
    /// Primary language.
    #[serde(default)]
    pub language: Option<String>,
    /// Star count.
    #[serde(default)]
    pub stars_count: u64,
    /// Fork count.
    #[serde(default)]
    pub forks_count: u64,
    /// Open issue count.
    #[serde(default)]
    pub open_issues_count: u64,
    /// Whether the repository is private on the host.
    #[serde(default)]
    pub is_private: bool,
    /// Last-pushed timestamp as reported by the host.
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
}

impl From<RepoSnapshotDto> for RepoSnapshot {
    fn from(dto: RepoSnapshotDto) -> Self {
        Self {
            external_id: dto.external_id,
            metadata: RepoMetadata {
                name: dto.name,
                full_name: dto.full_name,
                description: dto.description,
                html_url: dto.html_url,
                language: dto.language,
                stars_count: dto.stars_count,
                forks_count: dto.forks_count,
                open_issues_count: dto.open_issues_count,
                is_private: dto.is_private,
                pushed_at: dto.pushed_at,
            },
        }
    }
}

/// Request body for `POST /sync`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SyncRequest {
    /// External account handle.
    pub handle: String,
    /// Observed repository snapshot.
    pub repository: RepoSnapshotDto,
}

/// Response body for `POST /sync`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncResponse {
    /// Resolved developer id.
    pub developer_id: uuid::Uuid,
    /// Resolved repository id.
    pub repository_id: uuid::Uuid,
    /// Host-assigned repository identifier.
    pub external_id: String,
    /// `true` if this call created the developer record.
    pub developer_created: bool,
    /// `true` if this call created the repository record.
    pub repository_created: bool,
    /// Sync timestamp.
    pub synced_at: DateTime<Utc>,
}

impl From<&ReconcileReport> for SyncResponse {
    fn from(report: &ReconcileReport) -> Self {
        Self {
            developer_id: *report.developer.id.as_uuid(),
            repository_id: *report.repository.id.as_uuid(),
            external_id: report.repository.external_id.clone(),
            developer_created: report.developer_created,
            repository_created: report.repository_created,
            synced_at: report.repository.synced_at,
        }
    }
}

/// Request body for `POST /developers/:id/payout-address`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PayoutAddressRequest {
    /// Address funding settlements are paid out to.
    pub address: String,
}

/// Response body for developer endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeveloperResponse {
    /// Developer id.
    pub developer_id: uuid::Uuid,
    /// External account handle.
    pub handle: String,
    /// Attached payout address, if any.
    pub payout_address: Option<String>,
    /// First-reconciliation timestamp.
    pub created_at: DateTime<Utc>,
    /// Listings owned by this developer.
    pub listings: Vec<ListingSummaryDto>,
}

impl DeveloperResponse {
    /// Builds the response from a developer record and their listings.
    #[must_use]
    pub fn new(developer: &Developer, listings: Vec<ListingSummaryDto>) -> Self {
        Self {
            developer_id: *developer.id.as_uuid(),
            handle: developer.handle.clone(),
            payout_address: developer.payout_address.clone(),
            created_at: developer.created_at,
            listings,
        }
    }
}
