//! Developer and repository records produced by identity reconciliation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DeveloperId, RepositoryId};

/// One external account identity, keyed by its unique handle.
///
/// Created on the first reconciliation of a never-seen handle and never
/// deleted. The only permitted mutation is attaching a payout address.
#[derive(Debug, Clone, Serialize)]
pub struct Developer {
    /// Internal identifier (immutable after creation).
    pub id: DeveloperId,

    /// External account handle, unique across all developers.
    pub handle: String,

    /// Address funding settlements are paid out to, once attached.
    pub payout_address: Option<String>,

    /// First-reconciliation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Developer {
    /// Creates a new developer record for a never-seen handle.
    #[must_use]
    pub fn new(handle: String) -> Self {
        Self {
            id: DeveloperId::new(),
            handle,
            payout_address: None,
            created_at: Utc::now(),
        }
    }
}

/// Display metadata for a repository, refreshed last-write-wins on every
/// sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoMetadata {
    /// Short repository name.
    pub name: String,
    /// `owner/name` form as known to the source-control host.
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

/// Reconciler input: one observation of an external repository.
///
/// The `external_id` is an opaque identifier unique within the
/// source-control host's namespace; it is never parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSnapshot {
    /// Host-assigned repository identifier.
    pub external_id: String,
    /// Display metadata captured at observation time.
    #[serde(flatten)]
    pub metadata: RepoMetadata,
}

/// Internal repository record.
///
/// Belongs to exactly one [`Developer`] for its lifetime; re-reconciliation
/// refreshes [`Repository::metadata`] but never re-parents the record.
#[derive(Debug, Clone, Serialize)]
pub struct Repository {
    /// Internal identifier (immutable after creation).
    pub id: RepositoryId,

    /// Host-assigned identifier, unique across all repositories.
    pub external_id: String,

    /// Owning developer (immutable after creation).
    pub developer_id: DeveloperId,

    /// Display metadata, refreshed on every sync.
    pub metadata: RepoMetadata,

    /// First-sync timestamp.
    pub created_at: DateTime<Utc>,

    /// Timestamp of the most recent metadata refresh.
    pub synced_at: DateTime<Utc>,
}

impl Repository {
    /// Creates a repository record from its first observed snapshot.
    #[must_use]
    pub fn new(developer_id: DeveloperId, snapshot: RepoSnapshot) -> Self {
        let now = Utc::now();
        Self {
            id: RepositoryId::new(),
            external_id: snapshot.external_id,
            developer_id,
            metadata: snapshot.metadata,
            created_at: now,
            synced_at: now,
        }
    }

    /// Replaces the display metadata with a newer observation.
    pub fn refresh(&mut self, metadata: RepoMetadata) {
        self.metadata = metadata;
        self.synced_at = Utc::now();
    }
}

#[cfg(test)]
pub(crate) fn test_snapshot(external_id: &str, name: &str) -> RepoSnapshot {
    RepoSnapshot {
        external_id: external_id.to_string(),
        metadata: RepoMetadata {
            name: name.to_string(),
            full_name: format!("octocat/{name}"),
            description: Some("a test repository".to_string()),
            html_url: format!("https://github.com/octocat/{name}"),
            language: Some("Rust".to_string()),
            stars_count: 42,
            forks_count: 7,
            open_issues_count: 3,
            is_private: false,
            pushed_at: Some(Utc::now()),
        },
    }
}
