//! Concurrent developer/repository storage with unique external indexes.
//!
//! [`IdentityDirectory`] stores developers and repositories in `HashMap`s
//! protected by a single [`tokio::sync::RwLock`], with secondary indexes
//! on the unique external identifiers (account handle, host repository
//! id). All check-then-insert sequences run under one write lock, so the
//! indexes behave like storage-level unique constraints: a concurrent
//! "first" reconciliation that loses the lock race simply finds the
//! winner's record on re-lookup and proceeds with it.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::developer::{Developer, RepoSnapshot, Repository};
use super::{DeveloperId, RepositoryId};
use crate::error::MarketError;

#[derive(Debug, Default)]
struct DirectoryInner {
    developers: HashMap<DeveloperId, Developer>,
    by_handle: HashMap<String, DeveloperId>,
    repositories: HashMap<RepositoryId, Repository>,
    by_external: HashMap<String, RepositoryId>,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    /// The resolved developer record.
    pub developer: Developer,
    /// The resolved repository record.
    pub repository: Repository,
    /// `true` if this call created the developer.
    pub developer_created: bool,
    /// `true` if this call created the repository (as opposed to
    /// refreshing its metadata).
    pub repository_created: bool,
}

/// Central store for developer and repository identity records.
///
/// # Concurrency
///
/// - Lookups take the read lock and may run concurrently.
/// - [`IdentityDirectory::reconcile`] takes the write lock for its whole
///   compare-and-upsert, making N identical concurrent calls converge on
///   exactly one developer and one repository row.
#[derive(Debug, Default)]
pub struct IdentityDirectory {
    inner: RwLock<DirectoryInner>,
}

impl IdentityDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps an external (handle, repository snapshot) pair onto internal
    /// records, creating whatever does not exist yet.
    ///
    /// An existing repository gets its metadata refreshed in place;
    /// ownership is never reassigned.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::OwnershipConflict`] if the repository
    /// already belongs to a different developer than the one the handle
    /// resolves to. No metadata is written in that case.
    pub async fn reconcile(
        &self,
        handle: &str,
        snapshot: RepoSnapshot,
    ) -> Result<ReconcileReport, MarketError> {
        let mut inner = self.inner.write().await;

        let (developer_id, developer_created) = match inner.by_handle.get(handle) {
            Some(id) => (*id, false),
            None => {
                let developer = Developer::new(handle.to_string());
                let id = developer.id;
                inner.by_handle.insert(handle.to_string(), id);
                inner.developers.insert(id, developer);
                (id, true)
            }
        };

        let (repository_id, repository_created) =
            match inner.by_external.get(&snapshot.external_id) {
                Some(id) => {
                    let id = *id;
                    let Some(repo) = inner.repositories.get_mut(&id) else {
                        return Err(MarketError::Internal(format!(
                            "external index points at missing repository {id}"
                        )));
                    };
                    if repo.developer_id != developer_id {
                        return Err(MarketError::OwnershipConflict { repository_id: id });
                    }
                    repo.refresh(snapshot.metadata);
                    (id, false)
                }
                None => {
                    let repository = Repository::new(developer_id, snapshot);
                    let id = repository.id;
                    inner.by_external.insert(repository.external_id.clone(), id);
                    inner.repositories.insert(id, repository);
                    (id, true)
                }
            };

        let developer = inner
            .developers
            .get(&developer_id)
            .cloned()
            .ok_or(MarketError::DeveloperNotFound(developer_id))?;
        let repository = inner
            .repositories
            .get(&repository_id)
            .cloned()
            .ok_or(MarketError::RepositoryNotFound(repository_id))?;

        Ok(ReconcileReport {
            developer,
            repository,
            developer_created,
            repository_created,
        })
    }

    /// Returns a developer by internal id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::DeveloperNotFound`] if absent.
    pub async fn developer(&self, id: DeveloperId) -> Result<Developer, MarketError> {
        let inner = self.inner.read().await;
        inner
            .developers
            .get(&id)
            .cloned()
            .ok_or(MarketError::DeveloperNotFound(id))
    }

    /// Returns a developer by external handle, if known.
    pub async fn developer_by_handle(&self, handle: &str) -> Option<Developer> {
        let inner = self.inner.read().await;
        let id = inner.by_handle.get(handle)?;
        inner.developers.get(id).cloned()
    }

    /// Returns a repository by internal id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::RepositoryNotFound`] if absent.
    pub async fn repository(&self, id: RepositoryId) -> Result<Repository, MarketError> {
        let inner = self.inner.read().await;
        inner
            .repositories
            .get(&id)
            .cloned()
            .ok_or(MarketError::RepositoryNotFound(id))
    }

    /// Returns a repository by its host-assigned identifier, if known.
    pub async fn repository_by_external(&self, external_id: &str) -> Option<Repository> {
        let inner = self.inner.read().await;
        let id = inner.by_external.get(external_id)?;
        inner.repositories.get(id).cloned()
    }

    /// Attaches a payout address to a developer. The only permitted
    /// developer mutation.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::DeveloperNotFound`] if absent.
    pub async fn attach_payout_address(
        &self,
        id: DeveloperId,
        address: String,
    ) -> Result<Developer, MarketError> {
        let mut inner = self.inner.write().await;
        let developer = inner
            .developers
            .get_mut(&id)
            .ok_or(MarketError::DeveloperNotFound(id))?;
        developer.payout_address = Some(address);
        Ok(developer.clone())
    }

    /// Returns the number of known developers.
    pub async fn developer_count(&self) -> usize {
        self.inner.read().await.developers.len()
    }

    /// Returns the number of known repositories.
    pub async fn repository_count(&self) -> usize {
        self.inner.read().await.repositories.len()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::developer::test_snapshot;

    #[tokio::test]
    async fn first_reconcile_creates_both_records() {
        let directory = IdentityDirectory::new();
        let report = directory.reconcile("octocat", test_snapshot("9001", "widget")).await;
        let Ok(report) = report else {
            panic!("reconcile failed");
        };
        assert!(report.developer_created);
        assert!(report.repository_created);
        assert_eq!(report.repository.developer_id, report.developer.id);
    }

    #[tokio::test]
    async fn second_reconcile_refreshes_in_place() {
        let directory = IdentityDirectory::new();
        let Ok(first) = directory.reconcile("octocat", test_snapshot("9001", "widget")).await
        else {
            panic!("first reconcile failed");
        };

        let mut snapshot = test_snapshot("9001", "widget");
        snapshot.metadata.stars_count = 1_000;
        let Ok(second) = directory.reconcile("octocat", snapshot).await else {
            panic!("second reconcile failed");
        };

        assert!(!second.developer_created);
        assert!(!second.repository_created);
        assert_eq!(second.developer.id, first.developer.id);
        assert_eq!(second.repository.id, first.repository.id);
        assert_eq!(second.repository.metadata.stars_count, 1_000);
        assert_eq!(directory.developer_count().await, 1);
        assert_eq!(directory.repository_count().await, 1);
    }

    #[tokio::test]
    async fn concurrent_reconciles_converge_on_one_row_pair() {
        let directory = Arc::new(IdentityDirectory::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let directory = Arc::clone(&directory);
            handles.push(tokio::spawn(async move {
                directory.reconcile("octocat", test_snapshot("9001", "widget")).await
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            let Ok(Ok(report)) = handle.await else {
                panic!("reconcile task failed");
            };
            ids.push((report.developer.id, report.repository.id));
        }

        let Some(first) = ids.first().copied() else {
            panic!("no results");
        };
        assert!(ids.iter().all(|pair| *pair == first));
        assert_eq!(directory.developer_count().await, 1);
        assert_eq!(directory.repository_count().await, 1);
    }

    #[tokio::test]
    async fn foreign_handle_cannot_steal_a_repository() {
        let directory = IdentityDirectory::new();
        let Ok(original) = directory.reconcile("octocat", test_snapshot("9001", "widget")).await
        else {
            panic!("reconcile failed");
        };

        let mut hijack = test_snapshot("9001", "widget");
        hijack.metadata.stars_count = 0;
        let result = directory.reconcile("mallory", hijack).await;
        assert!(matches!(
            result,
            Err(MarketError::OwnershipConflict { repository_id }) if repository_id == original.repository.id
        ));

        // The conflict must not have touched the stored metadata.
        let Ok(repo) = directory.repository(original.repository.id).await else {
            panic!("repository lookup failed");
        };
        assert_eq!(repo.metadata.stars_count, 42);
        assert_eq!(repo.developer_id, original.developer.id);
    }

    #[tokio::test]
    async fn payout_address_attaches_once_known() {
        let directory = IdentityDirectory::new();
        let Ok(report) = directory.reconcile("octocat", test_snapshot("9001", "widget")).await
        else {
            panic!("reconcile failed");
        };

        let updated = directory
            .attach_payout_address(report.developer.id, "0xF00".to_string())
            .await;
        let Ok(updated) = updated else {
            panic!("attach failed");
        };
        assert_eq!(updated.payout_address.as_deref(), Some("0xF00"));

        let missing = directory
            .attach_payout_address(DeveloperId::new(), "0xF00".to_string())
            .await;
        assert!(missing.is_err());
    }
}
