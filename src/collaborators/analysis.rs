//! AI content-analysis collaborator seam.
//!
//! Analysis of a listing's repository is produced by an external model
//! collaborator. The gateway treats the result as opaque apart from
//! validating score ranges, and caches it per listing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::domain::ListingId;
use crate::error::MarketError;

/// Analysis result for one listing's repository.
///
/// All scores are on a 0–100 scale; the remaining fields are passed
/// through without interpretation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoAnalysis {
    /// Likelihood the campaign is fraudulent (0 = none, 100 = certain).
    pub fraud_risk_score: u8,
    /// Growth potential of the project.
    pub growth_potential_score: u8,
    /// Code quality assessment.
    pub code_quality_score: u8,
    /// Free-form summary.
    pub summary: String,
    /// Identified risk factors.
    pub risk_factors: Vec<String>,
    /// Identified growth indicators.
    pub growth_indicators: Vec<String>,
    /// Recommendations for the reviewer.
    pub recommendations: Vec<String>,
    /// When the analysis was produced.
    pub analyzed_at: DateTime<Utc>,
}

impl RepoAnalysis {
    /// Checks that every score is within the 0–100 range.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Validation`] for an out-of-range score.
    pub fn validate(&self) -> Result<(), MarketError> {
        for (name, score) in [
            ("fraud_risk_score", self.fraud_risk_score),
            ("growth_potential_score", self.growth_potential_score),
            ("code_quality_score", self.code_quality_score),
        ] {
            if score > 100 {
                return Err(MarketError::Validation(format!(
                    "analysis {name} {score} is out of range"
                )));
            }
        }
        Ok(())
    }
}

/// External analysis model, injected by the embedder.
pub trait AnalysisProvider: fmt::Debug + Send + Sync {
    /// Produces an analysis of the repository backing a listing.
    ///
    /// # Errors
    ///
    /// Implementations should return
    /// [`MarketError::CollaboratorUnavailable`] for transient upstream
    /// failures so callers know a retry is safe.
    fn analyze<'a>(
        &'a self,
        listing_id: ListingId,
        repository_url: &'a str,
    ) -> BoxFuture<'a, Result<RepoAnalysis, MarketError>>;
}

/// Per-listing cache in front of an [`AnalysisProvider`].
///
/// Analyses are expensive and deterministic enough to reuse; the first
/// request for a listing hits the provider, later ones are served from
/// the cache.
#[derive(Debug)]
pub struct AnalysisCache {
    provider: Arc<dyn AnalysisProvider>,
    cache: RwLock<HashMap<ListingId, RepoAnalysis>>,
}

impl AnalysisCache {
    /// Wraps a provider with an empty cache.
    #[must_use]
    pub fn new(provider: Arc<dyn AnalysisProvider>) -> Self {
        Self {
            provider,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached analysis for a listing, or produces and caches
    /// one.
    ///
    /// # Errors
    ///
    /// Propagates provider failures and rejects results with
    /// out-of-range scores.
    pub async fn get_or_analyze(
        &self,
        listing_id: ListingId,
        repository_url: &str,
    ) -> Result<RepoAnalysis, MarketError> {
        if let Some(hit) = self.cache.read().await.get(&listing_id) {
            return Ok(hit.clone());
        }
        let analysis = self.provider.analyze(listing_id, repository_url).await?;
        analysis.validate()?;
        self.cache
            .write()
            .await
            .insert(listing_id, analysis.clone());
        tracing::debug!(%listing_id, "analysis cached");
        Ok(analysis)
    }
}
