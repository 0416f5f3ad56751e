//! Gateway error types with HTTP status code mapping.
//!
//! [`MarketError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{DeveloperId, ListingId, RepositoryId, TransactionId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2101,
///     "message": "repository already listed",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`MarketError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                |
/// |-----------|-----------------|----------------------------|
/// | 1000–1099 | Validation      | 400 Bad Request            |
/// | 1100–1199 | Authorization   | 403 Forbidden              |
/// | 2000–2099 | Not Found       | 404 Not Found              |
/// | 2100–2199 | Conflict        | 409 Conflict               |
/// | 3000–3099 | Server          | 500 Internal Server Error  |
/// | 3100–3199 | Transient       | 503 Service Unavailable    |
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// Request validation failed (missing or malformed input).
    #[error("invalid request: {0}")]
    Validation(String),

    /// Viewer identity or role does not entitle them to the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Developer with the given ID was not found.
    #[error("developer not found: {0}")]
    DeveloperNotFound(DeveloperId),

    /// Repository with the given ID was not found.
    #[error("repository not found: {0}")]
    RepositoryNotFound(RepositoryId),

    /// Listing with the given ID was not found.
    #[error("listing not found: {0}")]
    ListingNotFound(ListingId),

    /// Funding transaction with the given ID was not found.
    #[error("transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// No developer is known under the given external handle.
    #[error("unknown handle: {0}")]
    HandleNotFound(String),

    /// The repository is already bound to an active listing.
    #[error("repository {repository_id} is already listed as {listing_id}")]
    RepositoryAlreadyListed {
        /// Repository the caller attempted to list.
        repository_id: RepositoryId,
        /// The existing active listing bound to that repository.
        listing_id: ListingId,
    },

    /// A reconciliation attempted to move a repository to a different owner.
    #[error("repository {repository_id} is owned by another developer")]
    OwnershipConflict {
        /// Repository whose ownership was contested.
        repository_id: RepositoryId,
    },

    /// A replayed external reference carried data that does not match the
    /// originally recorded transaction.
    #[error("external reference {external_ref} was recorded with different data")]
    ReplayMismatch {
        /// The duplicated external transaction reference.
        external_ref: String,
    },

    /// A state transition was attempted on a record already in a terminal
    /// state (settled transaction, reviewed listing).
    #[error("invalid state transition: {0}")]
    InvalidTransition(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A required external collaborator (wallet, analysis) is unavailable;
    /// the request is safe to retry with the same idempotency key.
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MarketError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::Forbidden(_) => 1101,
            Self::DeveloperNotFound(_) => 2001,
            Self::RepositoryNotFound(_) => 2002,
            Self::ListingNotFound(_) => 2003,
            Self::TransactionNotFound(_) => 2004,
            Self::HandleNotFound(_) => 2005,
            Self::RepositoryAlreadyListed { .. } => 2101,
            Self::OwnershipConflict { .. } => 2102,
            Self::ReplayMismatch { .. } => 2103,
            Self::InvalidTransition(_) => 2104,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::CollaboratorUnavailable(_) => 3101,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::DeveloperNotFound(_)
            | Self::RepositoryNotFound(_)
            | Self::ListingNotFound(_)
            | Self::TransactionNotFound(_)
            | Self::HandleNotFound(_) => StatusCode::NOT_FOUND,
            Self::RepositoryAlreadyListed { .. }
            | Self::OwnershipConflict { .. }
            | Self::ReplayMismatch { .. }
            | Self::InvalidTransition(_) => StatusCode::CONFLICT,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CollaboratorUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
