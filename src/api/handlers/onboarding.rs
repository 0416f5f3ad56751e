//! Onboarding handlers: repository sync and developer endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    DeveloperResponse, ListingSummaryDto, PayoutAddressRequest, SyncRequest, SyncResponse,
};
use crate::app_state::AppState;
use crate::domain::DeveloperId;
use crate::error::{ErrorResponse, MarketError};

/// `POST /sync` — Reconcile an external handle and repository snapshot.
///
/// Idempotent: repeating the call with the same inputs resolves to the
/// same developer and repository ids.
///
/// # Errors
///
/// Returns [`MarketError`] on validation failure or an ownership
/// conflict.
#[utoipa::path(
    post,
    path = "/api/v1/sync",
    tag = "Onboarding",
    summary = "Reconcile an external identity",
    description = "Maps an (account handle, repository snapshot) pair onto internal developer and repository records, creating them on first sight and refreshing repository metadata afterwards.",
    request_body = SyncRequest,
    responses(
        (status = 200, description = "Identity reconciled", body = SyncResponse),
        (status = 400, description = "Invalid handle or snapshot", body = ErrorResponse),
        (status = 409, description = "Repository owned by another developer", body = ErrorResponse),
    )
)]
pub async fn sync(
    State(state): State<AppState>,
    Json(req): Json<SyncRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let report = state
        .reconciler
        .reconcile(&req.handle, req.repository.into())
        .await?;
    Ok((StatusCode::OK, Json(SyncResponse::from(&report))))
}

/// `POST /developers/:id/payout-address` — Attach a payout address.
async fn attach_payout_address(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<PayoutAddressRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let developer_id = DeveloperId::from_uuid(id);
    let developer = state
        .reconciler
        .attach_payout_address(developer_id, req.address)
        .await?;
    let listings = state
        .registrar
        .list_by_developer(developer_id)
        .await
        .into_iter()
        .map(ListingSummaryDto::from)
        .collect();
    Ok(Json(DeveloperResponse::new(&developer, listings)))
}

/// `GET /developers/:handle` — Developer profile with their listings.
///
/// # Errors
///
/// Returns [`MarketError::HandleNotFound`] for an unknown handle.
#[utoipa::path(
    get,
    path = "/api/v1/developers/{handle}",
    tag = "Onboarding",
    summary = "Look up a developer by handle",
    description = "Returns the developer record and their listings.",
    params(
        ("handle" = String, Path, description = "External account handle"),
    ),
    responses(
        (status = 200, description = "Developer profile", body = DeveloperResponse),
        (status = 404, description = "Unknown handle", body = ErrorResponse),
    )
)]
pub async fn get_developer(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse, MarketError> {
    let developer = state
        .reconciler
        .find_developer(&handle)
        .await?
        .ok_or_else(|| MarketError::HandleNotFound(handle))?;
    let listings = state
        .registrar
        .list_by_developer(developer.id)
        .await
        .into_iter()
        .map(ListingSummaryDto::from)
        .collect();
    Ok(Json(DeveloperResponse::new(&developer, listings)))
}

/// Onboarding routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync", post(sync))
        .route(
            "/developers/{id}/payout-address",
            post(attach_payout_address),
        )
        .route("/developers/{handle}", get(get_developer))
}
