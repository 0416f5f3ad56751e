//! Listing handlers: register, list, get, edit, verify, analysis.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;

use crate::api::dto::{
    ListingDetailResponse, ListingFilterParams, ListingListResponse, ListingSummaryDto,
    PaginationMeta, PaginationParams, RegisterListingRequest, RegisterListingResponse,
    UpdateListingRequest, VerifyListingRequest,
};
use crate::app_state::AppState;
use crate::domain::{DeveloperId, ListingDraft, ListingId, RepositoryId};
use crate::error::{ErrorResponse, MarketError};

/// `POST /listings` — Register a funding campaign.
///
/// # Errors
///
/// Returns [`MarketError`] on invalid fields, unknown records, or a
/// repository that already carries a campaign.
#[utoipa::path(
    post,
    path = "/api/v1/listings",
    tag = "Listings",
    summary = "Register a listing",
    description = "Creates a pending listing bound to one developer and one repository. A repository can carry at most one active campaign.",
    request_body = RegisterListingRequest,
    responses(
        (status = 201, description = "Listing registered", body = RegisterListingResponse),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 404, description = "Unknown developer or repository", body = ErrorResponse),
        (status = 409, description = "Repository already listed", body = ErrorResponse),
    )
)]
pub async fn register_listing(
    State(state): State<AppState>,
    Json(req): Json<RegisterListingRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let funding_goal = parse_goal(&req.funding_goal)?;
    let draft = ListingDraft {
        name: req.name,
        description: req.description,
        funding_goal,
        contact: req.contact,
        funding_type: req.funding_type,
        project_stage: req.project_stage,
        team_size: req.team_size,
        timeline_months: req.timeline_months,
        use_of_funds: req.use_of_funds,
        website_url: req.website_url,
        tags: req.tags,
    };

    let listing_id = state
        .registrar
        .register_listing(
            DeveloperId::from_uuid(req.developer_id),
            RepositoryId::from_uuid(req.repository_id),
            draft,
        )
        .await?;
    let listing = state.registrar.get_listing(listing_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterListingResponse {
            listing_id: *listing_id.as_uuid(),
            status: listing.status,
            created_at: listing.created_at,
        }),
    ))
}

/// `GET /listings` — List campaigns with pagination and verified filter.
#[utoipa::path(
    get,
    path = "/api/v1/listings",
    tag = "Listings",
    summary = "List listings",
    description = "Returns a paginated listing catalog, optionally restricted to verified campaigns.",
    params(ListingFilterParams, PaginationParams),
    responses(
        (status = 200, description = "Paginated listing catalog", body = ListingListResponse),
    )
)]
pub async fn list_listings(
    State(state): State<AppState>,
    Query(filter): Query<ListingFilterParams>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let params = params.clamped();
    let summaries = state.registrar.list_listings(filter.verified).await;

    let total = summaries.len() as u32;
    let per_page = params.per_page;
    let page = params.page;
    let total_pages = if total == 0 {
        0
    } else {
        total.div_ceil(per_page)
    };

    let start = ((page - 1) * per_page) as usize;
    let data: Vec<ListingSummaryDto> = summaries
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .map(ListingSummaryDto::from)
        .collect();

    Json(ListingListResponse {
        data,
        pagination: PaginationMeta {
            page,
            per_page,
            total,
            total_pages,
        },
    })
}

/// `GET /listings/:id` — Full listing detail.
async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let listing = state
        .registrar
        .get_listing(ListingId::from_uuid(id))
        .await?;
    Ok(Json(ListingDetailResponse::from(&listing)))
}

/// `PATCH /listings/:id` — Optional-field edits by the owning developer.
async fn update_listing(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateListingRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let editor = DeveloperId::from_uuid(req.developer_id);
    let listing = state
        .registrar
        .update_listing(ListingId::from_uuid(id), editor, req.into_edits())
        .await?;
    Ok(Json(ListingDetailResponse::from(&listing)))
}

/// `POST /listings/:id/verify` — One-shot review decision.
async fn verify_listing(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<VerifyListingRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let listing = state
        .registrar
        .verify_listing(ListingId::from_uuid(id), req.approved)
        .await?;
    Ok(Json(ListingDetailResponse::from(&listing)))
}

/// `GET /listings/:id/analysis` — Cached AI analysis of the repository.
///
/// # Errors
///
/// Returns [`MarketError::CollaboratorUnavailable`] when no analysis
/// collaborator is configured.
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}/analysis",
    tag = "Listings",
    summary = "Analyze a listing's repository",
    description = "Returns the AI collaborator's analysis for the listing, cached per listing. 503 when no collaborator is configured; retrying later is safe.",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
    ),
    responses(
        (status = 200, description = "Analysis result", body = serde_json::Value),
        (status = 404, description = "Listing not found", body = ErrorResponse),
        (status = 503, description = "Analysis collaborator unavailable", body = ErrorResponse),
    )
)]
pub async fn analyze_listing(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let Some(analysis) = state.analysis.as_ref() else {
        return Err(MarketError::CollaboratorUnavailable(
            "analysis provider not configured".to_string(),
        ));
    };
    let listing_id = ListingId::from_uuid(id);
    let listing = state.registrar.get_listing(listing_id).await?;
    let repository = state
        .reconciler
        .directory()
        .repository(listing.repository_id)
        .await?;

    let result = analysis
        .get_or_analyze(listing_id, &repository.metadata.html_url)
        .await?;
    Ok(Json(result))
}

/// Listing routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/listings", post(register_listing).get(list_listings))
        .route("/listings/{id}", get(get_listing).patch(update_listing))
        .route("/listings/{id}/verify", post(verify_listing))
        .route("/listings/{id}/analysis", get(analyze_listing))
}

/// Parses the funding goal from its decimal-string form.
fn parse_goal(value: &str) -> Result<Decimal, MarketError> {
    value
        .parse::<Decimal>()
        .map_err(|_| MarketError::Validation(format!("invalid funding_goal: {value}")))
}
