//! Funding handlers: record, settle, fund, and summary endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;

use crate::api::dto::{
    FundRequest, FundingSummaryResponse, RecordTransactionRequest, RecordTransactionResponse,
    SettleTransactionRequest, TransactionResponse,
};
use crate::app_state::AppState;
use crate::domain::{ListingId, TransactionId};
use crate::error::{ErrorResponse, MarketError};

/// `POST /listings/:id/transactions` — Record a funding transaction.
///
/// # Errors
///
/// Returns [`MarketError`] on invalid amounts, an unknown listing, or a
/// replayed reference with mismatched data.
#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/transactions",
    tag = "Funding",
    summary = "Record a funding transaction",
    description = "Records a pending funding transaction. Replaying a known external reference with identical data returns the prior transaction id instead of duplicating it.",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
    ),
    request_body = RecordTransactionRequest,
    responses(
        (status = 201, description = "Transaction recorded", body = RecordTransactionResponse),
        (status = 200, description = "Idempotent replay of a prior transaction", body = RecordTransactionResponse),
        (status = 400, description = "Invalid amounts or fields", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
        (status = 409, description = "Replayed reference with different data", body = ErrorResponse),
    )
)]
pub async fn record_transaction(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<RecordTransactionRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let amount_display = parse_amount("amount_display", &req.amount_display)?;
    let amount_settlement = parse_amount("amount_settlement", &req.amount_settlement)?;

    let outcome = state
        .funding
        .record_transaction(
            ListingId::from_uuid(id),
            req.funder,
            amount_display,
            amount_settlement,
            req.currency,
            req.external_ref,
        )
        .await?;

    let status = if outcome.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((
        status,
        Json(RecordTransactionResponse {
            transaction_id: *outcome.transaction.id.as_uuid(),
            status: outcome.transaction.status,
            replayed: outcome.replayed,
            recorded_at: outcome.transaction.created_at,
        }),
    ))
}

/// `GET /transactions/:id` — Transaction status read for settlement
/// polling.
async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let transaction = state
        .funding
        .get_transaction(TransactionId::from_uuid(id))
        .await?;
    Ok(Json(TransactionResponse::from(&transaction)))
}

/// `POST /transactions/:id/settle` — Apply the external confirmation.
async fn settle_transaction(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<SettleTransactionRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let transaction = state
        .funding
        .settle_transaction(TransactionId::from_uuid(id), req.outcome.into())
        .await?;
    Ok(Json(TransactionResponse::from(&transaction)))
}

/// `GET /listings/:id/summary` — Derived funding summary.
///
/// # Errors
///
/// Returns [`MarketError::ListingNotFound`] if the listing is unknown.
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}/summary",
    tag = "Funding",
    summary = "Get a listing's funding summary",
    description = "Returns the snapshot-consistent aggregate of completed transactions: exact raised total, distinct funder count, and percent of goal (uncapped).",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
    ),
    responses(
        (status = 200, description = "Funding summary", body = FundingSummaryResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    )
)]
pub async fn get_summary(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, MarketError> {
    let summary = state.funding.get_summary(ListingId::from_uuid(id)).await?;
    Ok(Json(FundingSummaryResponse::from(&summary)))
}

/// `POST /listings/:id/fund` — Transfer via the wallet collaborator,
/// then record and settle the resulting transaction.
async fn fund_listing(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<FundRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let Some(wallet) = state.wallet.as_ref() else {
        return Err(MarketError::CollaboratorUnavailable(
            "wallet provider not configured".to_string(),
        ));
    };
    let amount_display = parse_amount("amount_display", &req.amount_display)?;
    let amount_settlement = parse_amount("amount_settlement", &req.amount_settlement)?;

    let transaction = state
        .funding
        .fund(
            ListingId::from_uuid(id),
            req.funder,
            amount_display,
            amount_settlement,
            req.currency,
            wallet.as_ref(),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(TransactionResponse::from(&transaction)),
    ))
}

/// Funding routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/listings/{id}/transactions", post(record_transaction))
        .route("/listings/{id}/summary", get(get_summary))
        .route("/listings/{id}/fund", post(fund_listing))
        .route("/transactions/{id}", get(get_transaction))
        .route("/transactions/{id}/settle", post(settle_transaction))
}

/// Parses a monetary amount from its decimal-string form.
fn parse_amount(field: &str, value: &str) -> Result<Decimal, MarketError> {
    value
        .parse::<Decimal>()
        .map_err(|_| MarketError::Validation(format!("invalid {field}: {value}")))
}
