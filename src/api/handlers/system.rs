//! System endpoints: health check and listing option catalogs.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// One enumerated listing option.
#[derive(Debug, Serialize, ToSchema)]
struct ListingOption {
    value: &'static str,
    description: &'static str,
}

/// Catalog of listing option enumerations.
#[derive(Debug, Serialize, ToSchema)]
struct ListingOptionsResponse {
    funding_types: Vec<ListingOption>,
    project_stages: Vec<ListingOption>,
}

/// `GET /config/listing-options` — Enumerations accepted by the
/// listing registrar.
#[utoipa::path(
    get,
    path = "/config/listing-options",
    tag = "System",
    summary = "List accepted listing options",
    description = "Returns the funding type and project stage values the registrar accepts.",
    responses(
        (status = 200, description = "Option catalog", body = ListingOptionsResponse),
    )
)]
pub async fn listing_options_handler() -> impl IntoResponse {
    let options = ListingOptionsResponse {
        funding_types: vec![
            ListingOption {
                value: "grant",
                description: "No-strings grant funding",
            },
            ListingOption {
                value: "equity",
                description: "Equity stake",
            },
            ListingOption {
                value: "revenue_share",
                description: "Revenue-share agreement",
            },
            ListingOption {
                value: "milestone_based",
                description: "Funds released per milestone",
            },
        ],
        project_stages: vec![
            ListingOption {
                value: "idea",
                description: "Concept only",
            },
            ListingOption {
                value: "prototype",
                description: "Early prototype",
            },
            ListingOption {
                value: "mvp",
                description: "Minimum viable product",
            },
            ListingOption {
                value: "beta",
                description: "Beta with real users",
            },
            ListingOption {
                value: "production",
                description: "In production",
            },
        ],
    };
    (StatusCode::OK, Json(options))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/listing-options", get(listing_options_handler))
}
