//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All endpoints are mounted under `/api/v1`.

pub mod dto;
pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

#[cfg(feature = "swagger-ui")]
use utoipa::OpenApi;

#[cfg(feature = "swagger-ui")]
#[derive(OpenApi)]
#[openapi(
    info(
        title = "seedfund-gateway",
        description = "REST and WebSocket gateway for the seedfund startup funding marketplace"
    ),
    paths(
        handlers::onboarding::sync,
        handlers::onboarding::get_developer,
        handlers::listing::register_listing,
        handlers::listing::list_listings,
        handlers::listing::analyze_listing,
        handlers::funding::record_transaction,
        handlers::funding::get_summary,
        handlers::chat::post_message,
        handlers::chat::list_conversations,
        handlers::system::health_handler,
        handlers::system::listing_options_handler,
    )
)]
struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/docs")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
