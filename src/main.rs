//! seedfund-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints, and
//! the optional persistence background tasks.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use seedfund_gateway::api;
use seedfund_gateway::app_state::AppState;
use seedfund_gateway::config::GatewayConfig;
use seedfund_gateway::domain::{
    EventBus, IdentityDirectory, LedgerBook, ListingBook, MessageBoard,
};
use seedfund_gateway::persistence::{MarketPersistence, tasks};
use seedfund_gateway::service::{
    EngagementGateway, FundingLedger, IdentityReconciler, ListingRegistrar,
};
use seedfund_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    tracing::info!(addr = %config.listen_addr, "starting seedfund-gateway");

    // Build domain layer
    let directory = Arc::new(IdentityDirectory::new());
    let listings = Arc::new(ListingBook::new());
    let ledger = Arc::new(LedgerBook::new());
    let board = Arc::new(MessageBoard::new());
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Build service layer
    let reconciler = Arc::new(IdentityReconciler::new(
        Arc::clone(&directory),
        event_bus.clone(),
    ));
    let registrar = Arc::new(ListingRegistrar::new(
        Arc::clone(&directory),
        Arc::clone(&listings),
        event_bus.clone(),
    ));
    let funding = Arc::new(FundingLedger::new(
        ledger,
        Arc::clone(&listings),
        directory,
        event_bus.clone(),
    ));
    let engagement = Arc::new(EngagementGateway::new(board, listings, event_bus.clone()));

    // Optional persistence layer
    if config.persistence_enabled {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect_lazy(&config.database_url)?;
        let persistence = MarketPersistence::new(pool);

        if config.event_log_enabled {
            tokio::spawn(tasks::run_event_log_writer(
                persistence.clone(),
                event_bus.subscribe(),
            ));
        }
        tokio::spawn(tasks::run_snapshot_loop(
            persistence,
            Arc::clone(&registrar),
            Arc::clone(&funding),
            config.snapshot_interval_secs,
            config.cleanup_after_days,
        ));
        tracing::info!("persistence tasks started");
    }

    // Build application state. Collaborators are wired by embedders;
    // the standalone binary runs without them.
    let app_state = AppState {
        reconciler,
        registrar,
        funding,
        engagement,
        event_bus,
        analysis: None,
        wallet: None,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
