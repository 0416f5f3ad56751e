//! REST endpoint handlers organized by resource.

pub mod chat;
pub mod funding;
pub mod listing;
pub mod onboarding;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(onboarding::routes())
        .merge(listing::routes())
        .merge(funding::routes())
        .merge(chat::routes())
}
