//! Chat handlers: message posting, conversation lists, history, acks.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    ConversationDto, MarkReadResponse, MessageDto, MessageHistoryResponse, PostMessageRequest,
    ViewerParams,
};
use crate::app_state::AppState;
use crate::domain::ListingId;
use crate::error::{ErrorResponse, MarketError};

/// `POST /listings/:id/messages` — Append a message to the stream.
///
/// # Errors
///
/// Returns [`MarketError`] on empty content, a role/identity mismatch,
/// or an unknown listing.
#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/messages",
    tag = "Chat",
    summary = "Post a chat message",
    description = "Appends a message to the listing's stream. Funder messages carry the funder identity; founder messages broadcast to every funder's conversation.",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
    ),
    request_body = PostMessageRequest,
    responses(
        (status = 201, description = "Message appended", body = MessageDto),
        (status = 400, description = "Invalid message", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    )
)]
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<PostMessageRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let message = state
        .engagement
        .post_message(
            ListingId::from_uuid(id),
            req.sender_role,
            req.sender,
            req.content,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(MessageDto::from(&message))))
}

/// `GET /listings/:id/conversations` — Per-counterparty conversation
/// list for the requesting viewer.
///
/// # Errors
///
/// Returns [`MarketError`] for an unknown listing or a funder viewer
/// without an identity.
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}/conversations",
    tag = "Chat",
    summary = "List conversations",
    description = "Partitions the listing's message stream per counterparty for the requesting viewer: the founder sees one conversation per funder, a funder sees only their own.",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
        ViewerParams,
    ),
    responses(
        (status = 200, description = "Conversation list", body = Vec<ConversationDto>),
        (status = 404, description = "Listing not found", body = ErrorResponse),
    )
)]
pub async fn list_conversations(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<ViewerParams>,
) -> Result<impl IntoResponse, MarketError> {
    let viewer = params.into_viewer()?;
    let conversations = state
        .engagement
        .list_conversations(ListingId::from_uuid(id), &viewer)
        .await?;
    let data: Vec<ConversationDto> = conversations.iter().map(ConversationDto::from).collect();
    Ok(Json(data))
}

/// `GET /listings/:id/conversations/:counterparty/messages` — Ordered
/// history of one conversation; the resynchronization path after a
/// dropped live subscription.
async fn conversation_history(
    State(state): State<AppState>,
    Path((id, counterparty)): Path<(uuid::Uuid, String)>,
    Query(params): Query<ViewerParams>,
) -> Result<impl IntoResponse, MarketError> {
    let viewer = params.into_viewer()?;
    let messages = state
        .engagement
        .conversation_history(ListingId::from_uuid(id), &viewer, &counterparty)
        .await?;
    Ok(Json(MessageHistoryResponse {
        data: messages.iter().map(MessageDto::from).collect(),
    }))
}

/// `POST /listings/:id/conversations/:counterparty/read` — Acknowledge
/// the conversation as read up to its current tail.
async fn mark_read(
    State(state): State<AppState>,
    Path((id, counterparty)): Path<(uuid::Uuid, String)>,
    Json(params): Json<ViewerParams>,
) -> Result<impl IntoResponse, MarketError> {
    let viewer = params.into_viewer()?;
    let read_up_to = state
        .engagement
        .mark_read(ListingId::from_uuid(id), &viewer, &counterparty)
        .await?;
    Ok(Json(MarkReadResponse { read_up_to }))
}

/// Chat routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/listings/{id}/messages", post(post_message))
        .route("/listings/{id}/conversations", get(list_conversations))
        .route(
            "/listings/{id}/conversations/{counterparty}/messages",
            get(conversation_history),
        )
        .route(
            "/listings/{id}/conversations/{counterparty}/read",
            post(mark_read),
        )
}
