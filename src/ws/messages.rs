//! WebSocket message types: envelope and subscription commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::SenderRole;

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Payload of a subscribe/unsubscribe command.
///
/// The viewer fields scope chat delivery: without them the connection
/// receives only non-chat events, since message visibility cannot be
/// evaluated for an anonymous subscriber.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeCommand {
    /// `"subscribe"` or `"unsubscribe"`.
    pub command: String,
    /// Listing UUIDs to (un)subscribe. Use `["*"]` for all listings.
    pub listing_ids: Vec<String>,
    /// Viewing side for chat filtering.
    #[serde(default)]
    pub viewer_role: Option<SenderRole>,
    /// Viewer identity; required when `viewer_role` is `funder`.
    #[serde(default)]
    pub viewer: Option<String>,
}
