//! Chat DTOs: message posting, conversation lists, and history reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{ChatMessage, ConversationSummary, SenderRole, Viewer};
use crate::error::MarketError;

/// Request body for `POST /listings/:id/messages`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PostMessageRequest {
    /// Sending side.
    pub sender_role: SenderRole,
    /// Sender identity; required for funders, absent for the founder.
    #[serde(default)]
    pub sender: Option<String>,
    /// Message content.
    pub content: String,
}

/// One chat message as delivered over REST and WebSocket.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageDto {
    /// Message id.
    pub message_id: uuid::Uuid,
    /// Listing the message is scoped to.
    pub listing_id: uuid::Uuid,
    /// Per-listing sequence number.
    pub seq: u64,
    /// Sending side.
    pub sender_role: SenderRole,
    /// Sender identity, when the sender is a funder.
    pub sender: Option<String>,
    /// Message content.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&ChatMessage> for MessageDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            message_id: *message.id.as_uuid(),
            listing_id: *message.listing_id.as_uuid(),
            seq: message.seq,
            sender_role: message.sender_role,
            sender: message.sender.clone(),
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

/// One conversation entry for `GET /listings/:id/conversations`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationDto {
    /// The other side of the conversation.
    pub counterparty: String,
    /// Most recent visible message.
    pub last_message: MessageDto,
    /// Visible message count.
    pub message_count: u64,
    /// Unread counterparty messages.
    pub unread_count: u64,
}

impl From<&ConversationSummary> for ConversationDto {
    fn from(summary: &ConversationSummary) -> Self {
        Self {
            counterparty: summary.counterparty.clone(),
            last_message: MessageDto::from(&summary.last_message),
            message_count: summary.message_count,
            unread_count: summary.unread_count,
        }
    }
}

/// Viewer identification carried as query parameters on read endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ViewerParams {
    /// Viewing side.
    pub role: SenderRole,
    /// Viewer identity; required when `role` is `funder`.
    #[serde(default)]
    pub identity: Option<String>,
}

impl ViewerParams {
    /// Resolves the parameters into a [`Viewer`].
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Validation`] when a funder viewer carries
    /// no identity.
    pub fn into_viewer(self) -> Result<Viewer, MarketError> {
        match self.role {
            SenderRole::Founder => Ok(Viewer::Founder),
            SenderRole::Funder => {
                let Some(identity) = self.identity.filter(|i| !i.trim().is_empty()) else {
                    return Err(MarketError::Validation(
                        "funder viewers require an identity".to_string(),
                    ));
                };
                Ok(Viewer::Funder { identity })
            }
        }
    }
}

/// Response body for `POST .../read`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MarkReadResponse {
    /// Sequence number the read cursor advanced to.
    pub read_up_to: u64,
}

/// Response body for message history reads.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageHistoryResponse {
    /// Ordered messages of the conversation.
    pub data: Vec<MessageDto>,
}
