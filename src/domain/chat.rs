//! Chat messages scoped to a listing, and the per-viewer visibility rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ListingId, MessageId};

/// Which side of a listing's conversation sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    /// The developer who owns the listing's repository.
    Founder,
    /// An external identity contributing (or considering) funding.
    Funder,
}

/// One append-only message in a listing's stream.
///
/// Ordering is by creation timestamp with ties broken by the per-listing
/// `seq` assigned at append time (insertion order).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Internal identifier.
    pub id: MessageId,

    /// Listing the message is scoped to.
    pub listing_id: ListingId,

    /// Per-listing sequence number assigned at append time.
    pub seq: u64,

    /// Sending side.
    pub sender_role: SenderRole,

    /// Sender identity; present exactly when `sender_role` is
    /// [`SenderRole::Funder`]. Founder messages carry no identity and
    /// broadcast to every funder's conversation.
    pub sender: Option<String>,

    /// Message content.
    pub content: String,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// The identity on whose behalf a read is evaluated.
///
/// Visibility is a filter predicate recomputed per viewer, never cached
/// across viewers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    /// The listing's founder: sees every message.
    Founder,
    /// A funder: sees founder messages and their own.
    Funder {
        /// The funder's opaque identity.
        identity: String,
    },
}

impl Viewer {
    /// Returns `true` if this viewer is entitled to see the message.
    #[must_use]
    pub fn can_see(&self, message: &ChatMessage) -> bool {
        match self {
            Self::Founder => true,
            Self::Funder { identity } => match message.sender_role {
                SenderRole::Founder => true,
                SenderRole::Funder => message.sender.as_deref() == Some(identity.as_str()),
            },
        }
    }

    /// Returns `true` if the message counts as unread input for this
    /// viewer, i.e. it was sent by the counterparty role.
    #[must_use]
    pub fn is_counterparty_message(&self, message: &ChatMessage) -> bool {
        match self {
            Self::Founder => message.sender_role == SenderRole::Funder,
            Self::Funder { .. } => message.sender_role == SenderRole::Founder,
        }
    }
}

/// One per-counterparty partition of a listing's message stream.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    /// The other side of the conversation: a funder identity for the
    /// founder's view, or `"founder"` for a funder's view.
    pub counterparty: String,
    /// Most recent visible message.
    pub last_message: ChatMessage,
    /// Count of visible messages in the conversation.
    pub message_count: u64,
    /// Counterparty messages past the viewer's read cursor.
    pub unread_count: u64,
}

/// Counterparty label used for a funder's single conversation with the
/// listing owner.
pub const FOUNDER_COUNTERPARTY: &str = "founder";

#[cfg(test)]
pub(crate) fn test_message(
    listing_id: ListingId,
    seq: u64,
    role: SenderRole,
    sender: Option<&str>,
) -> ChatMessage {
    ChatMessage {
        id: MessageId::new(),
        listing_id,
        seq,
        sender_role: role,
        sender: sender.map(str::to_string),
        content: format!("message {seq}"),
        created_at: Utc::now(),
    }
}
