//! Engagement gateway: listing-scoped chat with per-viewer partitioning.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::chat::FOUNDER_COUNTERPARTY;
use crate::domain::{
    ChatMessage, ConversationSummary, EventBus, ListingBook, ListingId, MarketEvent, MessageBoard,
    SenderRole, Viewer,
};
use crate::error::MarketError;

/// Orchestrates the listing-scoped message stream.
///
/// Owns the [`MessageBoard`]; reads listings only to confirm they exist.
/// Visibility is evaluated per viewer on every read and never cached
/// across viewers.
#[derive(Debug, Clone)]
pub struct EngagementGateway {
    board: Arc<MessageBoard>,
    listings: Arc<ListingBook>,
    event_bus: EventBus,
}

impl EngagementGateway {
    /// Creates a new `EngagementGateway`.
    #[must_use]
    pub fn new(board: Arc<MessageBoard>, listings: Arc<ListingBook>, event_bus: EventBus) -> Self {
        Self {
            board,
            listings,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`MessageBoard`].
    #[must_use]
    pub fn board(&self) -> &Arc<MessageBoard> {
        &self.board
    }

    /// Appends a message to a listing's stream and broadcasts it.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Validation`] for empty content or a
    /// sender identity inconsistent with the role (funders must carry
    /// one, founders must not), and [`MarketError::ListingNotFound`]
    /// for an unknown listing.
    pub async fn post_message(
        &self,
        listing_id: ListingId,
        sender_role: SenderRole,
        sender: Option<String>,
        content: String,
    ) -> Result<ChatMessage, MarketError> {
        if content.trim().is_empty() {
            return Err(MarketError::Validation(
                "message content must not be empty".to_string(),
            ));
        }
        match (sender_role, &sender) {
            (SenderRole::Funder, None) => {
                return Err(MarketError::Validation(
                    "funder messages require a sender identity".to_string(),
                ));
            }
            (SenderRole::Funder, Some(identity)) if identity.trim().is_empty() => {
                return Err(MarketError::Validation(
                    "funder messages require a sender identity".to_string(),
                ));
            }
            (SenderRole::Founder, Some(_)) => {
                return Err(MarketError::Validation(
                    "founder messages carry no sender identity".to_string(),
                ));
            }
            _ => {}
        }
        let _listing = self.listings.get(listing_id).await?;

        let message = self
            .board
            .append(listing_id, sender_role, sender, content)
            .await;

        let _ = self.event_bus.publish(MarketEvent::MessagePosted {
            listing_id,
            message: message.clone(),
            timestamp: Utc::now(),
        });

        tracing::debug!(%listing_id, seq = message.seq, role = ?sender_role, "message posted");
        Ok(message)
    }

    /// Returns the viewer's conversation list, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ListingNotFound`] for an unknown listing.
    pub async fn list_conversations(
        &self,
        listing_id: ListingId,
        viewer: &Viewer,
    ) -> Result<Vec<ConversationSummary>, MarketError> {
        let _listing = self.listings.get(listing_id).await?;
        Ok(self.board.conversations(listing_id, viewer).await)
    }

    /// Returns the ordered message history of one conversation.
    ///
    /// This is the durable resynchronization path after a dropped live
    /// subscription: it yields exactly the state a continuously
    /// connected subscriber holds.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ListingNotFound`] for an unknown listing,
    /// [`MarketError::Forbidden`] when a funder requests any
    /// conversation but their own, and [`MarketError::Validation`] for
    /// a founder naming no funder counterparty.
    pub async fn conversation_history(
        &self,
        listing_id: ListingId,
        viewer: &Viewer,
        counterparty: &str,
    ) -> Result<Vec<ChatMessage>, MarketError> {
        let _listing = self.listings.get(listing_id).await?;
        let funder_side = self.resolve_counterparty(viewer, counterparty)?;
        Ok(self.board.conversation(listing_id, &funder_side).await)
    }

    /// Acknowledges a conversation as read up to its current tail.
    ///
    /// Acknowledgment is the externally supplied "viewer opened the
    /// conversation" signal; it only moves the unread cursor.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::conversation_history`].
    pub async fn mark_read(
        &self,
        listing_id: ListingId,
        viewer: &Viewer,
        counterparty: &str,
    ) -> Result<u64, MarketError> {
        let _listing = self.listings.get(listing_id).await?;
        let _funder_side = self.resolve_counterparty(viewer, counterparty)?;
        // Cursor keys are canonical: the funder side of the conversation
        // for the founder, the founder label for a funder.
        let cursor_key = match viewer {
            Viewer::Founder => counterparty,
            Viewer::Funder { .. } => FOUNDER_COUNTERPARTY,
        };
        Ok(self.board.mark_read(listing_id, viewer, cursor_key).await)
    }

    /// Returns every message the viewer is entitled to see.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ListingNotFound`] for an unknown listing.
    pub async fn visible_history(
        &self,
        listing_id: ListingId,
        viewer: &Viewer,
    ) -> Result<Vec<ChatMessage>, MarketError> {
        let _listing = self.listings.get(listing_id).await?;
        Ok(self.board.visible_history(listing_id, viewer).await)
    }

    /// Returns the sequence number the next message on the listing will
    /// get; WebSocket connections seed their delivery buffer with it.
    pub async fn next_seq(&self, listing_id: ListingId) -> u64 {
        self.board.next_seq(listing_id).await
    }

    /// Maps a (viewer, counterparty) pair onto the funder identity whose
    /// conversation is being addressed, enforcing the visibility rule.
    fn resolve_counterparty(
        &self,
        viewer: &Viewer,
        counterparty: &str,
    ) -> Result<String, MarketError> {
        match viewer {
            Viewer::Founder => {
                if counterparty == FOUNDER_COUNTERPARTY || counterparty.trim().is_empty() {
                    return Err(MarketError::Validation(
                        "founder must name a funder counterparty".to_string(),
                    ));
                }
                Ok(counterparty.to_string())
            }
            Viewer::Funder { identity } => {
                if counterparty != FOUNDER_COUNTERPARTY && counterparty != identity {
                    return Err(MarketError::Forbidden(
                        "funders may only read their own conversation".to_string(),
                    ));
                }
                Ok(identity.clone())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::listing::test_draft;
    use crate::domain::{DeveloperId, RepositoryId, StartupListing};

    async fn make_gateway_with_listing() -> (EngagementGateway, ListingId) {
        let listings = Arc::new(ListingBook::new());
        let listing =
            StartupListing::new(DeveloperId::new(), RepositoryId::new(), test_draft("widget", 1_000));
        let Ok(listing_id) = listings.insert(listing).await else {
            panic!("listing insert failed");
        };
        let gateway = EngagementGateway::new(
            Arc::new(MessageBoard::new()),
            listings,
            EventBus::new(100),
        );
        (gateway, listing_id)
    }

    async fn post(
        gateway: &EngagementGateway,
        listing: ListingId,
        role: SenderRole,
        sender: Option<&str>,
        content: &str,
    ) -> ChatMessage {
        let result = gateway
            .post_message(listing, role, sender.map(str::to_string), content.to_string())
            .await;
        let Ok(message) = result else {
            panic!("post failed");
        };
        message
    }

    #[tokio::test]
    async fn posting_emits_message_event() {
        let (gateway, listing) = make_gateway_with_listing().await;
        let mut rx = gateway.event_bus.subscribe();

        let _ = post(&gateway, listing, SenderRole::Founder, None, "hello").await;

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "message_posted");
    }

    #[tokio::test]
    async fn funder_without_identity_is_rejected() {
        let (gateway, listing) = make_gateway_with_listing().await;
        let result = gateway
            .post_message(listing, SenderRole::Funder, None, "hi".to_string())
            .await;
        assert!(matches!(result, Err(MarketError::Validation(_))));
    }

    #[tokio::test]
    async fn founder_with_identity_is_rejected() {
        let (gateway, listing) = make_gateway_with_listing().await;
        let result = gateway
            .post_message(
                listing,
                SenderRole::Founder,
                Some("0xAAA".to_string()),
                "hi".to_string(),
            )
            .await;
        assert!(matches!(result, Err(MarketError::Validation(_))));
    }

    #[tokio::test]
    async fn visibility_partition_for_two_funders() {
        let (gateway, listing) = make_gateway_with_listing().await;
        let _ = post(&gateway, listing, SenderRole::Founder, None, "welcome").await;
        let _ = post(&gateway, listing, SenderRole::Funder, Some("0xAAA"), "from A").await;
        let _ = post(&gateway, listing, SenderRole::Funder, Some("0xBBB"), "from B").await;

        let founder_view = gateway.list_conversations(listing, &Viewer::Founder).await;
        let Ok(founder_view) = founder_view else {
            panic!("founder view failed");
        };
        assert_eq!(founder_view.len(), 2);
        assert!(founder_view.iter().all(|c| c.message_count == 2));

        let a_view = gateway
            .visible_history(
                listing,
                &Viewer::Funder {
                    identity: "0xAAA".to_string(),
                },
            )
            .await;
        let Ok(a_view) = a_view else {
            panic!("funder view failed");
        };
        assert_eq!(a_view.len(), 2);
        assert!(a_view.iter().all(|m| m.sender.as_deref() != Some("0xBBB")));
    }

    #[tokio::test]
    async fn funder_cannot_read_another_funders_conversation() {
        let (gateway, listing) = make_gateway_with_listing().await;
        let _ = post(&gateway, listing, SenderRole::Funder, Some("0xBBB"), "from B").await;

        let viewer = Viewer::Funder {
            identity: "0xAAA".to_string(),
        };
        let result = gateway.conversation_history(listing, &viewer, "0xBBB").await;
        assert!(matches!(result, Err(MarketError::Forbidden(_))));

        let own = gateway
            .conversation_history(listing, &viewer, FOUNDER_COUNTERPARTY)
            .await;
        assert!(own.is_ok());
    }

    #[tokio::test]
    async fn unknown_listing_is_not_found() {
        let (gateway, _listing) = make_gateway_with_listing().await;
        let result = gateway
            .post_message(ListingId::new(), SenderRole::Founder, None, "hi".to_string())
            .await;
        assert!(matches!(result, Err(MarketError::ListingNotFound(_))));
    }

    #[tokio::test]
    async fn resync_matches_live_subscriber_state() {
        let (gateway, listing) = make_gateway_with_listing().await;
        let mut rx = gateway.event_bus.subscribe();
        let viewer = Viewer::Funder {
            identity: "0xAAA".to_string(),
        };

        let _ = post(&gateway, listing, SenderRole::Founder, None, "one").await;
        let _ = post(&gateway, listing, SenderRole::Funder, Some("0xAAA"), "two").await;
        let _ = post(&gateway, listing, SenderRole::Funder, Some("0xBBB"), "hidden").await;

        // What a continuously-connected, visibility-filtered subscriber saw.
        let mut live = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let MarketEvent::MessagePosted { message, .. } = event
                && viewer.can_see(&message)
            {
                live.push(message.id);
            }
        }

        let Ok(resync) = gateway.visible_history(listing, &viewer).await else {
            panic!("resync failed");
        };
        let resync_ids: Vec<_> = resync.iter().map(|m| m.id).collect();
        assert_eq!(live, resync_ids);
    }
}
