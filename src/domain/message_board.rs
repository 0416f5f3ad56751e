//! Append-only chat storage with per-viewer conversation partitioning.
//!
//! [`MessageBoard`] keeps each listing's message stream in append order
//! behind a [`tokio::sync::RwLock`], assigns the per-listing `seq` at
//! append time, and tracks per-(viewer, counterparty) read cursors.
//! Conversation views are computed per viewer on every read; nothing
//! visibility-dependent is cached across viewers.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;

use tokio::sync::RwLock;

use super::chat::{ChatMessage, ConversationSummary, FOUNDER_COUNTERPARTY, SenderRole, Viewer};
use super::{ListingId, MessageId};

#[derive(Debug, Default)]
struct BoardInner {
    messages: HashMap<ListingId, Vec<ChatMessage>>,
    cursors: HashMap<(ListingId, String), HashMap<String, u64>>,
}

/// Central append-only store for listing-scoped chat messages.
#[derive(Debug, Default)]
pub struct MessageBoard {
    inner: RwLock<BoardInner>,
}

fn viewer_key(viewer: &Viewer) -> String {
    match viewer {
        Viewer::Founder => "founder".to_string(),
        Viewer::Funder { identity } => format!("funder:{identity}"),
    }
}

/// Returns `true` if the message belongs to the conversation with the
/// given counterparty. Founder messages broadcast into every
/// conversation; a funder's messages belong only to their own.
fn in_conversation(message: &ChatMessage, funder_identity: &str) -> bool {
    match message.sender_role {
        SenderRole::Founder => true,
        SenderRole::Funder => message.sender.as_deref() == Some(funder_identity),
    }
}

impl MessageBoard {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to a listing's stream, assigning its sequence
    /// number.
    pub async fn append(
        &self,
        listing_id: ListingId,
        sender_role: SenderRole,
        sender: Option<String>,
        content: String,
    ) -> ChatMessage {
        let mut inner = self.inner.write().await;
        let stream = inner.messages.entry(listing_id).or_default();
        let message = ChatMessage {
            id: MessageId::new(),
            listing_id,
            seq: stream.len() as u64 + 1,
            sender_role,
            sender,
            content,
            created_at: Utc::now(),
        };
        stream.push(message.clone());
        message
    }

    /// Returns the sequence number the next appended message will get.
    ///
    /// WebSocket subscribers seed their delivery buffer with this so
    /// out-of-order arrivals can be held back and released in order.
    pub async fn next_seq(&self, listing_id: ListingId) -> u64 {
        let inner = self.inner.read().await;
        inner
            .messages
            .get(&listing_id)
            .map_or(1, |stream| stream.len() as u64 + 1)
    }

    /// Returns every message a viewer is entitled to see, in sequence
    /// order. This is the durable resynchronization path: it yields
    /// exactly the stream a continuously-connected subscriber has.
    pub async fn visible_history(&self, listing_id: ListingId, viewer: &Viewer) -> Vec<ChatMessage> {
        let inner = self.inner.read().await;
        inner
            .messages
            .get(&listing_id)
            .into_iter()
            .flatten()
            .filter(|m| viewer.can_see(m))
            .cloned()
            .collect()
    }

    /// Returns the messages of one conversation, in sequence order.
    ///
    /// `funder_identity` names the funder side of the conversation; the
    /// founder side is implicit (founder messages broadcast into every
    /// conversation).
    pub async fn conversation(
        &self,
        listing_id: ListingId,
        funder_identity: &str,
    ) -> Vec<ChatMessage> {
        let inner = self.inner.read().await;
        inner
            .messages
            .get(&listing_id)
            .into_iter()
            .flatten()
            .filter(|m| in_conversation(m, funder_identity))
            .cloned()
            .collect()
    }

    /// Computes the viewer's conversation list, most recent first.
    ///
    /// The founder gets one conversation per distinct funder identity; a
    /// funder gets at most one conversation, with the founder.
    pub async fn conversations(
        &self,
        listing_id: ListingId,
        viewer: &Viewer,
    ) -> Vec<ConversationSummary> {
        let inner = self.inner.read().await;
        let Some(stream) = inner.messages.get(&listing_id) else {
            return Vec::new();
        };
        let cursors = inner.cursors.get(&(listing_id, viewer_key(viewer)));
        let read_seq = |counterparty: &str| -> u64 {
            cursors
                .and_then(|c| c.get(counterparty))
                .copied()
                .unwrap_or(0)
        };

        match viewer {
            Viewer::Founder => {
                // One conversation per distinct funder, keyed in a
                // BTreeMap for deterministic iteration.
                let mut by_funder: BTreeMap<String, (u64, Option<ChatMessage>, u64)> =
                    BTreeMap::new();
                for message in stream {
                    if message.sender_role != SenderRole::Funder {
                        continue;
                    }
                    let Some(funder) = message.sender.clone() else {
                        continue;
                    };
                    let cursor = read_seq(&funder);
                    let entry = by_funder.entry(funder).or_insert((0, None, 0));
                    entry.0 += 1;
                    entry.1 = Some(message.clone());
                    if message.seq > cursor {
                        entry.2 += 1;
                    }
                }

                // Founder broadcast messages count into every
                // conversation and may be its most recent message.
                let founder_messages: Vec<&ChatMessage> = stream
                    .iter()
                    .filter(|m| m.sender_role == SenderRole::Founder)
                    .collect();

                let mut summaries: Vec<ConversationSummary> = by_funder
                    .into_iter()
                    .filter_map(|(funder, (count, last, unread))| {
                        let mut last = last?;
                        let message_count = count + founder_messages.len() as u64;
                        if let Some(latest_founder) = founder_messages.last()
                            && latest_founder.seq > last.seq
                        {
                            last = (*latest_founder).clone();
                        }
                        Some(ConversationSummary {
                            counterparty: funder,
                            last_message: last,
                            message_count,
                            unread_count: unread,
                        })
                    })
                    .collect();
                summaries.sort_by(|a, b| b.last_message.seq.cmp(&a.last_message.seq));
                summaries
            }
            Viewer::Funder { identity } => {
                let visible: Vec<&ChatMessage> = stream
                    .iter()
                    .filter(|m| in_conversation(m, identity))
                    .collect();
                let Some(last) = visible.last() else {
                    return Vec::new();
                };
                let cursor = read_seq(FOUNDER_COUNTERPARTY);
                let unread = visible
                    .iter()
                    .filter(|m| viewer.is_counterparty_message(m) && m.seq > cursor)
                    .count() as u64;
                vec![ConversationSummary {
                    counterparty: FOUNDER_COUNTERPARTY.to_string(),
                    last_message: (*last).clone(),
                    message_count: visible.len() as u64,
                    unread_count: unread,
                }]
            }
        }
    }

    /// Acknowledges a conversation as read up to its current tail.
    ///
    /// Returns the sequence number the cursor was advanced to.
    pub async fn mark_read(
        &self,
        listing_id: ListingId,
        viewer: &Viewer,
        counterparty: &str,
    ) -> u64 {
        let mut inner = self.inner.write().await;
        let tail = inner
            .messages
            .get(&listing_id)
            .map_or(0, |stream| stream.len() as u64);
        let cursors = inner
            .cursors
            .entry((listing_id, viewer_key(viewer)))
            .or_default();
        let cursor = cursors.entry(counterparty.to_string()).or_insert(0);
        *cursor = tail.max(*cursor);
        *cursor
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    async fn seed_three_party_board() -> (MessageBoard, ListingId) {
        let board = MessageBoard::new();
        let listing = ListingId::new();
        let _ = board
            .append(listing, SenderRole::Founder, None, "welcome".to_string())
            .await;
        let _ = board
            .append(
                listing,
                SenderRole::Funder,
                Some("0xAAA".to_string()),
                "hello from A".to_string(),
            )
            .await;
        let _ = board
            .append(
                listing,
                SenderRole::Funder,
                Some("0xBBB".to_string()),
                "hello from B".to_string(),
            )
            .await;
        (board, listing)
    }

    #[tokio::test]
    async fn seq_is_assigned_in_append_order() {
        let (board, listing) = seed_three_party_board().await;
        let history = board.visible_history(listing, &Viewer::Founder).await;
        let seqs: Vec<u64> = history.iter().map(|m| m.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(board.next_seq(listing).await, 4);
    }

    #[tokio::test]
    async fn founder_sees_two_conversations_with_broadcast_counts() {
        let (board, listing) = seed_three_party_board().await;
        let conversations = board.conversations(listing, &Viewer::Founder).await;

        assert_eq!(conversations.len(), 2);
        // Founder's broadcast message counts into each conversation:
        // one funder message + one founder message each.
        for conversation in &conversations {
            assert_eq!(conversation.message_count, 2);
        }
        let counterparties: Vec<&str> = conversations
            .iter()
            .map(|c| c.counterparty.as_str())
            .collect();
        assert!(counterparties.contains(&"0xAAA"));
        assert!(counterparties.contains(&"0xBBB"));
    }

    #[tokio::test]
    async fn funder_view_excludes_other_funders() {
        let (board, listing) = seed_three_party_board().await;
        let viewer = Viewer::Funder {
            identity: "0xAAA".to_string(),
        };
        let conversations = board.conversations(listing, &viewer).await;

        assert_eq!(conversations.len(), 1);
        let Some(conversation) = conversations.first() else {
            panic!("expected one conversation");
        };
        assert_eq!(conversation.counterparty, FOUNDER_COUNTERPARTY);
        assert_eq!(conversation.message_count, 2);

        let history = board.visible_history(listing, &viewer).await;
        assert!(history.iter().all(|m| m.sender.as_deref() != Some("0xBBB")));
    }

    #[tokio::test]
    async fn unread_counts_reset_on_mark_read() {
        let (board, listing) = seed_three_party_board().await;

        let conversations = board.conversations(listing, &Viewer::Founder).await;
        assert!(conversations.iter().all(|c| c.unread_count == 1));

        fn unread_of(conversations: &[ConversationSummary], name: &str) -> Option<u64> {
            conversations
                .iter()
                .find(|c| c.counterparty == name)
                .map(|c| c.unread_count)
        }

        let _ = board.mark_read(listing, &Viewer::Founder, "0xAAA").await;
        let conversations = board.conversations(listing, &Viewer::Founder).await;
        assert_eq!(unread_of(&conversations, "0xAAA"), Some(0));
        assert_eq!(unread_of(&conversations, "0xBBB"), Some(1));

        // A new message from the acknowledged funder becomes unread again.
        let _ = board
            .append(
                listing,
                SenderRole::Funder,
                Some("0xAAA".to_string()),
                "follow-up".to_string(),
            )
            .await;
        let conversations = board.conversations(listing, &Viewer::Founder).await;
        assert_eq!(unread_of(&conversations, "0xAAA"), Some(1));
    }

    #[tokio::test]
    async fn funder_unread_tracks_founder_messages_only() {
        let (board, listing) = seed_three_party_board().await;
        let viewer = Viewer::Funder {
            identity: "0xAAA".to_string(),
        };

        let conversations = board.conversations(listing, &viewer).await;
        let Some(conversation) = conversations.first() else {
            panic!("expected one conversation");
        };
        assert_eq!(conversation.unread_count, 1);

        let _ = board
            .mark_read(listing, &viewer, FOUNDER_COUNTERPARTY)
            .await;
        let conversations = board.conversations(listing, &viewer).await;
        let Some(conversation) = conversations.first() else {
            panic!("expected one conversation");
        };
        assert_eq!(conversation.unread_count, 0);
    }

    #[tokio::test]
    async fn founder_only_stream_yields_no_conversations() {
        let board = MessageBoard::new();
        let listing = ListingId::new();
        let _ = board
            .append(listing, SenderRole::Founder, None, "anyone there?".to_string())
            .await;
        assert!(board.conversations(listing, &Viewer::Founder).await.is_empty());
    }
}
