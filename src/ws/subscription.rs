//! Per-connection subscription state and ordered chat delivery.
//!
//! [`SubscriptionManager`] tracks which listings a WebSocket client is
//! subscribed to, the viewer identity chat filtering runs under, and one
//! [`DeliveryBuffer`] per listing that releases chat messages in
//! sequence order even when the transport delivers them out of order.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::{ChatMessage, ListingId, Viewer};

/// Reorders chat messages into per-listing sequence order.
///
/// Seeded with the next expected sequence number at subscribe time.
/// Messages arriving early are held back until the gap closes; messages
/// older than the delivery cursor are dropped as duplicates.
#[derive(Debug)]
pub struct DeliveryBuffer {
    next_seq: u64,
    pending: BTreeMap<u64, ChatMessage>,
}

impl DeliveryBuffer {
    /// Creates a buffer expecting `next_seq` as the first message.
    #[must_use]
    pub fn new(next_seq: u64) -> Self {
        Self {
            next_seq,
            pending: BTreeMap::new(),
        }
    }

    /// Accepts one arrival and returns every message now deliverable, in
    /// sequence order.
    pub fn push(&mut self, message: ChatMessage) -> Vec<ChatMessage> {
        if message.seq < self.next_seq {
            return Vec::new();
        }
        self.pending.insert(message.seq, message);

        let mut ready = Vec::new();
        while let Some(message) = self.pending.remove(&self.next_seq) {
            self.next_seq += 1;
            ready.push(message);
        }
        ready
    }

    /// Returns the number of held-back messages.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Manages the subscriptions of a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed listing IDs. If `subscribe_all` is true, this set is
    /// ignored for matching.
    listing_ids: HashSet<ListingId>,
    /// Whether the client subscribes to all listings (wildcard `"*"`).
    subscribe_all: bool,
    /// Viewer chat visibility is evaluated under, when provided.
    viewer: Option<Viewer>,
    /// Per-listing ordered delivery state.
    buffers: HashMap<ListingId, DeliveryBuffer>,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds listing subscriptions. Each id carries the listing's next
    /// expected chat sequence number for buffer seeding.
    pub fn subscribe(&mut self, ids: &[(ListingId, u64)], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        for (id, next_seq) in ids {
            self.listing_ids.insert(*id);
            self.buffers
                .entry(*id)
                .or_insert_with(|| DeliveryBuffer::new(*next_seq));
        }
    }

    /// Removes listing subscriptions and their delivery buffers.
    pub fn unsubscribe(&mut self, ids: &[ListingId]) {
        for id in ids {
            self.listing_ids.remove(id);
            self.buffers.remove(id);
        }
    }

    /// Sets the viewer chat delivery is filtered for.
    pub fn set_viewer(&mut self, viewer: Option<Viewer>) {
        self.viewer = viewer;
    }

    /// Returns the current viewer, if any.
    #[must_use]
    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    /// Returns `true` if the given listing matches the subscription
    /// filter.
    #[must_use]
    pub fn matches(&self, listing_id: ListingId) -> bool {
        self.subscribe_all || self.listing_ids.contains(&listing_id)
    }

    /// Feeds one chat arrival through the listing's delivery buffer and
    /// returns the messages now deliverable, already filtered by the
    /// viewer's visibility.
    ///
    /// Wildcard subscribers without an explicit buffer start at the
    /// first observed message.
    pub fn push_chat(&mut self, message: ChatMessage) -> Vec<ChatMessage> {
        let Some(viewer) = self.viewer.clone() else {
            return Vec::new();
        };
        let buffer = self
            .buffers
            .entry(message.listing_id)
            .or_insert_with(|| DeliveryBuffer::new(message.seq));
        buffer
            .push(message)
            .into_iter()
            .filter(|m| viewer.can_see(m))
            .collect()
    }

    /// Returns the number of explicitly subscribed listings.
    #[must_use]
    pub fn count(&self) -> usize {
        self.listing_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
