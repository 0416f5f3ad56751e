//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching subscription commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{SubscribeCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::api::dto::MessageDto;
use crate::domain::{ListingId, MarketEvent, SenderRole, Viewer};
use crate::service::EngagementGateway;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads subscription commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`], with
///   chat events reordered into sequence order and filtered per viewer.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<MarketEvent>,
    engagement: Arc<EngagementGateway>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &engagement).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Event from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(market_event) => {
                        let Some(listing_id) = market_event.listing_id() else {
                            continue;
                        };
                        if !subs.matches(listing_id) {
                            continue;
                        }
                        let outgoing = render_event(market_event, &mut subs);
                        let mut closed = false;
                        for json in outgoing {
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                closed = true;
                                break;
                            }
                        }
                        if closed {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Renders one bus event into zero or more outgoing JSON frames.
///
/// Chat events pass through the per-listing delivery buffer (so frames
/// go out in sequence order) and the viewer's visibility filter; all
/// other listing events are forwarded as-is.
fn render_event(event: MarketEvent, subs: &mut SubscriptionManager) -> Vec<String> {
    match event {
        MarketEvent::MessagePosted { message, .. } => subs
            .push_chat(message)
            .into_iter()
            .filter_map(|m| {
                let envelope = WsMessage {
                    id: uuid::Uuid::new_v4().to_string(),
                    msg_type: WsMessageType::Event,
                    timestamp: chrono::Utc::now(),
                    payload: serde_json::json!({
                        "event_type": "message_posted",
                        "message": MessageDto::from(&m),
                    }),
                };
                serde_json::to_string(&envelope).ok()
            })
            .collect(),
        other => {
            let envelope = WsMessage {
                id: uuid::Uuid::new_v4().to_string(),
                msg_type: WsMessageType::Event,
                timestamp: chrono::Utc::now(),
                payload: serde_json::to_value(&other).unwrap_or_default(),
            };
            serde_json::to_string(&envelope).ok().into_iter().collect()
        }
    }
}

/// Handles a text message from the client, returning an optional JSON
/// response.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    engagement: &EngagementGateway,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        let err = WsMessage {
            id: String::new(),
            msg_type: WsMessageType::Error,
            timestamp: chrono::Utc::now(),
            payload: serde_json::json!({
                "code": 400,
                "message": "malformed JSON"
            }),
        };
        return serde_json::to_string(&err).ok();
    };

    let Ok(command) = serde_json::from_value::<SubscribeCommand>(msg.payload.clone()) else {
        let err = WsMessage {
            id: msg.id,
            msg_type: WsMessageType::Error,
            timestamp: chrono::Utc::now(),
            payload: serde_json::json!({
                "code": 404,
                "message": "unknown command"
            }),
        };
        return serde_json::to_string(&err).ok();
    };

    match command.command.as_str() {
        "subscribe" => {
            let viewer = match (command.viewer_role, command.viewer) {
                (Some(SenderRole::Founder), _) => Some(Viewer::Founder),
                (Some(SenderRole::Funder), Some(identity)) if !identity.trim().is_empty() => {
                    Some(Viewer::Funder { identity })
                }
                _ => None,
            };
            subs.set_viewer(viewer);

            let mut ids = Vec::new();
            let mut wildcard = false;
            for raw in &command.listing_ids {
                if raw == "*" {
                    wildcard = true;
                } else if let Ok(uuid) = raw.parse::<uuid::Uuid>() {
                    let listing_id = ListingId::from_uuid(uuid);
                    let next_seq = engagement.next_seq(listing_id).await;
                    ids.push((listing_id, next_seq));
                }
            }
            subs.subscribe(&ids, wildcard);

            let response = WsMessage {
                id: msg.id,
                msg_type: WsMessageType::Response,
                timestamp: chrono::Utc::now(),
                payload: serde_json::json!({
                    "subscribed": ids.iter().map(|(id, _)| id.to_string()).collect::<Vec<_>>(),
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            };
            serde_json::to_string(&response).ok()
        }
        "unsubscribe" => {
            let ids: Vec<ListingId> = command
                .listing_ids
                .iter()
                .filter_map(|raw| raw.parse::<uuid::Uuid>().ok())
                .map(ListingId::from_uuid)
                .collect();
            subs.unsubscribe(&ids);

            let response = WsMessage {
                id: msg.id,
                msg_type: WsMessageType::Response,
                timestamp: chrono::Utc::now(),
                payload: serde_json::json!({
                    "unsubscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "remaining_count": subs.count(),
                }),
            };
            serde_json::to_string(&response).ok()
        }
        _ => {
            let err = WsMessage {
                id: msg.id,
                msg_type: WsMessageType::Error,
                timestamp: chrono::Utc::now(),
                payload: serde_json::json!({
                    "code": 404,
                    "message": "unknown command"
                }),
            };
            serde_json::to_string(&err).ok()
        }
    }
}
