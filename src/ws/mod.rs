//! WebSocket layer: connection handling, subscriptions, ordered delivery.
//!
//! The WebSocket endpoint at `/ws` streams marketplace events per
//! listing. Chat events are delivered in per-listing sequence order and
//! filtered by the subscriber's viewer identity.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
