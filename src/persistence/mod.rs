//! Optional PostgreSQL persistence: durable event log and snapshots.

pub mod models;
pub mod postgres;
pub mod tasks;

pub use models::{ListingSnapshot, StoredEvent};
pub use postgres::MarketPersistence;
