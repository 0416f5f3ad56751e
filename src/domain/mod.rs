//! Domain layer: core records, concurrent stores, and the event system.
//!
//! This module contains the marketplace's server-side domain model:
//! typed identifiers, developer/repository identity records, listings,
//! funding transactions, chat messages, the concurrent stores guarding
//! each record family, and the event bus broadcasting state changes.

pub mod chat;
pub mod developer;
pub mod directory;
pub mod event;
pub mod event_bus;
pub mod funding;
pub mod ids;
pub mod ledger_book;
pub mod listing;
pub mod listing_book;
pub mod message_board;

pub use chat::{ChatMessage, ConversationSummary, SenderRole, Viewer};
pub use developer::{Developer, RepoMetadata, RepoSnapshot, Repository};
pub use directory::{IdentityDirectory, ReconcileReport};
pub use event::MarketEvent;
pub use event_bus::EventBus;
pub use funding::{FundingSummary, FundingTransaction, TransactionStatus};
pub use ids::{DeveloperId, ListingId, MessageId, RepositoryId, TransactionId};
pub use ledger_book::{LedgerBook, RecordOutcome};
pub use listing::{
    FundingType, ListingDraft, ListingEdits, ListingStatus, ListingSummary, ProjectStage,
    StartupListing,
};
pub use listing_book::ListingBook;
pub use message_board::MessageBoard;
