//! Service layer: one orchestrator per marketplace component.
//!
//! Each service follows the same pattern: validate input, mutate its own
//! store, emit events, trace. Services own disjoint stores and never
//! write each other's state.

pub mod engagement;
pub mod ledger;
pub mod reconciler;
pub mod registrar;

pub use engagement::EngagementGateway;
pub use ledger::FundingLedger;
pub use reconciler::IdentityReconciler;
pub use registrar::ListingRegistrar;
