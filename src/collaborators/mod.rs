//! External collaborator seams: AI analysis and wallet connectivity.
//!
//! Both collaborators are consumed, never implemented, by the gateway:
//! trait objects injected at startup, with results treated as opaque
//! beyond basic range validation.

pub mod analysis;
pub mod wallet;

pub use analysis::{AnalysisCache, AnalysisProvider, RepoAnalysis};
pub use wallet::{TransferReceipt, WalletProvider};
