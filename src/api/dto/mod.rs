//! Data Transfer Objects for REST request/response serialization.
//!
//! All monetary amounts are serialized as JSON strings to preserve
//! exact decimal values.

pub mod chat_dto;
pub mod common_dto;
pub mod funding_dto;
pub mod listing_dto;
pub mod onboarding_dto;

pub use chat_dto::*;
pub use common_dto::*;
pub use funding_dto::*;
pub use listing_dto::*;
pub use onboarding_dto::*;
