//! Type-safe record identifiers.
//!
//! Each marketplace record kind gets its own newtype wrapper around
//! [`uuid::Uuid`] (v4) so identifiers of different kinds cannot be
//! confused with each other.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Creates an identifier from an existing [`uuid::Uuid`].
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a [`super::Developer`].
    ///
    /// Assigned on first reconciliation of a never-seen external handle
    /// and immutable thereafter.
    DeveloperId
}

define_id! {
    /// Unique identifier for a [`super::Repository`] snapshot.
    RepositoryId
}

define_id! {
    /// Unique identifier for a [`super::StartupListing`].
    ///
    /// Used as the event discriminator and WebSocket subscription target.
    ListingId
}

define_id! {
    /// Unique identifier for a [`super::FundingTransaction`].
    TransactionId
}

define_id! {
    /// Unique identifier for a [`super::ChatMessage`].
    MessageId
}
