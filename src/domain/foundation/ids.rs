//! Strongly-typed identifier value objects.
//!
//! Every ledger entity is keyed by a UUID wrapped in its own newtype so a
//! fee record id can never be passed where a tenant id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
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

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// Identifier of a tenant (a school). The isolation boundary for all data.
    TenantId
);

uuid_id!(
    /// Identifier of the student a fee record is billed to.
    StudentId
);

uuid_id!(
    /// Identifier of a fee record owed by one payer.
    FeeRecordId
);

uuid_id!(
    /// Identifier of a payment intent registered before a gateway order.
    PaymentIntentId
);

uuid_id!(
    /// Identifier of an immutable captured payment.
    PaymentRecordId
);

uuid_id!(
    /// Identifier of an inbound notification audit entry.
    WebhookLogId
);
