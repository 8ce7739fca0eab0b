// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identifiers and shared constants.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// System-wide debt ceiling for any member.
pub const SYSTEM_MAX_DEBT_LIMIT: u32 = 500;

/// Smallest per-copy debt cost a book may carry.
pub const MIN_DEBT_COST: u32 = 10;

/// Debt cost assumed for records that do not carry one.
pub const DEFAULT_DEBT_COST: u32 = 50;

/// Category assigned to books that do not name one.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a book record.
    BookId
);
string_id!(
    /// Unique identifier for a library member.
    MemberId
);
string_id!(
    /// Unique identifier for a lending transaction.
    TransactionId
);

/// The record collections exposed by the store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Books,
    Members,
    Transactions,
}

impl ResourceKind {
    /// Singular noun used in error messages.
    pub fn singular(&self) -> &'static str {
        match self {
            ResourceKind::Books => "book",
            ResourceKind::Members => "member",
            ResourceKind::Transactions => "transaction",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = BookId::generate();
        let b = BookId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = MemberId::from("454d");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"454d\"");
        let parsed: MemberId = serde_json::from_str("\"ba9a\"").unwrap();
        assert_eq!(parsed.to_string(), "ba9a");
    }

    #[test]
    fn resource_kind_serializes_lowercase() {
        assert_eq!(ResourceKind::Transactions.to_string(), "transactions");
        let json = serde_json::to_string(&ResourceKind::Books).unwrap();
        assert_eq!(json, "\"books\"");
        assert_eq!(ResourceKind::Members.singular(), "member");
    }
}
