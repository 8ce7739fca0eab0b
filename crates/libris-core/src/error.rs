// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Libris library engine.
//!
//! Every business-rule rejection is reported synchronously as a
//! `LibrisError`. None of them are transient, so callers must not retry.

use thiserror::Error;

use crate::types::{BookId, MemberId, ResourceKind, TransactionId};

/// The primary error type used across the engine, the gateway, and the binary.
#[derive(Debug, Error)]
pub enum LibrisError {
    /// A referenced record does not exist.
    #[error("{} `{id}` not found", .kind.singular())]
    NotFound { kind: ResourceKind, id: String },

    /// One or more books in a lend request have no free copies.
    #[error("no available copies for book(s): {}", join_ids(.book_ids))]
    Unavailable { book_ids: Vec<BookId> },

    /// Charging the member would push their debt past the ceiling.
    #[error(
        "member `{member_id}` has debt {debt}; adding {requested} would exceed the ceiling of {ceiling}"
    )]
    OverLimit {
        member_id: MemberId,
        debt: u32,
        requested: u32,
        ceiling: u32,
    },

    /// An availability decrement was attempted on a book with zero free copies.
    #[error("book `{book_id}` has no copies left to lend")]
    Exhausted { book_id: BookId },

    /// The transaction was already returned.
    #[error("transaction `{transaction_id}` has already been returned")]
    AlreadyReturned { transaction_id: TransactionId },

    /// A required field is missing or a value is out of range.
    #[error("validation error: {0}")]
    Validation(String),

    /// Deletion refused because the record is still referenced by open state.
    #[error("cannot delete {} `{id}`: {reason}", .kind.singular())]
    DeleteBlocked {
        kind: ResourceKind,
        id: String,
        reason: String,
    },

    /// Configuration errors (invalid TOML, bad seed file, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LibrisError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            LibrisError::NotFound { .. } => "not_found",
            LibrisError::Unavailable { .. } => "unavailable",
            LibrisError::OverLimit { .. } => "over_limit",
            LibrisError::Exhausted { .. } => "exhausted",
            LibrisError::AlreadyReturned { .. } => "already_returned",
            LibrisError::Validation(_) => "validation",
            LibrisError::DeleteBlocked { .. } => "delete_blocked",
            LibrisError::Config(_) => "config",
            LibrisError::Internal(_) => "internal",
        }
    }

    /// Whether the error is a business-rule rejection rather than a fault.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, LibrisError::Config(_) | LibrisError::Internal(_))
    }

    pub(crate) fn not_found(kind: ResourceKind, id: impl std::fmt::Display) -> Self {
        LibrisError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<&BookId> for LibrisError {
    fn from(id: &BookId) -> Self {
        LibrisError::not_found(ResourceKind::Books, id)
    }
}

impl From<&MemberId> for LibrisError {
    fn from(id: &MemberId) -> Self {
        LibrisError::not_found(ResourceKind::Members, id)
    }
}

impl From<&TransactionId> for LibrisError {
    fn from(id: &TransactionId) -> Self {
        LibrisError::not_found(ResourceKind::Transactions, id)
    }
}

fn join_ids(ids: &[BookId]) -> String {
    ids.iter()
        .map(BookId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
