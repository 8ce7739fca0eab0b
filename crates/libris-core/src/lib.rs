// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Libris library engine.
//!
//! This crate provides the error taxonomy, identifier newtypes, and record
//! types shared by the accounting engine, the HTTP gateway, and the binary.

pub mod error;
pub mod records;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LibrisError;
pub use records::{
    Book, BookPatch, BookView, Member, MemberPatch, NewBook, NewMember, Transaction,
    TransactionPatch, TransactionState,
};
pub use types::{
    BookId, MemberId, ResourceKind, TransactionId, DEFAULT_CATEGORY, DEFAULT_DEBT_COST,
    MIN_DEBT_COST, SYSTEM_MAX_DEBT_LIMIT,
};
