// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Library accounting engine for Libris.
//!
//! The engine is pure and framework-free: it owns the book catalog, the
//! member roster, and the transaction ledger, and enforces the lending
//! rules between them. It performs no I/O apart from reading seed files
//! and holds no locks; the caller decides how mutations are serialized.

pub mod catalog;
pub mod engine;
pub mod ledger;
pub mod policy;
pub mod roster;
pub mod snapshot;
pub mod stats;

pub use catalog::{BookFilter, Catalog};
pub use engine::{LendQuote, LendRequest, Library};
pub use ledger::{Ledger, TransactionFilter};
pub use policy::{DebtStanding, LendingPolicy, LimitPolicy};
pub use roster::Roster;
pub use snapshot::LibrarySnapshot;
pub use stats::{CatalogStats, DebtSummary, LedgerStats, LibraryStats};
