// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only summaries computed by folding over the record collections.

use libris_core::{Book, Member, Transaction};
use serde::Serialize;

/// Copy counts and inventory value across the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub titles: usize,
    pub total_copies: u64,
    pub available_copies: u64,
    pub lent_copies: u64,
    /// Sum of `debtCost * totalCopies`.
    pub total_value: u64,
}

impl CatalogStats {
    pub fn collect<'a>(books: impl IntoIterator<Item = &'a Book>) -> Self {
        books.into_iter().fold(Self::default(), |mut acc, book| {
            acc.titles += 1;
            acc.total_copies += u64::from(book.total_copies);
            acc.available_copies += u64::from(book.available_copies);
            acc.lent_copies += u64::from(book.lent_copies());
            acc.total_value += u64::from(book.debt_cost) * u64::from(book.total_copies);
            acc
        })
    }
}

/// Debt totals across the roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtSummary {
    pub members: usize,
    pub total_debt: u64,
    pub with_debt: usize,
    pub without_debt: usize,
}

impl DebtSummary {
    pub fn collect<'a>(members: impl IntoIterator<Item = &'a Member>) -> Self {
        members.into_iter().fold(Self::default(), |mut acc, member| {
            acc.members += 1;
            acc.total_debt += u64::from(member.debt);
            if member.debt > 0 {
                acc.with_debt += 1;
            } else {
                acc.without_debt += 1;
            }
            acc
        })
    }
}

/// Transaction counts and the debt still tied up in active loans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub transactions: usize,
    pub active: usize,
    pub returned: usize,
    pub outstanding_debt: u64,
}

impl LedgerStats {
    pub fn collect<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        transactions.into_iter().fold(Self::default(), |mut acc, tx| {
            acc.transactions += 1;
            if tx.is_active() {
                acc.active += 1;
                acc.outstanding_debt += u64::from(tx.debt_cost);
            } else {
                acc.returned += 1;
            }
            acc
        })
    }
}

/// Everything the dashboard shows, in one response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub catalog: CatalogStats,
    pub members: DebtSummary,
    pub ledger: LedgerStats,
}
