// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ledger: the append-only log of lending transactions.
//!
//! Transactions are never removed. The only mutation after creation is the
//! one-way `Active -> Returned` transition driven by the engine.

use std::collections::HashMap;

use libris_core::{BookId, LibrisError, Transaction, TransactionId, TransactionState};
use serde::Deserialize;
use strum::{Display, EnumString};

use crate::stats::LedgerStats;

/// Which transactions [`Ledger::transactions`] returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionFilter {
    #[default]
    All,
    Active,
    Returned,
}

impl TransactionFilter {
    fn admits(self, tx: &Transaction) -> bool {
        match self {
            Self::All => true,
            Self::Active => tx.state() == TransactionState::Active,
            Self::Returned => tx.state() == TransactionState::Returned,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: Vec<Transaction>,
    index: HashMap<TransactionId, usize>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from stored records, rejecting duplicate ids.
    pub fn from_transactions(transactions: Vec<Transaction>) -> Result<Self, LibrisError> {
        let mut ledger = Self::new();
        for tx in transactions {
            if ledger.index.contains_key(&tx.id) {
                return Err(LibrisError::Validation(format!(
                    "duplicate transaction id `{}`",
                    tx.id
                )));
            }
            ledger.append(tx);
        }
        Ok(ledger)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &TransactionId) -> Option<&Transaction> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn require(&self, id: &TransactionId) -> Result<&Transaction, LibrisError> {
        self.get(id).ok_or_else(|| id.into())
    }

    /// All transactions in creation order.
    pub fn list(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.entries.iter()
    }

    /// Filtered view with active loans first, then newest first.
    pub fn transactions(&self, filter: TransactionFilter) -> Vec<&Transaction> {
        let mut selected: Vec<&Transaction> =
            self.entries.iter().filter(|tx| filter.admits(tx)).collect();
        selected.sort_by(|a, b| {
            a.returned
                .cmp(&b.returned)
                .then_with(|| b.date.cmp(&a.date))
                .then_with(|| a.id.cmp(&b.id))
        });
        selected
    }

    /// Number of active loans for one book.
    pub fn active_for_book(&self, book_id: &BookId) -> usize {
        self.entries
            .iter()
            .filter(|tx| tx.is_active() && &tx.book_id == book_id)
            .count()
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats::collect(&self.entries)
    }

    pub(crate) fn append(&mut self, tx: Transaction) {
        self.index.insert(tx.id.clone(), self.entries.len());
        self.entries.push(tx);
    }

    /// Undo the most recent [`Ledger::append`].
    pub(crate) fn pop(&mut self) -> Option<Transaction> {
        let tx = self.entries.pop()?;
        self.index.remove(&tx.id);
        Some(tx)
    }

    pub(crate) fn mark_returned(&mut self, id: &TransactionId) -> Result<&Transaction, LibrisError> {
        let i = *self.index.get(id).ok_or_else(|| LibrisError::from(id))?;
        let tx = &mut self.entries[i];
        tx.mark_returned()?;
        Ok(&*tx)
    }
}
