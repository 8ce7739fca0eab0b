// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The library accounting engine.
//!
//! [`Library`] composes the catalog, roster, and ledger into the two lending
//! operations plus record maintenance. Each lend is one unit of work: the
//! whole request is validated before anything changes, and the applied
//! effects are recorded in an undo log so a failing step reverts the earlier
//! ones in reverse order. The engine does not lock; callers serialize
//! mutations (the gateway holds a write lock around every call).

use std::collections::HashSet;

use libris_core::{
    Book, BookId, BookPatch, LibrisError, Member, MemberId, MemberPatch, NewBook, NewMember,
    ResourceKind, Transaction, TransactionId, TransactionPatch, DEFAULT_DEBT_COST,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::catalog::Catalog;
use crate::ledger::Ledger;
use crate::policy::LendingPolicy;
use crate::roster::Roster;
use crate::snapshot::LibrarySnapshot;
use crate::stats::LibraryStats;

/// A request to lend one copy of each listed book to a member.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LendRequest {
    #[serde(alias = "memberID")]
    pub member_id: MemberId,
    pub book_ids: Vec<BookId>,
}

/// What a lend would cost and how much headroom the member has left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LendQuote {
    pub total_cost: u32,
    pub new_total_debt: u32,
    /// Ceiling minus current debt.
    pub remaining_capacity: u32,
    /// How many average-priced books still fit under the ceiling.
    pub books_allowed: u32,
    pub within_limit: bool,
}

/// One applied step of a lend, kept so it can be reverted.
#[derive(Debug)]
enum Effect {
    Charged { member_id: MemberId, amount: u32 },
    Decremented(BookId),
    Recorded,
}

/// Catalog, roster, and ledger behind one facade.
#[derive(Debug, Clone)]
pub struct Library {
    policy: LendingPolicy,
    catalog: Catalog,
    roster: Roster,
    ledger: Ledger,
}

impl Library {
    /// An empty library.
    pub fn new(policy: LendingPolicy) -> Self {
        Self {
            policy,
            catalog: Catalog::new(&policy),
            roster: Roster::new(&policy),
            ledger: Ledger::new(),
        }
    }

    /// Load stored records after checking their invariants and cross-references.
    pub fn from_snapshot(
        snapshot: LibrarySnapshot,
        policy: LendingPolicy,
    ) -> Result<Self, LibrisError> {
        let LibrarySnapshot {
            books,
            members,
            transactions,
        } = snapshot;
        let library = Self {
            policy,
            catalog: Catalog::from_books(books, &policy)?,
            roster: Roster::from_members(members, &policy)?,
            ledger: Ledger::from_transactions(transactions)?,
        };
        library.check_references()?;
        Ok(library)
    }

    /// Export the current records.
    pub fn snapshot(&self) -> LibrarySnapshot {
        LibrarySnapshot {
            books: self.catalog.list().cloned().collect(),
            members: self.roster.list().cloned().collect(),
            transactions: self.ledger.list().cloned().collect(),
        }
    }

    pub fn policy(&self) -> &LendingPolicy {
        &self.policy
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn stats(&self) -> LibraryStats {
        LibraryStats {
            catalog: self.catalog.stats(),
            members: self.roster.summary(),
            ledger: self.ledger.stats(),
        }
    }

    // --- Lending ---

    /// Lend one copy of each book to the member, charging each book's
    /// current `debtCost`. Either every effect applies or none does.
    pub fn lend(
        &mut self,
        member_id: &MemberId,
        book_ids: &[BookId],
    ) -> Result<Vec<Transaction>, LibrisError> {
        let costs = self.validate_lend(member_id, book_ids)?;
        let total_cost: u32 = costs.iter().map(|(_, cost)| cost).sum();

        let mut applied = Vec::with_capacity(book_ids.len() * 2 + 1);
        match self.apply_lend(member_id, &costs, total_cost, &mut applied) {
            Ok(transactions) => {
                info!(
                    member_id = %member_id,
                    book_ids = ?book_ids.iter().map(BookId::as_str).collect::<Vec<_>>(),
                    total_cost,
                    "books lent"
                );
                Ok(transactions)
            }
            Err(err) => {
                self.rollback(applied);
                Err(err)
            }
        }
    }

    /// Return a lent copy: refund the cost snapshotted at lend time, put the
    /// copy back on the shelf, and close the transaction.
    pub fn return_book(&mut self, transaction_id: &TransactionId) -> Result<Transaction, LibrisError> {
        let tx = self.ledger.require(transaction_id)?;
        if tx.returned {
            return Err(LibrisError::AlreadyReturned {
                transaction_id: transaction_id.clone(),
            });
        }
        let book_id = tx.book_id.clone();
        let member_id = tx.member_id.clone();
        let debt_cost = tx.debt_cost;
        self.catalog.require(&book_id)?;
        self.roster.require(&member_id)?;

        self.roster.credit_debt(&member_id, debt_cost)?;
        self.catalog.increment_availability(&book_id)?;
        let tx = self.ledger.mark_returned(transaction_id)?.clone();

        info!(
            transaction_id = %transaction_id,
            member_id = %member_id,
            book_id = %book_id,
            refunded = debt_cost,
            "book returned"
        );
        Ok(tx)
    }

    /// Price a prospective lend without changing anything.
    pub fn quote(&self, member_id: &MemberId, book_ids: &[BookId]) -> Result<LendQuote, LibrisError> {
        let member = self.roster.require(member_id)?;
        let mut total_cost: u32 = 0;
        for book_id in book_ids {
            total_cost = total_cost.saturating_add(self.catalog.require(book_id)?.debt_cost);
        }

        let ceiling = self.policy.effective_ceiling(member);
        let remaining_capacity = ceiling.saturating_sub(member.debt);
        let average = self
            .catalog
            .average_debt_cost()
            .unwrap_or(DEFAULT_DEBT_COST)
            .max(1);
        let new_total_debt = member.debt.saturating_add(total_cost);

        Ok(LendQuote {
            total_cost,
            new_total_debt,
            remaining_capacity,
            books_allowed: remaining_capacity / average,
            within_limit: new_total_debt <= ceiling,
        })
    }

    /// Check the whole request and resolve each book's cost.
    fn validate_lend(
        &self,
        member_id: &MemberId,
        book_ids: &[BookId],
    ) -> Result<Vec<(BookId, u32)>, LibrisError> {
        if book_ids.is_empty() {
            return Err(LibrisError::Validation(
                "a lend needs at least one book".into(),
            ));
        }
        let mut seen = HashSet::with_capacity(book_ids.len());
        for book_id in book_ids {
            if !seen.insert(book_id) {
                return Err(LibrisError::Validation(format!(
                    "book `{book_id}` appears more than once in the request"
                )));
            }
        }

        let member = self.roster.require(member_id)?;

        let mut costs = Vec::with_capacity(book_ids.len());
        let mut unavailable = Vec::new();
        for book_id in book_ids {
            let book = self.catalog.require(book_id)?;
            if book.available_copies == 0 {
                unavailable.push(book_id.clone());
            }
            costs.push((book_id.clone(), book.debt_cost));
        }
        if !unavailable.is_empty() {
            return Err(LibrisError::Unavailable {
                book_ids: unavailable,
            });
        }

        let total_cost = costs
            .iter()
            .fold(0u32, |sum, (_, cost)| sum.saturating_add(*cost));
        let ceiling = self.policy.effective_ceiling(member);
        if member.debt.saturating_add(total_cost) > ceiling {
            return Err(LibrisError::OverLimit {
                member_id: member_id.clone(),
                debt: member.debt,
                requested: total_cost,
                ceiling,
            });
        }
        Ok(costs)
    }

    fn apply_lend(
        &mut self,
        member_id: &MemberId,
        costs: &[(BookId, u32)],
        total_cost: u32,
        applied: &mut Vec<Effect>,
    ) -> Result<Vec<Transaction>, LibrisError> {
        self.roster.charge_debt(member_id, total_cost)?;
        applied.push(Effect::Charged {
            member_id: member_id.clone(),
            amount: total_cost,
        });

        let mut transactions = Vec::with_capacity(costs.len());
        for (book_id, cost) in costs {
            self.catalog.decrement_availability(book_id)?;
            applied.push(Effect::Decremented(book_id.clone()));

            let tx = Transaction::open(book_id.clone(), member_id.clone(), *cost);
            transactions.push(tx.clone());
            self.ledger.append(tx);
            applied.push(Effect::Recorded);
        }
        Ok(transactions)
    }

    fn rollback(&mut self, applied: Vec<Effect>) {
        for effect in applied.into_iter().rev() {
            let undone = match &effect {
                Effect::Charged { member_id, amount } => {
                    self.roster.credit_debt(member_id, *amount).map(drop)
                }
                Effect::Decremented(book_id) => {
                    self.catalog.increment_availability(book_id).map(drop)
                }
                Effect::Recorded => {
                    self.ledger.pop();
                    Ok(())
                }
            };
            if let Err(err) = undone {
                error!(?effect, error = %err, "failed to revert lend effect");
            }
        }
    }

    // --- Record maintenance ---

    pub fn add_book(&mut self, new: NewBook) -> Result<Book, LibrisError> {
        let book = self.catalog.insert(new)?.clone();
        info!(book_id = %book.id, title = %book.title, copies = book.total_copies, "book added");
        Ok(book)
    }

    pub fn update_book(&mut self, book_id: &BookId, patch: BookPatch) -> Result<Book, LibrisError> {
        let book = self.catalog.update(book_id, patch)?.clone();
        info!(book_id = %book_id, "book updated");
        Ok(book)
    }

    pub fn delete_book(&mut self, book_id: &BookId) -> Result<Book, LibrisError> {
        let book = self.catalog.remove(book_id)?;
        info!(book_id = %book_id, "book deleted");
        Ok(book)
    }

    pub fn add_member(&mut self, new: NewMember) -> Result<Member, LibrisError> {
        let member = self.roster.insert(new)?.clone();
        info!(member_id = %member.id, "member added");
        Ok(member)
    }

    pub fn update_member(
        &mut self,
        member_id: &MemberId,
        patch: MemberPatch,
    ) -> Result<Member, LibrisError> {
        let member = self.roster.update(member_id, patch)?.clone();
        info!(member_id = %member_id, "member updated");
        Ok(member)
    }

    pub fn delete_member(&mut self, member_id: &MemberId) -> Result<Member, LibrisError> {
        let member = self.roster.remove(member_id)?;
        info!(member_id = %member_id, "member deleted");
        Ok(member)
    }

    /// Apply a record-level edit to a transaction. The only real change is
    /// `returned: true`, which runs [`Library::return_book`]; every other
    /// field must echo the stored value.
    pub fn update_transaction(
        &mut self,
        transaction_id: &TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, LibrisError> {
        let tx = self.ledger.require(transaction_id)?;
        let immutable_changed = patch.id.as_ref().is_some_and(|v| v != &tx.id)
            || patch.book_id.as_ref().is_some_and(|v| v != &tx.book_id)
            || patch.member_id.as_ref().is_some_and(|v| v != &tx.member_id)
            || patch.date.is_some_and(|v| v != tx.date)
            || patch.debt_cost.is_some_and(|v| v != tx.debt_cost);
        if immutable_changed {
            return Err(LibrisError::Validation(
                "only `returned` can be changed on a transaction".into(),
            ));
        }

        match (patch.returned, tx.returned) {
            (Some(true), false) => self.return_book(transaction_id),
            (Some(true), true) => Err(LibrisError::AlreadyReturned {
                transaction_id: transaction_id.clone(),
            }),
            (Some(false), true) => Err(LibrisError::Validation(
                "a returned transaction cannot be reopened".into(),
            )),
            (Some(false), false) | (None, _) => Ok(tx.clone()),
        }
    }

    /// Transactions are never deleted; this reports why.
    pub fn delete_transaction(&self, transaction_id: &TransactionId) -> Result<(), LibrisError> {
        self.ledger.require(transaction_id)?;
        Err(LibrisError::DeleteBlocked {
            kind: ResourceKind::Transactions,
            id: transaction_id.to_string(),
            reason: "the ledger is append-only".into(),
        })
    }

    // --- Snapshot checks ---

    fn check_references(&self) -> Result<(), LibrisError> {
        for tx in self.ledger.list() {
            if self.catalog.get(&tx.book_id).is_none() {
                return Err(LibrisError::Validation(format!(
                    "transaction `{}` references unknown book `{}`",
                    tx.id, tx.book_id
                )));
            }
            if self.roster.get(&tx.member_id).is_none() {
                return Err(LibrisError::Validation(format!(
                    "transaction `{}` references unknown member `{}`",
                    tx.id, tx.member_id
                )));
            }
        }
        for book in self.catalog.list() {
            let active = self.ledger.active_for_book(&book.id);
            if active != book.lent_copies() as usize {
                return Err(LibrisError::Validation(format!(
                    "book `{}` has {} copies out but {active} active transactions",
                    book.id,
                    book.lent_copies()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::LimitPolicy;

    fn library() -> Library {
        Library::new(LendingPolicy::default())
    }

    fn book(library: &mut Library, title: &str, copies: u32, cost: u32) -> BookId {
        library
            .add_book(
                NewBook::new(title, "Author")
                    .with_copies(copies)
                    .with_debt_cost(cost),
            )
            .unwrap()
            .id
    }

    fn member(library: &mut Library, name: &str) -> MemberId {
        library.add_member(NewMember::new(name)).unwrap().id
    }

    #[test]
    fn lend_charges_decrements_and_records() {
        let mut library = library();
        let a = book(&mut library, "A", 5, 50);
        let m = member(&mut library, "M");

        let txs = library.lend(&m, &[a.clone()]).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].debt_cost, 50);
        assert!(!txs[0].returned);
        assert_eq!(library.catalog().get(&a).unwrap().available_copies, 4);
        assert_eq!(library.roster().get(&m).unwrap().debt, 50);
        assert!(library.ledger().get(&txs[0].id).is_some());
    }

    #[test]
    fn lend_rejects_empty_and_duplicate_requests() {
        let mut library = library();
        let a = book(&mut library, "A", 5, 50);
        let m = member(&mut library, "M");
        assert!(matches!(library.lend(&m, &[]), Err(LibrisError::Validation(_))));
        assert!(matches!(
            library.lend(&m, &[a.clone(), a]),
            Err(LibrisError::Validation(_))
        ));
        assert!(library.ledger().is_empty());
    }

    #[test]
    fn lend_reports_unknown_records() {
        let mut library = library();
        let a = book(&mut library, "A", 1, 50);
        let m = member(&mut library, "M");
        assert!(matches!(
            library.lend(&MemberId::from("ghost"), &[a]),
            Err(LibrisError::NotFound { kind: ResourceKind::Members, .. })
        ));
        assert!(matches!(
            library.lend(&m, &[BookId::from("ghost")]),
            Err(LibrisError::NotFound { kind: ResourceKind::Books, .. })
        ));
    }

    #[test]
    fn lend_lists_every_unavailable_book() {
        let mut library = library();
        let a = book(&mut library, "A", 1, 10);
        let b = book(&mut library, "B", 1, 10);
        let c = book(&mut library, "C", 1, 10);
        let m = member(&mut library, "M");
        library.lend(&m, &[a.clone(), b.clone()]).unwrap();

        let err = library.lend(&m, &[a.clone(), c.clone(), b.clone()]).unwrap_err();
        match err {
            LibrisError::Unavailable { book_ids } => assert_eq!(book_ids, vec![a, b]),
            other => panic!("expected Unavailable, got {other:?}"),
        }
        assert_eq!(library.catalog().get(&c).unwrap().available_copies, 1);
        assert_eq!(library.roster().get(&m).unwrap().debt, 20);
    }

    #[test]
    fn member_limit_is_enforced_by_default() {
        let mut library = library();
        let a = book(&mut library, "A", 3, 60);
        let m = library
            .add_member(NewMember::new("Low").with_max_debt(100))
            .unwrap()
            .id;
        library.lend(&m, &[a.clone()]).unwrap();
        assert!(matches!(
            library.lend(&m, &[a]),
            Err(LibrisError::OverLimit { ceiling: 100, .. })
        ));
    }

    #[test]
    fn system_policy_only_checks_global_ceiling() {
        let mut library = Library::new(LendingPolicy::default().with_limit(LimitPolicy::System));
        let a = book(&mut library, "A", 3, 60);
        let m = library
            .add_member(NewMember::new("Low").with_max_debt(100))
            .unwrap()
            .id;
        library.lend(&m, &[a.clone()]).unwrap();
        library.lend(&m, &[a]).unwrap();
        assert_eq!(library.roster().get(&m).unwrap().debt, 120);
    }

    #[test]
    fn return_refunds_snapshotted_cost() {
        let mut library = library();
        let a = book(&mut library, "A", 2, 40);
        let m = member(&mut library, "M");
        let tx = library.lend(&m, &[a.clone()]).unwrap().remove(0);

        let patch: BookPatch = serde_json::from_value(serde_json::json!({"debtCost": 90})).unwrap();
        library.update_book(&a, patch).unwrap();

        let returned = library.return_book(&tx.id).unwrap();
        assert!(returned.returned);
        assert_eq!(library.roster().get(&m).unwrap().debt, 0);
        assert_eq!(library.catalog().get(&a).unwrap().available_copies, 2);
    }

    #[test]
    fn second_return_is_rejected_without_change() {
        let mut library = library();
        let a = book(&mut library, "A", 2, 40);
        let m = member(&mut library, "M");
        let tx = library.lend(&m, &[a.clone()]).unwrap().remove(0);
        library.return_book(&tx.id).unwrap();

        assert!(matches!(
            library.return_book(&tx.id),
            Err(LibrisError::AlreadyReturned { .. })
        ));
        assert!(matches!(
            library.return_book(&TransactionId::from("nope")),
            Err(LibrisError::NotFound { .. })
        ));
        assert_eq!(library.catalog().get(&a).unwrap().available_copies, 2);
    }

    #[test]
    fn rollback_reverts_applied_effects_in_reverse() {
        let mut library = library();
        let a = book(&mut library, "A", 1, 30);
        let m = member(&mut library, "M");
        let before = library.snapshot();

        // Apply every effect, then revert as a failing step would.
        let costs = vec![(a.clone(), 30)];
        let mut applied = Vec::new();
        library.apply_lend(&m, &costs, 30, &mut applied).unwrap();
        library.rollback(applied);

        assert_eq!(library.snapshot(), before);
    }

    #[test]
    fn quote_reports_headroom() {
        let mut library = library();
        let a = book(&mut library, "A", 5, 40);
        book(&mut library, "B", 5, 60);
        let m = member(&mut library, "M");
        library.lend(&m, &[a.clone()]).unwrap();

        let quote = library.quote(&m, &[a]).unwrap();
        assert_eq!(quote.total_cost, 40);
        assert_eq!(quote.new_total_debt, 80);
        assert_eq!(quote.remaining_capacity, 460);
        assert_eq!(quote.books_allowed, 9);
        assert!(quote.within_limit);
    }

    #[test]
    fn quote_uses_default_cost_for_empty_catalog() {
        let mut library = library();
        let m = member(&mut library, "M");
        let quote = library.quote(&m, &[]).unwrap();
        assert_eq!(quote.books_allowed, 10);
    }

    #[test]
    fn transaction_edits_only_allow_returning() {
        let mut library = library();
        let a = book(&mut library, "A", 1, 50);
        let m = member(&mut library, "M");
        let tx = library.lend(&m, &[a]).unwrap().remove(0);

        let patch = TransactionPatch {
            debt_cost: Some(1),
            ..TransactionPatch::default()
        };
        assert!(matches!(
            library.update_transaction(&tx.id, patch),
            Err(LibrisError::Validation(_))
        ));

        let patch = TransactionPatch {
            returned: Some(true),
            debt_cost: Some(50),
            ..TransactionPatch::default()
        };
        assert!(library.update_transaction(&tx.id, patch).unwrap().returned);
        assert_eq!(library.roster().get(&m).unwrap().debt, 0);

        let reopen = TransactionPatch {
            returned: Some(false),
            ..TransactionPatch::default()
        };
        assert!(library.update_transaction(&tx.id, reopen).is_err());
    }

    #[test]
    fn transactions_cannot_be_deleted() {
        let mut library = library();
        let a = book(&mut library, "A", 1, 50);
        let m = member(&mut library, "M");
        let tx = library.lend(&m, &[a]).unwrap().remove(0);
        assert!(matches!(
            library.delete_transaction(&tx.id),
            Err(LibrisError::DeleteBlocked { .. })
        ));
        assert!(matches!(
            library.delete_transaction(&TransactionId::from("x")),
            Err(LibrisError::NotFound { .. })
        ));
    }

    #[test]
    fn delete_blocked_while_lent() {
        let mut library = library();
        let a = book(&mut library, "A", 1, 50);
        let m = member(&mut library, "M");
        let tx = library.lend(&m, &[a.clone()]).unwrap().remove(0);
        assert!(library.delete_book(&a).is_err());
        assert!(library.delete_member(&m).is_err());

        library.return_book(&tx.id).unwrap();
        library.delete_book(&a).unwrap();
        library.delete_member(&m).unwrap();
    }

    #[test]
    fn snapshot_round_trips_through_loader() {
        let mut library = library();
        let a = book(&mut library, "A", 3, 50);
        let m = member(&mut library, "M");
        library.lend(&m, &[a]).unwrap();

        let snapshot = library.snapshot();
        let reloaded = Library::from_snapshot(snapshot.clone(), LendingPolicy::default()).unwrap();
        assert_eq!(reloaded.snapshot(), snapshot);
        assert_eq!(reloaded.stats(), library.stats());
    }

    #[test]
    fn snapshot_with_mismatched_copies_is_rejected() {
        let mut library = library();
        let a = book(&mut library, "A", 3, 50);
        let mut snapshot = library.snapshot();
        snapshot.books[0].available_copies = 1;
        let err = Library::from_snapshot(snapshot, LendingPolicy::default()).unwrap_err();
        assert!(err.to_string().contains(a.as_str()), "got: {err}");
    }

    #[test]
    fn snapshot_with_member_debt_above_system_limit_is_rejected() {
        let mut library = library();
        let a = book(&mut library, "A", 1, 50);
        let m = member(&mut library, "M");
        library.lend(&m, &[a]).unwrap();

        let mut snapshot = library.snapshot();
        snapshot.members[0].debt = 9000;
        let err = Library::from_snapshot(snapshot, LendingPolicy::default()).unwrap_err();
        assert!(matches!(err, LibrisError::Validation(_)), "got: {err:?}");
    }
}
