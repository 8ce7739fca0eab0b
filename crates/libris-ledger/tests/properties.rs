// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property tests for the lending invariants.

use libris_core::{BookId, BookPatch, MemberId, NewBook, NewMember, SYSTEM_MAX_DEBT_LIMIT};
use libris_ledger::{LendingPolicy, Library, LimitPolicy, TransactionFilter};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Lend { member: usize, books: Vec<usize> },
    Return { nth_active: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, prop::collection::vec(0usize..4, 1..4))
            .prop_map(|(member, books)| Op::Lend { member, books }),
        (0usize..8).prop_map(|nth_active| Op::Return { nth_active }),
    ]
}

struct Fixture {
    library: Library,
    books: Vec<BookId>,
    members: Vec<MemberId>,
}

fn fixture(policy: LendingPolicy, copies: &[u32], costs: &[u32], max_debts: &[u32]) -> Fixture {
    let mut library = Library::new(policy);
    let books = copies
        .iter()
        .zip(costs)
        .enumerate()
        .map(|(i, (&copies, &cost))| {
            library
                .add_book(
                    NewBook::new(format!("Book {i}"), "Author")
                        .with_copies(copies)
                        .with_debt_cost(cost),
                )
                .unwrap()
                .id
        })
        .collect();
    let members = max_debts
        .iter()
        .enumerate()
        .map(|(i, &max_debt)| {
            library
                .add_member(NewMember::new(format!("Member {i}")).with_max_debt(max_debt))
                .unwrap()
                .id
        })
        .collect();
    Fixture {
        library,
        books,
        members,
    }
}

fn assert_invariants(library: &Library) -> Result<(), TestCaseError> {
    for book in library.catalog().list() {
        prop_assert!(book.available_copies <= book.total_copies);
        prop_assert_eq!(
            library.ledger().active_for_book(&book.id),
            book.lent_copies() as usize
        );
    }
    for member in library.roster().list() {
        prop_assert!(member.debt <= SYSTEM_MAX_DEBT_LIMIT);
        prop_assert!(member.debt <= library.roster().effective_ceiling(member));
    }
    Ok(())
}

proptest! {
    #[test]
    fn copies_and_debt_stay_in_bounds(
        copies in prop::collection::vec(1u32..4, 4),
        costs in prop::collection::vec(10u32..200, 4),
        max_debts in prop::collection::vec(0u32..=500, 3),
        system in any::<bool>(),
        ops in prop::collection::vec(op(), 1..40),
    ) {
        let limit = if system { LimitPolicy::System } else { LimitPolicy::Member };
        let Fixture { mut library, books, members } =
            fixture(LendingPolicy::default().with_limit(limit), &copies, &costs, &max_debts);

        for op in ops {
            match op {
                Op::Lend { member, books: picks } => {
                    let ids: Vec<BookId> = picks.iter().map(|&i| books[i].clone()).collect();
                    let _ = library.lend(&members[member], &ids);
                }
                Op::Return { nth_active } => {
                    let active = library.ledger().transactions(TransactionFilter::Active);
                    if let Some(tx) = active.get(nth_active % active.len().max(1)) {
                        let id = tx.id.clone();
                        library.return_book(&id).unwrap();
                    }
                }
            }
            assert_invariants(&library)?;
        }
    }

    #[test]
    fn lend_then_return_restores_state(
        copies in 1u32..5,
        cost in 10u32..250,
        new_cost in 10u32..250,
    ) {
        let Fixture { mut library, books, members } =
            fixture(LendingPolicy::default(), &[copies], &[cost], &[500]);
        let before_book = library.catalog().get(&books[0]).unwrap().available_copies;

        let tx = library.lend(&members[0], &books).unwrap().remove(0);
        let patch = BookPatch { debt_cost: Some(new_cost), ..BookPatch::default() };
        library.update_book(&books[0], patch).unwrap();
        library.return_book(&tx.id).unwrap();

        prop_assert_eq!(library.catalog().get(&books[0]).unwrap().available_copies, before_book);
        prop_assert_eq!(library.roster().get(&members[0]).unwrap().debt, 0);
    }

    #[test]
    fn batch_with_exhausted_book_changes_nothing(
        costs in prop::collection::vec(10u32..60, 3),
        exhausted in 0usize..3,
    ) {
        let Fixture { mut library, books, members } =
            fixture(LendingPolicy::default(), &[1, 1, 1], &costs, &[500, 500]);
        library.lend(&members[1], &[books[exhausted].clone()]).unwrap();
        let before = library.snapshot();

        let err = library.lend(&members[0], &books).unwrap_err();
        prop_assert_eq!(err.code(), "unavailable");
        prop_assert_eq!(library.snapshot(), before);
    }
}
