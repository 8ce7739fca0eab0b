// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog: book records and their copy availability.
//!
//! Availability only moves through [`Catalog::decrement_availability`] and
//! [`Catalog::increment_availability`], which the lending engine calls.
//! Record edits may change `totalCopies`, shifting availability by the same
//! amount so the number of lent copies is preserved.

use std::collections::{BTreeSet, HashMap};

use libris_core::{
    Book, BookId, BookPatch, LibrisError, NewBook, ResourceKind, DEFAULT_CATEGORY,
};
use serde::Deserialize;
use serde_json::Value;

use crate::policy::LendingPolicy;
use crate::stats::CatalogStats;

/// Narrowing applied by [`Catalog::find_available`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BookFilter {
    /// Exact category match.
    pub category: Option<String>,
    /// Case-insensitive substring of title or authors.
    pub search: Option<String>,
}

impl BookFilter {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    fn matches(&self, book: &Book, needle: Option<&str>) -> bool {
        let category_ok = match self.category.as_deref() {
            Some(category) if !category.is_empty() => book.category == category,
            _ => true,
        };
        let search_ok = match needle {
            Some(needle) => {
                book.title.to_lowercase().contains(needle)
                    || book.authors.to_lowercase().contains(needle)
            }
            None => true,
        };
        category_ok && search_ok
    }
}

/// Owns every book record, in insertion order.
#[derive(Debug, Clone)]
pub struct Catalog {
    books: HashMap<BookId, Book>,
    order: Vec<BookId>,
    min_debt_cost: u32,
    default_debt_cost: u32,
}

impl Catalog {
    pub fn new(policy: &LendingPolicy) -> Self {
        Self {
            books: HashMap::new(),
            order: Vec::new(),
            min_debt_cost: policy.min_debt_cost,
            default_debt_cost: policy.default_debt_cost,
        }
    }

    /// Build a catalog from stored records, rejecting duplicate ids.
    pub fn from_books(books: Vec<Book>, policy: &LendingPolicy) -> Result<Self, LibrisError> {
        let mut catalog = Self::new(policy);
        for book in books {
            book.validate()?;
            if catalog.books.contains_key(&book.id) {
                return Err(LibrisError::Validation(format!(
                    "duplicate book id `{}`",
                    book.id
                )));
            }
            catalog.order.push(book.id.clone());
            catalog.books.insert(book.id.clone(), book);
        }
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, book_id: &BookId) -> Option<&Book> {
        self.books.get(book_id)
    }

    /// Like [`Catalog::get`], failing with `NotFound`.
    pub fn require(&self, book_id: &BookId) -> Result<&Book, LibrisError> {
        self.books.get(book_id).ok_or_else(|| book_id.into())
    }

    /// All books in insertion order.
    pub fn list(&self) -> impl Iterator<Item = &Book> + '_ {
        self.order.iter().filter_map(|id| self.books.get(id))
    }

    /// Books with at least one copy on the shelf, sorted by title
    /// (case-insensitive, ties by id). Each call starts a fresh sequence.
    pub fn find_available(&self, filter: &BookFilter) -> std::vec::IntoIter<&Book> {
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut books: Vec<&Book> = self
            .books
            .values()
            .filter(|book| book.available_copies > 0)
            .filter(|book| filter.matches(book, needle.as_deref()))
            .collect();
        books.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        books.into_iter()
    }

    /// Sorted, de-duplicated category names.
    pub fn categories(&self) -> Vec<String> {
        self.books
            .values()
            .map(|book| book.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Take one copy off the shelf. Returns the new available count.
    pub fn decrement_availability(&mut self, book_id: &BookId) -> Result<u32, LibrisError> {
        let book = self.get_mut(book_id)?;
        if book.available_copies == 0 {
            return Err(LibrisError::Exhausted {
                book_id: book_id.clone(),
            });
        }
        book.available_copies -= 1;
        Ok(book.available_copies)
    }

    /// Put one copy back, never above `totalCopies`. Returns the new available count.
    pub fn increment_availability(&mut self, book_id: &BookId) -> Result<u32, LibrisError> {
        let book = self.get_mut(book_id)?;
        book.available_copies = book.available_copies.saturating_add(1).min(book.total_copies);
        Ok(book.available_copies)
    }

    /// A book may be deleted only when every copy is on the shelf.
    pub fn can_delete(&self, book_id: &BookId) -> Result<bool, LibrisError> {
        let book = self.require(book_id)?;
        Ok(book.available_copies == book.total_copies)
    }

    /// Add a book with a fresh id and every copy available.
    pub fn insert(&mut self, new: NewBook) -> Result<&Book, LibrisError> {
        let book = new.into_book(BookId::generate(), self.default_debt_cost);
        book.validate()?;
        self.check_debt_cost(book.debt_cost)?;

        let id = book.id.clone();
        self.order.push(id.clone());
        self.books.insert(id.clone(), book);
        self.require(&id)
    }

    /// Apply a partial edit.
    ///
    /// A `totalCopies` change moves `availableCopies` by the same delta and
    /// may not drop below the copies currently lent. `availableCopies` itself
    /// is accepted only when it matches the resulting value.
    pub fn update(&mut self, book_id: &BookId, mut patch: BookPatch) -> Result<&Book, LibrisError> {
        let current = self.require(book_id)?;
        if let Some(id) = &patch.id {
            if id != book_id {
                return Err(LibrisError::Validation("book id cannot be changed".into()));
            }
        }

        let lent = current.lent_copies();
        let total_copies = patch.total_copies.unwrap_or(current.total_copies);
        if total_copies < lent {
            return Err(LibrisError::Validation(format!(
                "totalCopies cannot drop below the {lent} copies currently lent out"
            )));
        }
        let available_copies = total_copies - lent;
        if let Some(requested) = patch.available_copies {
            if requested != available_copies && requested != current.available_copies {
                return Err(LibrisError::Validation(
                    "availableCopies is managed by lending and cannot be set directly".into(),
                ));
            }
        }

        let extra = patch.take_extra();
        let mut book = current.clone();
        if let Some(title) = patch.title {
            book.title = title.trim().to_string();
        }
        if let Some(authors) = patch.authors {
            book.authors = authors.trim().to_string();
        }
        if patch.isbn.is_some() {
            book.isbn = patch.isbn;
        }
        if patch.publisher.is_some() {
            book.publisher = patch.publisher;
        }
        if patch.num_pages.is_some() {
            book.num_pages = patch.num_pages;
        }
        if let Some(category) = patch.category {
            let category = category.trim();
            book.category = if category.is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                category.to_string()
            };
        }
        if let Some(debt_cost) = patch.debt_cost {
            self.check_debt_cost(debt_cost)?;
            book.debt_cost = debt_cost;
        }
        book.total_copies = total_copies;
        book.available_copies = available_copies;
        // JSON merge: null removes an attribute.
        for (key, value) in extra {
            match value {
                Value::Null => {
                    book.extra.remove(&key);
                }
                value => {
                    book.extra.insert(key, value);
                }
            }
        }
        book.validate()?;

        let slot = self.get_mut(book_id)?;
        *slot = book;
        Ok(&*slot)
    }

    /// Remove a book that has no copies out.
    pub fn remove(&mut self, book_id: &BookId) -> Result<Book, LibrisError> {
        let book = self.require(book_id)?;
        if book.available_copies != book.total_copies {
            return Err(LibrisError::DeleteBlocked {
                kind: ResourceKind::Books,
                id: book_id.to_string(),
                reason: format!("{} copies are still lent out", book.lent_copies()),
            });
        }
        self.order.retain(|id| id != book_id);
        self.books
            .remove(book_id)
            .ok_or_else(|| book_id.into())
    }

    /// Mean per-copy debt cost across titles, if there are any.
    pub fn average_debt_cost(&self) -> Option<u32> {
        if self.books.is_empty() {
            return None;
        }
        let sum: u64 = self.books.values().map(|b| u64::from(b.debt_cost)).sum();
        let average = sum / self.books.len() as u64;
        Some(u32::try_from(average).unwrap_or(u32::MAX))
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats::collect(self.list())
    }

    fn get_mut(&mut self, book_id: &BookId) -> Result<&mut Book, LibrisError> {
        self.books.get_mut(book_id).ok_or_else(|| book_id.into())
    }

    fn check_debt_cost(&self, debt_cost: u32) -> Result<(), LibrisError> {
        if debt_cost < self.min_debt_cost {
            return Err(LibrisError::Validation(format!(
                "debtCost must be at least {}, got {debt_cost}",
                self.min_debt_cost
            )));
        }
        Ok(())
    }
}
