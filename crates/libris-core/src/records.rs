// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Book, member, and transaction records plus their create/patch payloads.
//!
//! Stored records deserialize through a lenient raw form that fills the
//! same defaults the library front-end always assumed (one copy, a debt
//! cost of 50, the `Uncategorized` category) and then checks the record
//! invariants. The derived `lent` flag is never stored: it is computed from
//! the copy counts and only appears on the wire via [`BookView`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use strum::Display;

use crate::error::LibrisError;
use crate::types::{
    BookId, MemberId, TransactionId, DEFAULT_CATEGORY, DEFAULT_DEBT_COST, MIN_DEBT_COST,
    SYSTEM_MAX_DEBT_LIMIT,
};

/// Keys that callers may send but that are owned by the store or derived.
const RESERVED_BOOK_KEYS: &[&str] = &["id", "lent", "availableCopies"];

/// Legacy snake_case key for `numPages` found in imported catalogues.
const LEGACY_NUM_PAGES: &str = "num_pages";

// --- Books ---

/// A book title held by the library, with its copy counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawBook")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub authors: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_pages: Option<String>,
    pub category: String,
    pub total_copies: u32,
    pub available_copies: u32,
    /// Charged to a member per copy per loan.
    pub debt_cost: u32,
    /// Descriptive attributes carried through untouched (ratings, isbn13, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Book {
    /// A book counts as lent once every copy is out.
    pub fn is_lent(&self) -> bool {
        self.available_copies == 0
    }

    /// Number of copies currently out on loan.
    pub fn lent_copies(&self) -> u32 {
        self.total_copies.saturating_sub(self.available_copies)
    }

    /// Wire representation including the derived `lent` flag.
    pub fn view(&self) -> BookView<'_> {
        BookView {
            book: self,
            lent: self.is_lent(),
        }
    }

    /// Check the copy and pricing invariants.
    pub fn validate(&self) -> Result<(), LibrisError> {
        require_text("title", &self.title)?;
        require_text("authors", &self.authors)?;
        if self.total_copies < 1 {
            return Err(LibrisError::Validation(format!(
                "book `{}`: totalCopies must be at least 1",
                self.id
            )));
        }
        if self.available_copies > self.total_copies {
            return Err(LibrisError::Validation(format!(
                "book `{}`: availableCopies ({}) exceeds totalCopies ({})",
                self.id, self.available_copies, self.total_copies
            )));
        }
        if self.debt_cost < MIN_DEBT_COST {
            return Err(LibrisError::Validation(format!(
                "book `{}`: debtCost must be at least {MIN_DEBT_COST}, got {}",
                self.id, self.debt_cost
            )));
        }
        Ok(())
    }
}

/// Serialized form of a [`Book`] with the derived `lent` flag attached.
#[derive(Debug, Serialize)]
pub struct BookView<'a> {
    #[serde(flatten)]
    pub book: &'a Book,
    pub lent: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBook {
    id: BookId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: String,
    #[serde(default, deserialize_with = "lenient_string")]
    isbn: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    publisher: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    num_pages: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    total_copies: Option<u32>,
    #[serde(default)]
    available_copies: Option<u32>,
    #[serde(default)]
    debt_cost: Option<u32>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<RawBook> for Book {
    type Error = LibrisError;

    fn try_from(raw: RawBook) -> Result<Self, Self::Error> {
        let mut extra = raw.extra;
        let num_pages = take_num_pages(raw.num_pages, &mut extra);
        extra.remove("lent");

        let total_copies = raw.total_copies.unwrap_or(1);
        let book = Book {
            id: raw.id,
            title: raw.title,
            authors: raw.authors,
            isbn: raw.isbn,
            publisher: raw.publisher,
            num_pages,
            category: category_or_default(raw.category),
            total_copies,
            available_copies: raw.available_copies.unwrap_or(total_copies),
            debt_cost: raw.debt_cost.unwrap_or(DEFAULT_DEBT_COST),
            extra,
        };
        book.validate()?;
        Ok(book)
    }
}

/// Payload for adding a book to the catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub authors: String,
    #[serde(deserialize_with = "lenient_string")]
    pub isbn: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub publisher: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub num_pages: Option<String>,
    pub category: Option<String>,
    pub total_copies: Option<u32>,
    pub debt_cost: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewBook {
    /// Create a payload with only the required fields set.
    pub fn new(title: impl Into<String>, authors: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            authors: authors.into(),
            ..Self::default()
        }
    }

    pub fn with_copies(mut self, total_copies: u32) -> Self {
        self.total_copies = Some(total_copies);
        self
    }

    pub fn with_debt_cost(mut self, debt_cost: u32) -> Self {
        self.debt_cost = Some(debt_cost);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Build the stored record: the id is assigned here and every copy starts
    /// on the shelf. Store-owned keys in `extra` are dropped.
    pub fn into_book(self, id: BookId, default_debt_cost: u32) -> Book {
        let mut extra = self.extra;
        let num_pages = take_num_pages(self.num_pages, &mut extra);
        for key in RESERVED_BOOK_KEYS {
            extra.remove(*key);
        }

        let total_copies = self.total_copies.unwrap_or(1);
        Book {
            id,
            title: self.title.trim().to_string(),
            authors: self.authors.trim().to_string(),
            isbn: self.isbn,
            publisher: self.publisher,
            num_pages,
            category: category_or_default(self.category),
            total_copies,
            available_copies: total_copies,
            debt_cost: self.debt_cost.unwrap_or(default_debt_cost),
            extra,
        }
    }
}

/// Partial update for a book. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookPatch {
    pub id: Option<BookId>,
    pub title: Option<String>,
    pub authors: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub isbn: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub publisher: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub num_pages: Option<String>,
    pub category: Option<String>,
    pub total_copies: Option<u32>,
    pub available_copies: Option<u32>,
    pub debt_cost: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BookPatch {
    /// Extra attributes to merge, with derived and legacy keys folded away.
    pub fn take_extra(&mut self) -> Map<String, Value> {
        let mut extra = std::mem::take(&mut self.extra);
        self.num_pages = take_num_pages(self.num_pages.take(), &mut extra);
        extra.remove("lent");
        extra
    }
}

// --- Members ---

/// A library member and their debt standing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawMember")]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Accumulated charges for unreturned books.
    pub debt: u32,
    pub max_debt: u32,
}

impl Member {
    pub fn validate(&self) -> Result<(), LibrisError> {
        require_text("name", &self.name)?;
        validate_max_debt(self.max_debt)?;
        if self.debt > SYSTEM_MAX_DEBT_LIMIT {
            return Err(LibrisError::Validation(format!(
                "member `{}`: debt ({}) exceeds the system limit of {SYSTEM_MAX_DEBT_LIMIT}",
                self.id, self.debt
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMember {
    id: MemberId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    debt: u32,
    #[serde(default)]
    max_debt: Option<u32>,
}

impl TryFrom<RawMember> for Member {
    type Error = LibrisError;

    fn try_from(raw: RawMember) -> Result<Self, Self::Error> {
        let member = Member {
            id: raw.id,
            name: raw.name,
            email: raw.email,
            phone: raw.phone,
            debt: raw.debt,
            max_debt: raw.max_debt.unwrap_or(SYSTEM_MAX_DEBT_LIMIT),
        };
        member.validate()?;
        Ok(member)
    }
}

/// Payload for registering a member. New members always start debt-free.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewMember {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub max_debt: Option<u32>,
}

impl NewMember {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_max_debt(mut self, max_debt: u32) -> Self {
        self.max_debt = Some(max_debt);
        self
    }

    pub fn into_member(self, id: MemberId) -> Member {
        Member {
            id,
            name: self.name.trim().to_string(),
            email: self.email,
            phone: self.phone,
            debt: 0,
            max_debt: self.max_debt.unwrap_or(SYSTEM_MAX_DEBT_LIMIT),
        }
    }
}

/// Partial update for a member. `debt` is accepted only when unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemberPatch {
    pub id: Option<MemberId>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub debt: Option<u32>,
    pub max_debt: Option<u32>,
}

// --- Transactions ---

/// Lifecycle of a lending transaction. `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    Active,
    Returned,
}

/// One copy of one book lent to one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(alias = "bookID")]
    pub book_id: BookId,
    #[serde(alias = "memberID")]
    pub member_id: MemberId,
    #[serde(deserialize_with = "lenient_date")]
    pub date: DateTime<Utc>,
    /// Per-copy cost agreed at lend time; refunds always use this value.
    #[serde(default = "default_debt_cost")]
    pub debt_cost: u32,
    #[serde(default)]
    pub returned: bool,
}

impl Transaction {
    /// Open a new active transaction dated now.
    pub fn open(book_id: BookId, member_id: MemberId, debt_cost: u32) -> Self {
        Self {
            id: TransactionId::generate(),
            book_id,
            member_id,
            date: Utc::now(),
            debt_cost,
            returned: false,
        }
    }

    pub fn state(&self) -> TransactionState {
        if self.returned {
            TransactionState::Returned
        } else {
            TransactionState::Active
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == TransactionState::Active
    }

    /// Move `Active` to `Returned`. A second call fails and changes nothing.
    pub fn mark_returned(&mut self) -> Result<(), LibrisError> {
        if self.returned {
            return Err(LibrisError::AlreadyReturned {
                transaction_id: self.id.clone(),
            });
        }
        self.returned = true;
        Ok(())
    }
}

/// Requested change to a transaction. Only `returned: true` is a real edit;
/// every other field must match the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransactionPatch {
    pub id: Option<TransactionId>,
    #[serde(alias = "bookID")]
    pub book_id: Option<BookId>,
    #[serde(alias = "memberID")]
    pub member_id: Option<MemberId>,
    pub date: Option<DateTime<Utc>>,
    pub debt_cost: Option<u32>,
    pub returned: Option<bool>,
}

// --- Helpers ---

fn default_debt_cost() -> u32 {
    DEFAULT_DEBT_COST
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), LibrisError> {
    if value.trim().is_empty() {
        return Err(LibrisError::Validation(format!("{field} is required")));
    }
    Ok(())
}

pub(crate) fn validate_max_debt(max_debt: u32) -> Result<(), LibrisError> {
    if max_debt > SYSTEM_MAX_DEBT_LIMIT {
        return Err(LibrisError::Validation(format!(
            "maxDebt must be between 0 and {SYSTEM_MAX_DEBT_LIMIT}, got {max_debt}"
        )));
    }
    Ok(())
}

fn category_or_default(category: Option<String>) -> String {
    category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

fn take_num_pages(num_pages: Option<String>, extra: &mut Map<String, Value>) -> Option<String> {
    let legacy = extra.remove(LEGACY_NUM_PAGES).and_then(value_to_string);
    num_pages.or(legacy)
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accept an RFC 3339 timestamp, or a bare `M/D/YYYY` or `YYYY-MM-DD` date
/// (midnight UTC) as written by older browser front-ends.
fn lenient_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date.with_timezone(&Utc));
    }
    ["%m/%d/%Y", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised transaction date `{raw}`")))
}

/// Accept either a JSON string or number for descriptive fields such as
/// `isbn` and `numPages`, which imported catalogues encode inconsistently.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seed_book() -> Value {
        json!({
            "id": "890",
            "title": "Of Mice and Men",
            "authors": "John Steinbeck",
            "isbn": "0142000671",
            "num_pages": "103",
            "average_rating": "3.87",
            "publisher": "Penguin Books",
            "lent": true,
            "totalCopies": 12,
            "availableCopies": 8,
            "debtCost": 40,
            "category": "Fiction"
        })
    }

    #[test]
    fn book_deserializes_and_drops_stored_lent_flag() {
        let book: Book = serde_json::from_value(seed_book()).unwrap();
        assert_eq!(book.id, BookId::from("890"));
        assert_eq!(book.available_copies, 8);
        assert_eq!(book.num_pages.as_deref(), Some("103"));
        assert!(!book.extra.contains_key("lent"));
        assert!(!book.extra.contains_key("num_pages"));
        assert_eq!(book.extra["average_rating"], json!("3.87"));
        assert!(!book.is_lent());
        assert_eq!(book.lent_copies(), 4);
    }

    #[test]
    fn book_fills_front_end_defaults() {
        let book: Book = serde_json::from_value(json!({
            "id": "b1",
            "title": "Dune",
            "authors": "Frank Herbert"
        }))
        .unwrap();
        assert_eq!(book.category, DEFAULT_CATEGORY);
        assert_eq!(book.total_copies, 1);
        assert_eq!(book.available_copies, 1);
        assert_eq!(book.debt_cost, DEFAULT_DEBT_COST);
    }

    #[test]
    fn book_rejects_more_available_than_total() {
        let err = serde_json::from_value::<Book>(json!({
            "id": "b1",
            "title": "Dune",
            "authors": "Frank Herbert",
            "totalCopies": 2,
            "availableCopies": 3
        }))
        .unwrap_err();
        assert!(err.to_string().contains("exceeds totalCopies"), "got: {err}");
    }

    #[test]
    fn book_view_computes_lent_from_copies() {
        let mut book: Book = serde_json::from_value(seed_book()).unwrap();
        let json = serde_json::to_value(book.view()).unwrap();
        assert_eq!(json["lent"], json!(false));
        assert_eq!(json["totalCopies"], json!(12));
        assert_eq!(json["average_rating"], json!("3.87"));

        book.available_copies = 0;
        let json = serde_json::to_value(book.view()).unwrap();
        assert_eq!(json["lent"], json!(true));
    }

    #[test]
    fn new_book_ignores_store_owned_keys() {
        let new: NewBook = serde_json::from_value(json!({
            "id": "client-chosen",
            "title": " Dune ",
            "authors": "Frank Herbert",
            "totalCopies": 3,
            "availableCopies": 1,
            "lent": true,
            "num_pages": 412
        }))
        .unwrap();
        let book = new.into_book(BookId::from("server"), 50);
        assert_eq!(book.id, BookId::from("server"));
        assert_eq!(book.title, "Dune");
        assert_eq!(book.available_copies, 3);
        assert_eq!(book.num_pages.as_deref(), Some("412"));
        assert!(book.extra.is_empty());
    }

    #[test]
    fn member_defaults_max_debt_to_system_limit() {
        let member: Member =
            serde_json::from_value(json!({"id": "454d", "name": "Moheb", "debt": 0})).unwrap();
        assert_eq!(member.max_debt, SYSTEM_MAX_DEBT_LIMIT);
        assert!(member.email.is_none());
    }

    #[test]
    fn member_rejects_blank_name_and_excess_max_debt() {
        assert!(serde_json::from_value::<Member>(json!({"id": "m", "name": "  "})).is_err());
        assert!(
            serde_json::from_value::<Member>(json!({"id": "m", "name": "a", "maxDebt": 501}))
                .is_err()
        );
    }

    #[test]
    fn member_rejects_debt_above_system_limit() {
        let err = serde_json::from_value::<Member>(json!({"id": "m", "name": "a", "debt": 9000}))
            .unwrap_err();
        assert!(err.to_string().contains("exceeds the system limit"), "got: {err}");
        assert!(
            serde_json::from_value::<Member>(json!({"id": "m", "name": "a", "debt": 500})).is_ok()
        );
    }

    #[test]
    fn transaction_accepts_locale_and_iso_dates() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": "t1", "bookID": "890", "memberID": "454d", "date": "3/1/2026"
        }))
        .unwrap();
        assert_eq!(tx.date.to_rfc3339(), "2026-03-01T00:00:00+00:00");

        let tx: Transaction = serde_json::from_value(json!({
            "id": "t2", "bookId": "890", "memberId": "454d", "date": "2026-12-24"
        }))
        .unwrap();
        assert_eq!(tx.date.to_rfc3339(), "2026-12-24T00:00:00+00:00");

        assert!(serde_json::from_value::<Transaction>(json!({
            "id": "t3", "bookId": "890", "memberId": "454d", "date": "yesterday"
        }))
        .is_err());
    }

    #[test]
    fn transaction_accepts_legacy_reference_keys() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": "t1",
            "bookID": "890",
            "memberID": "454d",
            "date": "2026-03-01T10:00:00Z",
            "debtCost": 40,
            "returned": false
        }))
        .unwrap();
        assert_eq!(tx.book_id, BookId::from("890"));
        assert_eq!(tx.member_id, MemberId::from("454d"));
        assert_eq!(tx.state(), TransactionState::Active);

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["bookId"], json!("890"));
        assert!(json.get("bookID").is_none());
    }

    #[test]
    fn mark_returned_is_one_way() {
        let mut tx = Transaction::open(BookId::from("b"), MemberId::from("m"), 50);
        assert!(tx.is_active());
        tx.mark_returned().unwrap();
        assert_eq!(tx.state(), TransactionState::Returned);
        let err = tx.mark_returned().unwrap_err();
        assert!(matches!(err, LibrisError::AlreadyReturned { .. }));
        assert!(tx.returned);
    }

    #[test]
    fn book_patch_folds_legacy_keys() {
        let mut patch: BookPatch = serde_json::from_value(json!({
            "title": "New title",
            "num_pages": "200",
            "lent": false,
            "isbn13": "9780142000670"
        }))
        .unwrap();
        let extra = patch.take_extra();
        assert_eq!(patch.num_pages.as_deref(), Some("200"));
        assert_eq!(extra.len(), 1);
        assert!(extra.contains_key("isbn13"));
    }
}
