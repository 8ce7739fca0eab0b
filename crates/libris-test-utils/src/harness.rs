// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a seeded [`Library`], the shared handle the
//! gateway serves from, and the full router. Seed ids are kept in
//! insertion order so tests can refer to `harness.book_ids[0]` and friends.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use libris_core::{BookId, LibrisError, MemberId, NewBook, NewMember};
use libris_gateway::{build_router, GatewayState, LibraryHandle};
use libris_ledger::{LendingPolicy, Library, LibrarySnapshot};
use serde_json::Value;
use tokio::sync::RwLock;
use tower::ServiceExt;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    policy: LendingPolicy,
    books: Vec<NewBook>,
    members: Vec<NewMember>,
    snapshot: Option<LibrarySnapshot>,
    base_path: String,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            policy: LendingPolicy::default(),
            books: Vec::new(),
            members: Vec::new(),
            snapshot: None,
            base_path: "/api".to_string(),
        }
    }

    /// Use a non-default lending policy.
    pub fn with_policy(mut self, policy: LendingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add a book to the catalog before the router is built.
    pub fn with_book(mut self, book: NewBook) -> Self {
        self.books.push(book);
        self
    }

    /// Register a member before the router is built.
    pub fn with_member(mut self, member: NewMember) -> Self {
        self.members.push(member);
        self
    }

    /// Start from stored records instead of an empty library.
    /// Books and members added with the other builders are appended.
    pub fn with_snapshot(mut self, snapshot: LibrarySnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Mount the router under a different prefix (default `/api`).
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Build the harness, creating the library and router.
    pub fn build(self) -> Result<TestHarness, LibrisError> {
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| LibrisError::Internal(format!("failed to create temp dir: {e}")))?;

        let mut library = match self.snapshot {
            Some(snapshot) => Library::from_snapshot(snapshot, self.policy)?,
            None => Library::new(self.policy),
        };

        let mut book_ids = Vec::with_capacity(self.books.len());
        for book in self.books {
            book_ids.push(library.add_book(book)?.id);
        }
        let mut member_ids = Vec::with_capacity(self.members.len());
        for member in self.members {
            member_ids.push(library.add_member(member)?.id);
        }

        let library: LibraryHandle = Arc::new(RwLock::new(library));
        let router = build_router(GatewayState::from_handle(library.clone()), &self.base_path);

        Ok(TestHarness {
            library,
            router,
            book_ids,
            member_ids,
            base_path: self.base_path,
            temp_dir,
        })
    }
}

/// Status and decoded JSON body of one request. Empty bodies decode to `Null`.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// A complete test environment: seeded library, shared handle, and router.
pub struct TestHarness {
    /// Handle the router serves from; lock it to assert on engine state.
    pub library: LibraryHandle,
    /// Router with every route mounted under `base_path`.
    pub router: Router,
    /// Ids of books added through the builder, in order.
    pub book_ids: Vec<BookId>,
    /// Ids of members added through the builder, in order.
    pub member_ids: Vec<MemberId>,
    base_path: String,
    /// Temp directory kept alive for cleanup on drop.
    temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Send one request to `path` (relative to the base path).
    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> TestResponse {
        let uri = format!("{}{}", self.base_path.trim_end_matches('/'), path);
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        let request = match request {
            Ok(request) => request,
            Err(e) => panic!("invalid test request: {e}"),
        };

        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let status = response.status();
        let bytes = match axum::body::to_bytes(response.into_body(), usize::MAX).await {
            Ok(bytes) => bytes,
            Err(e) => panic!("failed to read response body: {e}"),
        };
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::error!(error = %e, "non-JSON response body in test harness");
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse { status, body }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> TestResponse {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request(Method::DELETE, path, None).await
    }

    /// Write the current library state as a seed file in the harness temp dir.
    pub async fn write_seed(&self) -> Result<PathBuf, LibrisError> {
        let json = self.library.read().await.snapshot().to_json_pretty()?;
        let path = self.temp_dir.path().join("library.json");
        std::fs::write(&path, json)
            .map_err(|e| LibrisError::Internal(format!("failed to write seed file: {e}")))?;
        Ok(path)
    }
}
