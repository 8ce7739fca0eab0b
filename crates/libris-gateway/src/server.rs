// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    routing::{get, post},
    Router,
};
use libris_core::LibrisError;
use libris_ledger::Library;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::records;

/// Shared handle to the process-wide library.
///
/// Mutating handlers hold the write lock for the whole engine call, so
/// mutations are applied one at a time and readers never observe a
/// half-applied lend.
pub type LibraryHandle = Arc<RwLock<Library>>;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub library: LibraryHandle,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(library: Library) -> Self {
        Self::from_handle(Arc::new(RwLock::new(library)))
    }

    pub fn from_handle(library: LibraryHandle) -> Self {
        Self {
            library,
            start_time: Instant::now(),
        }
    }
}

/// Gateway listener configuration (mirrors `[server]` from libris-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prefix every route is mounted under, e.g. `/api`.
    pub base_path: String,
}

/// Build the application router with every route mounted under `base_path`.
pub fn build_router(state: GatewayState, base_path: &str) -> Router {
    let api = Router::new()
        .route(
            "/db",
            get(records::get_records)
                .post(records::create_record)
                .put(records::update_record)
                .patch(records::update_record)
                .delete(records::delete_record),
        )
        .route("/books/available", get(handlers::available_books))
        .route("/books/categories", get(handlers::categories))
        .route("/members/search", get(handlers::search_members))
        .route("/lend", post(handlers::lend))
        .route("/lend/quote", post(handlers::quote))
        .route("/transactions", get(handlers::list_transactions))
        .route("/transactions/{id}/return", post(handlers::return_transaction))
        .route("/stats", get(handlers::stats))
        .route("/health", get(handlers::health))
        .with_state(state);

    let app = if base_path.is_empty() || base_path == "/" {
        api
    } else {
        Router::new().nest(base_path, api)
    };

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), LibrisError> {
    let app = build_router(state, &config.base_path);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LibrisError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!(base_path = %config.base_path, "gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| LibrisError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_ledger::LendingPolicy;

    #[test]
    fn gateway_state_shares_library() {
        let state = GatewayState::new(Library::new(LendingPolicy::default()));
        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.library, &cloned.library));
    }

    #[test]
    fn router_builds_for_root_and_prefixed_paths() {
        let state = GatewayState::new(Library::new(LendingPolicy::default()));
        let _root = build_router(state.clone(), "/");
        let _prefixed = build_router(state, "/api");
    }
}
