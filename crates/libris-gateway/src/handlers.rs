// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain endpoints used by the library front-end: browsing, member
//! search, lending, returns, and the dashboard statistics.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use libris_core::{BookView, Member, Transaction, TransactionId};
use libris_ledger::{BookFilter, DebtStanding, LendQuote, LendRequest, LibraryStats, TransactionFilter};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::records::{parse_body, to_json};
use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// A member as listed by the search endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView<'a> {
    #[serde(flatten)]
    pub member: &'a Member,
    pub standing: DebtStanding,
    pub effective_ceiling: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct MemberSearch {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    pub status: Option<String>,
}

/// GET /books/available?category=&search=
pub async fn available_books(
    State(state): State<GatewayState>,
    Query(filter): Query<BookFilter>,
) -> ApiResult<Json<Value>> {
    let library = state.library.read().await;
    let books: Vec<BookView<'_>> = library
        .catalog()
        .find_available(&filter)
        .map(|b| b.view())
        .collect();
    Ok(Json(to_json(books)?))
}

/// GET /books/categories
pub async fn categories(State(state): State<GatewayState>) -> Json<Vec<String>> {
    Json(state.library.read().await.catalog().categories())
}

/// GET /members/search?q=
pub async fn search_members(
    State(state): State<GatewayState>,
    Query(search): Query<MemberSearch>,
) -> ApiResult<Json<Value>> {
    let library = state.library.read().await;
    let roster = library.roster();
    let members: Vec<MemberView<'_>> = roster
        .find_by_name(&search.q)
        .map(|member| MemberView {
            member,
            standing: roster.standing(member),
            effective_ceiling: roster.effective_ceiling(member),
        })
        .collect();
    Ok(Json(to_json(members)?))
}

/// POST /lend
pub async fn lend(
    State(state): State<GatewayState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Vec<Transaction>>)> {
    let request: LendRequest = parse_body(&body)?;
    let txs = state
        .library
        .write()
        .await
        .lend(&request.member_id, &request.book_ids)?;
    Ok((StatusCode::CREATED, Json(txs)))
}

/// POST /lend/quote
pub async fn quote(State(state): State<GatewayState>, body: Bytes) -> ApiResult<Json<LendQuote>> {
    let request: LendRequest = parse_body(&body)?;
    let quote = state
        .library
        .read()
        .await
        .quote(&request.member_id, &request.book_ids)?;
    Ok(Json(quote))
}

/// POST /transactions/{id}/return
pub async fn return_transaction(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Transaction>> {
    let tx = state
        .library
        .write()
        .await
        .return_book(&TransactionId::from(id))?;
    Ok(Json(tx))
}

/// GET /transactions?status=all|active|returned
pub async fn list_transactions(
    State(state): State<GatewayState>,
    Query(query): Query<TransactionQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let filter = match query.status.as_deref() {
        None | Some("") => TransactionFilter::All,
        Some(status) => status
            .parse()
            .map_err(|_| ApiError::bad_request(format!("unknown transaction status `{status}`")))?,
    };
    let library = state.library.read().await;
    let txs = library
        .ledger()
        .transactions(filter)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(txs))
}

/// GET /stats
pub async fn stats(State(state): State<GatewayState>) -> Json<LibraryStats> {
    Json(state.library.read().await.stats())
}

/// GET /health
pub async fn health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
