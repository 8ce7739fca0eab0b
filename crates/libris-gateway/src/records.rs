// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic record-store endpoint: `/db?resource={books|members|transactions}&id={id}`.
//!
//! Every write is routed through the engine so the lending invariants hold
//! no matter which surface a client uses. Creating a transaction is a lend;
//! setting `returned: true` on one is a return.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use libris_core::{
    BookId, BookPatch, MemberId, MemberPatch, NewBook, NewMember, ResourceKind, TransactionId,
    TransactionPatch,
};
use libris_ledger::LendRequest;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::server::GatewayState;

/// Query string for `/db`.
#[derive(Debug, Default, Deserialize)]
pub struct RecordQuery {
    pub resource: Option<String>,
    pub id: Option<String>,
}

impl RecordQuery {
    fn kind(&self) -> ApiResult<ResourceKind> {
        let resource = self
            .resource
            .as_deref()
            .ok_or_else(|| ApiError::bad_request("missing `resource` query parameter"))?;
        resource
            .parse()
            .map_err(|_| ApiError::bad_request(format!("unknown resource `{resource}`")))
    }

    fn require_id(&self) -> ApiResult<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::bad_request("missing `id` query parameter"))
    }
}

/// `POST /db?resource=transactions` body: one book or a batch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NewTransaction {
    Batch(LendRequest),
    Single(SingleLend),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SingleLend {
    #[serde(alias = "memberID")]
    member_id: MemberId,
    #[serde(alias = "bookID")]
    book_id: BookId,
}

/// Parse a JSON request body, reporting malformed input as 400.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    if body.is_empty() {
        return Err(ApiError::bad_request("request body must be a JSON object"));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))
}

fn from_value<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| ApiError::bad_request(format!("invalid record: {e}")))
}

pub(crate) fn to_json<T: serde::Serialize>(value: T) -> ApiResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| libris_core::LibrisError::Internal(format!("serialization failed: {e}")).into())
}

/// `GET /db?resource={r}[&id={id}]`
pub async fn get_records(
    State(state): State<GatewayState>,
    Query(query): Query<RecordQuery>,
) -> ApiResult<Json<Value>> {
    let kind = query.kind()?;
    let library = state.library.read().await;

    let value = match (kind, query.id.as_deref()) {
        (ResourceKind::Books, None) => {
            to_json(library.catalog().list().map(|b| b.view()).collect::<Vec<_>>())?
        }
        (ResourceKind::Books, Some(id)) => {
            to_json(library.catalog().require(&BookId::from(id))?.view())?
        }
        (ResourceKind::Members, None) => to_json(library.roster().list().collect::<Vec<_>>())?,
        (ResourceKind::Members, Some(id)) => {
            to_json(library.roster().require(&MemberId::from(id))?)?
        }
        (ResourceKind::Transactions, None) => {
            to_json(library.ledger().list().collect::<Vec<_>>())?
        }
        (ResourceKind::Transactions, Some(id)) => {
            to_json(library.ledger().require(&TransactionId::from(id))?)?
        }
    };
    Ok(Json(value))
}

/// `POST /db?resource={r}` creates a record and returns it with 201.
pub async fn create_record(
    State(state): State<GatewayState>,
    Query(query): Query<RecordQuery>,
    body: Bytes,
) -> ApiResult<Response> {
    let kind = query.kind()?;
    let created = match kind {
        ResourceKind::Books => {
            let new: NewBook = parse_body(&body)?;
            let book = state.library.write().await.add_book(new)?;
            to_json(book.view())?
        }
        ResourceKind::Members => {
            let new: NewMember = parse_body(&body)?;
            to_json(state.library.write().await.add_member(new)?)?
        }
        ResourceKind::Transactions => match parse_body::<NewTransaction>(&body)? {
            NewTransaction::Batch(request) => {
                let txs = state
                    .library
                    .write()
                    .await
                    .lend(&request.member_id, &request.book_ids)?;
                to_json(txs)?
            }
            NewTransaction::Single(single) => {
                let mut txs = state
                    .library
                    .write()
                    .await
                    .lend(&single.member_id, &[single.book_id])?;
                let tx = txs
                    .pop()
                    .ok_or_else(|| libris_core::LibrisError::Internal("lend returned no transaction".into()))?;
                to_json(tx)?
            }
        },
    };
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

/// `PUT|PATCH /db?resource={r}&id={id}` merges the body into the stored record.
pub async fn update_record(
    State(state): State<GatewayState>,
    Query(query): Query<RecordQuery>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let kind = query.kind()?;
    let id = query.require_id()?;
    let body: Value = parse_body(&body)?;
    if !body.is_object() {
        return Err(ApiError::bad_request("request body must be a JSON object"));
    }

    let mut library = state.library.write().await;
    let updated = match kind {
        ResourceKind::Books => {
            let patch: BookPatch = from_value(body)?;
            let book = library.update_book(&BookId::from(id), patch)?;
            to_json(book.view())?
        }
        ResourceKind::Members => {
            let patch: MemberPatch = from_value(body)?;
            to_json(library.update_member(&MemberId::from(id), patch)?)?
        }
        ResourceKind::Transactions => {
            let patch: TransactionPatch = from_value(body)?;
            to_json(library.update_transaction(&TransactionId::from(id), patch)?)?
        }
    };
    Ok(Json(updated))
}

/// `DELETE /db?resource={r}&id={id}` returns 204, or 409 while the record is in use.
pub async fn delete_record(
    State(state): State<GatewayState>,
    Query(query): Query<RecordQuery>,
) -> ApiResult<StatusCode> {
    let kind = query.kind()?;
    let id = query.require_id()?;

    let mut library = state.library.write().await;
    match kind {
        ResourceKind::Books => {
            library.delete_book(&BookId::from(id))?;
        }
        ResourceKind::Members => {
            library.delete_member(&MemberId::from(id))?;
        }
        ResourceKind::Transactions => {
            library.delete_transaction(&TransactionId::from(id))?;
        }
    }
    Ok(StatusCode::NO_CONTENT)
}
