// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Libris library engine.
//!
//! Exposes two surfaces over one shared [`LibraryHandle`]: the generic
//! record store at `/db` used by the browser front-end, and the
//! domain endpoints (lend, return, quote, search, stats). Both call into
//! the engine, so neither can bypass the lending rules.

pub mod error;
pub mod handlers;
pub mod records;
pub mod server;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use server::{build_router, start_server, GatewayState, LibraryHandle, ServerConfig};
