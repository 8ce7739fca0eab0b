// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Libris integration tests.
//!
//! [`TestHarness`] seeds a library, wires it into the gateway router, and
//! drives requests in-process without binding a socket.

pub mod harness;

pub use harness::{TestHarness, TestHarnessBuilder, TestResponse};
