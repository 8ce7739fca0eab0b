// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whole-library record dumps, used for seed files and exports.
//!
//! The JSON layout matches the record store: three top-level arrays named
//! after the resources. Missing arrays are treated as empty.

use std::path::Path;

use libris_core::{Book, LibrisError, Member, Transaction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl LibrarySnapshot {
    /// Parse a snapshot, applying record defaults and per-record checks.
    /// Cross-record checks happen in [`crate::Library::from_snapshot`].
    pub fn from_json(json: &str) -> Result<Self, LibrisError> {
        serde_json::from_str(json)
            .map_err(|e| LibrisError::Config(format!("invalid library data: {e}")))
    }

    /// Read and parse a seed file.
    pub fn load(path: &Path) -> Result<Self, LibrisError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            LibrisError::Config(format!("cannot read seed file {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, LibrisError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LibrisError::Internal(format!("failed to serialize snapshot: {e}")))
    }
}
