// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Libris library engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use libris_core::{DEFAULT_DEBT_COST, MIN_DEBT_COST, SYSTEM_MAX_DEBT_LIMIT};
use serde::{Deserialize, Serialize};

/// Top-level Libris configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LibrisConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Debt ceiling and pricing rules applied when lending.
    #[serde(default)]
    pub lending: LendingConfig,

    /// In-memory record store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path prefix every route is mounted under.
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_path: default_base_path(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5173
}

fn default_base_path() -> String {
    "/api".to_string()
}

/// Which debt limit is authoritative when lending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitPolicyConfig {
    /// The lower of the member's own `maxDebt` and the system ceiling.
    #[default]
    Member,
    /// Only the system ceiling; per-member `maxDebt` is informational.
    System,
}

/// Lending rules.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LendingConfig {
    /// System-wide debt ceiling (at most 500).
    #[serde(default = "default_debt_ceiling")]
    pub debt_ceiling: u32,

    /// Which limit is checked at lend time.
    #[serde(default)]
    pub limit_policy: LimitPolicyConfig,

    /// Smallest per-copy debt cost accepted for a book.
    #[serde(default = "default_min_debt_cost")]
    pub min_debt_cost: u32,

    /// Debt cost given to new books that do not specify one.
    #[serde(default = "default_debt_cost")]
    pub default_debt_cost: u32,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            debt_ceiling: default_debt_ceiling(),
            limit_policy: LimitPolicyConfig::default(),
            min_debt_cost: default_min_debt_cost(),
            default_debt_cost: default_debt_cost(),
        }
    }
}

fn default_debt_ceiling() -> u32 {
    SYSTEM_MAX_DEBT_LIMIT
}

fn default_min_debt_cost() -> u32 {
    MIN_DEBT_COST
}

fn default_debt_cost() -> u32 {
    DEFAULT_DEBT_COST
}

/// Record store configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// JSON file with `books`, `members`, and `transactions` loaded at startup.
    /// `None` starts with an empty library.
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_front_end_constants() {
        let config = LibrisConfig::default();
        assert_eq!(config.server.port, 5173);
        assert_eq!(config.server.base_path, "/api");
        assert_eq!(config.lending.debt_ceiling, 500);
        assert_eq!(config.lending.min_debt_cost, 10);
        assert_eq!(config.lending.default_debt_cost, 50);
        assert_eq!(config.lending.limit_policy, LimitPolicyConfig::Member);
        assert!(config.store.seed_path.is_none());
    }

    #[test]
    fn limit_policy_parses_lowercase() {
        let config: LibrisConfig = toml::from_str("[lending]\nlimit_policy = \"system\"\n").unwrap();
        assert_eq!(config.lending.limit_policy, LimitPolicyConfig::System);
    }

    #[test]
    fn serializes_back_to_toml() {
        let rendered = toml::to_string(&LibrisConfig::default()).unwrap();
        assert!(rendered.contains("[lending]"));
        assert!(rendered.contains("debt_ceiling = 500"));
    }
}
