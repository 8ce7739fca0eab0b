// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints that serde attributes cannot express, such
//! as non-blank hosts, well-formed base paths, and debt-ceiling bounds.

use libris_core::{MIN_DEBT_COST, SYSTEM_MAX_DEBT_LIMIT};

use crate::diagnostic::ConfigError;
use crate::model::LibrisConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns every validation error found rather than stopping at the first.
pub fn validate_config(config: &LibrisConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(validation("server.host must not be empty".to_string()));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(validation(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    let base_path = &config.server.base_path;
    if !base_path.starts_with('/') {
        errors.push(validation(format!(
            "server.base_path must start with `/`, got `{base_path}`"
        )));
    } else if base_path.len() > 1 && base_path.ends_with('/') {
        errors.push(validation(format!(
            "server.base_path must not end with `/`, got `{base_path}`"
        )));
    }

    let lending = &config.lending;
    if lending.debt_ceiling == 0 || lending.debt_ceiling > SYSTEM_MAX_DEBT_LIMIT {
        errors.push(validation(format!(
            "lending.debt_ceiling must be between 1 and {SYSTEM_MAX_DEBT_LIMIT}, got {}",
            lending.debt_ceiling
        )));
    }

    if lending.min_debt_cost == 0 {
        errors.push(validation(
            "lending.min_debt_cost must be greater than 0".to_string(),
        ));
    }

    // Books are never priced below MIN_DEBT_COST, whatever min_debt_cost says.
    let floor = lending.min_debt_cost.max(MIN_DEBT_COST);
    if lending.default_debt_cost < floor {
        errors.push(validation(format!(
            "lending.default_debt_cost ({}) must not be below the effective minimum debt cost ({floor})",
            lending.default_debt_cost
        )));
    }

    if let Some(seed) = &config.store.seed_path {
        if seed.as_os_str().is_empty() {
            errors.push(validation("store.seed_path must not be empty".to_string()));
        }
    }

    let level = config.logging.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(validation(format!(
            "logging.log_level `{}` is not one of {}",
            config.logging.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validation(message: String) -> ConfigError {
    ConfigError::Validation { message }
}
