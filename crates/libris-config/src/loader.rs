// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./libris.toml` > `~/.config/libris/libris.toml` > `/etc/libris/libris.toml`
//! with environment variable overrides via the `LIBRIS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::LibrisConfig;

/// Config sections that env vars may target, e.g. `LIBRIS_LENDING_DEBT_CEILING`.
const SECTIONS: &[&str] = &["server", "lending", "store", "logging"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/libris/libris.toml`
/// 3. `~/.config/libris/libris.toml`
/// 4. `./libris.toml`
/// 5. `LIBRIS_*` environment variables
pub fn load_config() -> Result<LibrisConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<LibrisConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LibrisConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LibrisConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LibrisConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LibrisConfig::default()))
        .merge(Toml::file("/etc/libris/libris.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("libris/libris.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("libris.toml"))
        .merge(env_provider())
}

/// Environment provider mapping the first `_` after a known section to a dot.
///
/// `Env::split("_")` would turn `LIBRIS_LENDING_DEBT_CEILING` into
/// `lending.debt.ceiling`; only the section boundary may become a dot.
fn env_provider() -> Env {
    Env::prefixed("LIBRIS_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a prefix-stripped env key to a dotted, lowercase config path.
pub(crate) fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}
