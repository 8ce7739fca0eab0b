// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Libris configuration system.

use std::io::Write;

use libris_config::diagnostic::{suggest_key, ConfigError};
use libris_config::model::{LibrisConfig, LimitPolicyConfig};
use libris_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use serial_test::serial;

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 8080
base_path = "/library"

[lending]
debt_ceiling = 300
limit_policy = "system"
min_debt_cost = 5
default_debt_cost = 25

[store]
seed_path = "/var/lib/libris/db.json"

[logging]
log_level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.base_path, "/library");
    assert_eq!(config.lending.debt_ceiling, 300);
    assert_eq!(config.lending.limit_policy, LimitPolicyConfig::System);
    assert_eq!(config.lending.min_debt_cost, 5);
    assert_eq!(config.lending.default_debt_cost, 25);
    assert_eq!(
        config.store.seed_path.as_deref(),
        Some(std::path::Path::new("/var/lib/libris/db.json"))
    );
    assert_eq!(config.logging.log_level, "debug");
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("empty config should load");
    assert_eq!(config, LibrisConfig::default());
}

#[test]
fn partial_section_keeps_other_defaults() {
    let config = load_config_from_str("[lending]\ndebt_ceiling = 200\n").unwrap();
    assert_eq!(config.lending.debt_ceiling, 200);
    assert_eq!(config.lending.min_debt_cost, 10);
    assert_eq!(config.server.port, 5173);
}

#[test]
fn unknown_field_is_rejected() {
    let err = load_config_from_str("[lending]\ndebt_cieling = 100\n")
        .expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("debt_cieling"),
        "error should mention the bad key, got: {err_str}"
    );
}

#[test]
fn unknown_section_is_rejected() {
    assert!(load_config_from_str("[shelves]\ncount = 4\n").is_err());
}

#[test]
fn unknown_key_diagnostic_carries_suggestion() {
    let errors = load_and_validate_str("[lending]\ndebt_cieling = 100\n")
        .expect_err("should fail");
    let found = errors.iter().any(|e| match e {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => key == "debt_cieling" && suggestion.as_deref() == Some("debt_ceiling"),
        _ => false,
    });
    assert!(found, "expected UnknownKey with suggestion, got: {errors:?}");
}

#[test]
fn wrong_type_produces_invalid_type() {
    let errors = load_and_validate_str("[server]\nport = \"eighty\"\n").expect_err("should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got: {errors:?}"
    );
}

#[test]
fn semantic_validation_runs_after_parse() {
    let errors = load_and_validate_str("[lending]\ndebt_ceiling = 900\n").expect_err("should fail");
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], ConfigError::Validation { message } if message.contains("debt_ceiling")));
}

#[test]
fn suggest_key_prefers_closest_match() {
    let valid = &["host", "port", "base_path"];
    assert_eq!(suggest_key("prot", valid), Some("port".to_string()));
    assert_eq!(suggest_key("base_pth", valid), Some("base_path".to_string()));
}

#[test]
#[serial]
fn file_loading_applies_env_override() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\nport = 7000\n[logging]\nlog_level = \"warn\"").unwrap();

    // SAFETY: serialized with other env-mutating tests.
    unsafe { std::env::set_var("LIBRIS_SERVER_PORT", "7100") };
    let result = load_and_validate_path(file.path());
    unsafe { std::env::remove_var("LIBRIS_SERVER_PORT") };

    let config = result.expect("config should load");
    assert_eq!(config.server.port, 7100);
    assert_eq!(config.logging.log_level, "warn");
}

#[test]
#[serial]
fn missing_file_falls_back_to_defaults() {
    let config = load_and_validate_path(std::path::Path::new("/nonexistent/libris.toml"))
        .expect("missing file is not an error");
    assert_eq!(config.server.base_path, "/api");
}
