// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `libris serve` command implementation.
//!
//! Builds the library from the configured seed file (or empty), starts the
//! gateway, and runs until SIGINT or SIGTERM.

use libris_config::LibrisConfig;
use libris_core::LibrisError;
use libris_gateway::{start_server, GatewayState, ServerConfig};
use libris_ledger::{LendingPolicy, Library, LibrarySnapshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Runs the `libris serve` command.
pub async fn run_serve(config: LibrisConfig) -> Result<(), LibrisError> {
    init_tracing(&config.logging.log_level);

    info!("starting libris serve");

    let library = build_library(&config)?;
    let stats = library.stats();
    info!(
        titles = stats.catalog.titles,
        members = stats.members.members,
        transactions = stats.ledger.transactions,
        "library loaded"
    );

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        base_path: config.server.base_path.clone(),
    };
    let cancel = install_signal_handler();

    start_server(&server_config, GatewayState::new(library), cancel).await?;

    info!("libris serve shutdown complete");
    Ok(())
}

/// Builds the in-memory library from `store.seed_path`, or an empty one.
pub fn build_library(config: &LibrisConfig) -> Result<Library, LibrisError> {
    let policy = LendingPolicy::from(&config.lending);
    match &config.store.seed_path {
        Some(path) => {
            info!(path = %path.display(), "loading seed data");
            Library::from_snapshot(LibrarySnapshot::load(path)?, policy)
        }
        None => {
            debug!("no seed_path configured, starting with an empty library");
            Ok(Library::new(policy))
        }
    }
}

/// Returns a token cancelled on SIGINT (Ctrl+C) or SIGTERM.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    error!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides `log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("libris={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_core::{NewBook, NewMember};

    #[test]
    fn empty_library_without_seed() {
        let library = build_library(&LibrisConfig::default()).unwrap();
        assert!(library.catalog().is_empty());
        assert!(library.roster().is_empty());
    }

    #[test]
    fn seed_file_is_loaded_with_configured_policy() {
        let mut source = Library::new(LendingPolicy::default());
        let book = source
            .add_book(NewBook::new("Dune", "Frank Herbert").with_copies(2))
            .unwrap();
        let member = source.add_member(NewMember::new("Ada")).unwrap();
        source.lend(&member.id, &[book.id.clone()]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, source.snapshot().to_json_pretty().unwrap()).unwrap();

        let mut config = LibrisConfig::default();
        config.store.seed_path = Some(path);
        config.lending.debt_ceiling = 300;

        let library = build_library(&config).unwrap();
        assert_eq!(library.catalog().get(&book.id).unwrap().available_copies, 1);
        assert_eq!(library.roster().get(&member.id).unwrap().debt, 50);
        assert_eq!(library.policy().debt_ceiling, 300);
    }

    #[test]
    fn missing_seed_file_is_an_error() {
        let mut config = LibrisConfig::default();
        config.store.seed_path = Some("/nonexistent/libris/seed.json".into());
        assert!(build_library(&config).is_err());
    }
}
