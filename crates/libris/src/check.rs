// SPDX-FileCopyrightText: 2026 Libris Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `libris check` command implementation.
//!
//! Loads a seed file under the configured lending policy, which runs every
//! record and cross-reference check, then prints the library statistics.

use std::path::Path;

use libris_config::LibrisConfig;
use libris_core::LibrisError;
use libris_ledger::{LendingPolicy, Library, LibraryStats, LibrarySnapshot};

/// Run the `libris check <seed>` command.
pub fn run_check(config: &LibrisConfig, seed: &Path) -> Result<(), LibrisError> {
    let stats = check_seed(config, seed)?;
    println!("  libris check: {}", seed.display());
    println!("  {}", "-".repeat(50));
    print!("{}", format_stats(&stats));
    Ok(())
}

/// Validate the seed file and return its statistics.
pub fn check_seed(config: &LibrisConfig, seed: &Path) -> Result<LibraryStats, LibrisError> {
    let snapshot = LibrarySnapshot::load(seed)?;
    let library = Library::from_snapshot(snapshot, LendingPolicy::from(&config.lending))?;
    Ok(library.stats())
}

fn format_stats(stats: &LibraryStats) -> String {
    let catalog = &stats.catalog;
    let members = &stats.members;
    let ledger = &stats.ledger;
    format!(
        "  books         {} titles, {} copies ({} on shelf, {} lent)\n\
         \x20 catalog value {}\n\
         \x20 members       {} ({} with debt, total debt {})\n\
         \x20 transactions  {} ({} active, {} returned)\n",
        catalog.titles,
        catalog.total_copies,
        catalog.available_copies,
        catalog.lent_copies,
        catalog.total_value,
        members.members,
        members.with_debt,
        members.total_debt,
        ledger.transactions,
        ledger.active,
        ledger.returned,
    )
}
