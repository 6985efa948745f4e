//! Init command implementation.

use super::{open_cell, open_snapshot, CommandResult};
use std::path::Path;
use zoo_core::Client;
use zoo_sync::{SyncConfig, Synchronizer};

/// Runs the init command.
pub fn run(client: &Client, db: &str, cell: &str, file: &Path) -> CommandResult {
    println!("Initializing data cell.");
    let cell = open_cell(client, db, cell)?;
    let sync = Synchronizer::new(SyncConfig::default())?;

    let report = sync.init(&cell, open_snapshot(file)?)?;
    println!("{report}");
    println!("Done.");
    Ok(())
}
