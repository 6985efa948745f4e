//! Add command implementation.

use super::{open_cell, open_snapshot, CommandResult};
use std::path::Path;
use zoo_core::Client;
use zoo_sync::{SyncConfig, Synchronizer};

/// Runs the add command.
///
/// `primkey` names the field that identifies duplicates. Any field other
/// than `_id` gets a unique index the first time it is used.
pub fn run(client: &Client, db: &str, cell: &str, primkey: &str, file: &Path) -> CommandResult {
    println!("Loading data cell.");
    let cell = open_cell(client, db, cell)?;
    let sync = Synchronizer::new(SyncConfig::new().with_primkey(primkey))?;

    let report = sync.add(&cell, open_snapshot(file)?)?;
    println!("{report}");
    println!("Done.");
    Ok(())
}
