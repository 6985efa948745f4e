//! Diff command implementation.

use super::{find_cell, open_snapshot, CommandResult};
use std::fs::File;
use std::path::Path;
use zoo_core::Client;
use zoo_sync::{SyncConfig, Synchronizer};

/// Runs the diff command, writing one delta per differing record to `out`.
pub fn run(client: &Client, db: &str, cell: &str, file: &Path, out: &Path) -> CommandResult {
    println!("Comparing data cell.");
    let Some(cell) = find_cell(client, db, cell)? else {
        return Ok(());
    };
    let sync = Synchronizer::new(SyncConfig::default())?;

    let report = sync.diff(&cell, open_snapshot(file)?, File::create(out)?)?;
    println!("{report}");
    println!("Deltas written to {}.", out.display());
    Ok(())
}
