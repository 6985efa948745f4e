//! Drop command implementation.

use super::{confirm, CommandResult};
use zoo_core::Client;
use zoo_sync::{SyncConfig, Synchronizer};

/// Runs the drop command. Without `force`, asks first.
pub fn run(client: &Client, db: &str, cell: &str, force: bool) -> CommandResult {
    if !confirm(&format!("Drop cell {db}/{cell}? This cannot be undone"), force)? {
        println!("Aborted!");
        return Ok(());
    }

    let sync = Synchronizer::new(SyncConfig::default())?;
    if sync.drop(&client.database(db)?, cell)? {
        println!("Dropped cell \"{cell}\" from database \"{db}\".");
    } else {
        println!("No cell \"{cell}\" in database \"{db}\".");
    }
    Ok(())
}
