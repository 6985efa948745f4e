//! Destroy command implementation.

use super::{confirm, CommandResult};
use zoo_core::Client;
use zoo_sync::{SyncConfig, Synchronizer};

/// Runs the destroy command. Without `force`, asks first.
pub fn run(client: &Client, db: &str, force: bool) -> CommandResult {
    if !confirm(&format!("Destroy database {db} and all its cells?"), force)? {
        println!("Aborted!");
        return Ok(());
    }

    let sync = Synchronizer::new(SyncConfig::default())?;
    if sync.destroy(client, db)? {
        println!("Destroyed database \"{db}\".");
    } else {
        println!("No database \"{db}\".");
    }
    Ok(())
}
