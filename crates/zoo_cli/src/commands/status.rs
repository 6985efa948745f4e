//! Status command implementation.

use super::{find_cell, CommandResult};
use zoo_codec::to_json_pretty;
use zoo_core::Client;
use zoo_sync::{SyncConfig, Synchronizer};

/// Runs the status command.
///
/// With a cell, prints its count and optionally an example record. Without
/// one, prints the count of every cell in the database.
pub fn run(client: &Client, db: &str, cell: Option<&str>, example: bool) -> CommandResult {
    let sync = Synchronizer::new(SyncConfig::default())?;

    let Some(cell) = cell else {
        let statuses = sync.status_all(&client.database(db)?)?;
        if statuses.is_empty() {
            println!("No cells in database \"{db}\".");
        }
        for status in statuses {
            println!("{status}");
        }
        return Ok(());
    };

    let Some(cell) = find_cell(client, db, cell)? else {
        return Ok(());
    };
    let status = sync.status(&cell, example)?;
    println!("{status}");
    if let Some(record) = &status.example {
        println!("Example entry:\n{}", to_json_pretty(record)?);
    }
    Ok(())
}
