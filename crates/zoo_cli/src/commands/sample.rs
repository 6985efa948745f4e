//! Sample command implementation.

use super::{find_cell, CommandResult};
use zoo_codec::{from_json_line, to_json_line};
use zoo_core::{Client, Filter};
use zoo_sync::{SyncConfig, Synchronizer};

/// Runs the sample command, printing one JSON line per drawn record.
///
/// `filter` is a JSON object of dotted paths to required values.
pub fn run(
    client: &Client,
    db: &str,
    cell: &str,
    filter: Option<&str>,
    size: usize,
    seed: Option<u64>,
) -> CommandResult {
    let filter = match filter {
        Some(json) => Filter::from_value(&from_json_line(json)?)?,
        None => Filter::all(),
    };
    let Some(cell) = find_cell(client, db, cell)? else {
        return Ok(());
    };
    let sync = Synchronizer::new(SyncConfig::default())?;

    for record in sync.sample(&cell, &filter, size, seed)? {
        println!("{}", to_json_line(&record)?);
    }
    Ok(())
}
