//! CLI command implementations.

pub mod add;
pub mod commit;
pub mod destroy;
pub mod diff;
pub mod drop;
pub mod init;
pub mod pull;
pub mod sample;
pub mod status;

use dialoguer::Confirm;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use zoo_core::{Cell, Client, CoreResult};

/// Result type shared by the commands.
pub type CommandResult = Result<(), Box<dyn Error>>;

/// Opens `<db>/<cell>`, creating it if absent.
pub fn open_cell(client: &Client, db: &str, cell: &str) -> CoreResult<Cell> {
    client.database(db)?.cell(cell)
}

/// Opens `<db>/<cell>` for reading. Prints a notice and returns `None` when
/// the cell does not exist.
pub fn find_cell(client: &Client, db: &str, cell: &str) -> CoreResult<Option<Cell>> {
    let found = client.database(db)?.existing_cell(cell)?;
    if found.is_none() {
        println!("No cell \"{cell}\" in database \"{db}\".");
    }
    Ok(found)
}

/// Opens a snapshot file for streaming.
pub fn open_snapshot(path: &Path) -> io::Result<BufReader<File>> {
    File::open(path).map(BufReader::new)
}

/// Asks before an irreversible step. `force` answers yes without asking.
pub fn confirm(prompt: &str, force: bool) -> dialoguer::Result<bool> {
    if force {
        return Ok(true);
    }
    Confirm::new().with_prompt(prompt).default(false).interact()
}
