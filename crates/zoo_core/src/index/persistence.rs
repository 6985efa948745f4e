//! Index spec persistence.
//!
//! A cell's secondary index specs live in `<cell>.idx` as a JSON array.
//! Index contents are never persisted; they are rebuilt from the segment
//! when the cell is opened.

use crate::dir::sync_directory;
use crate::error::{CoreError, CoreResult};
use crate::index::IndexSpec;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Loads index specs; a missing file means no secondary indexes.
pub fn load_specs(path: &Path) -> CoreResult<Vec<IndexSpec>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&data).map_err(|e| {
        CoreError::invalid_format(format!("index file {}: {e}", path.display()))
    })
}

/// Saves index specs atomically.
///
/// Writes a temporary file, syncs it, renames it over `path`, then syncs
/// the directory so the rename survives a crash.
pub fn save_specs(path: &Path, specs: &[IndexSpec]) -> CoreResult<()> {
    let data = serde_json::to_vec_pretty(specs)
        .map_err(|e| CoreError::invalid_format(format!("index specs: {e}")))?;

    let temp_path = path.with_extension("idx.tmp");
    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
    }
    fs::rename(&temp_path, path)?;

    if let Some(parent) = path.parent() {
        sync_directory(parent)?;
    }
    Ok(())
}
