//! Store directory management.
//!
//! This module handles the file system layout of a file-backed store:
//!
//! ```text
//! <root>/
//! ├─ LOCK              # Advisory lock for single-writer
//! └─ <database>/
//!    ├─ <cell>.seg     # Append-only record log
//!    └─ <cell>.idx     # Secondary index specs (JSON)
//! ```
//!
//! The LOCK file ensures only one process can write to the store at a time.

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const SEGMENT_EXT: &str = "seg";
const INDEX_EXT: &str = "idx";

/// Holds the store root and its exclusive lock.
///
/// Only one `StoreDir` can exist per directory at a time, across processes.
/// The lock is released when the value is dropped.
#[derive(Debug)]
pub struct StoreDir {
    path: PathBuf,
    _lock_file: File,
}

impl StoreDir {
    /// Opens or creates a store root.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - Another process holds the lock (returns `StoreLocked`)
    /// - I/O errors occur
    pub fn open(path: &Path, create_if_missing: bool) -> CoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(CoreError::invalid_format(format!(
                    "store directory does not exist: {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(CoreError::invalid_format(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::StoreLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the store root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the directory of a database.
    #[must_use]
    pub fn database_path(&self, database: &str) -> PathBuf {
        self.path.join(database)
    }

    /// Lists the databases present on disk, sorted.
    pub fn database_names(&self) -> CoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Removes a database directory and everything in it.
    ///
    /// Returns false when the database did not exist.
    pub fn remove_database(&self, database: &str) -> CoreResult<bool> {
        match fs::remove_dir_all(self.database_path(database)) {
            Ok(()) => {
                sync_directory(&self.path)?;
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Paths of one cell's files inside its database directory.
#[derive(Debug, Clone)]
pub struct CellFiles {
    /// The record log.
    pub segment: PathBuf,
    /// The index spec file.
    pub index: PathBuf,
}

impl CellFiles {
    /// Files of `cell` under `database_dir`.
    #[must_use]
    pub fn new(database_dir: &Path, cell: &str) -> Self {
        Self {
            segment: database_dir.join(format!("{cell}.{SEGMENT_EXT}")),
            index: database_dir.join(format!("{cell}.{INDEX_EXT}")),
        }
    }

    /// Deletes both files; missing files are not an error.
    pub fn remove(&self) -> CoreResult<()> {
        for path in [&self.segment, &self.index] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        if let Some(parent) = self.segment.parent() {
            if parent.exists() {
                sync_directory(parent)?;
            }
        }
        Ok(())
    }
}

/// Lists the cells of a database directory (one per segment file), sorted.
pub fn cell_names(database_dir: &Path) -> CoreResult<Vec<String>> {
    let entries = match fs::read_dir(database_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some(SEGMENT_EXT) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Checks that a database or cell name can be used as a file name.
pub fn validate_name(name: &str) -> CoreResult<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name is a relative path")
    } else if name.contains(['/', '\\', '\0']) {
        Some("name contains a path separator or NUL")
    } else if name == LOCK_FILE {
        Some("name is reserved")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(CoreError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Syncs a directory so that entries created, renamed or removed in it are
/// durable.
///
/// On Windows, directory fsync is not supported the same way; NTFS
/// journaling covers metadata, so the sync is skipped.
#[cfg(unix)]
pub(crate) fn sync_directory(path: &Path) -> CoreResult<()> {
    File::open(path)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn sync_directory(_path: &Path) -> CoreResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_directory() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("new_store");

        let dir = StoreDir::open(&root, true).unwrap();
        assert!(root.is_dir());
        assert!(root.join(LOCK_FILE).exists());
        assert_eq!(dir.path(), root);
    }

    #[test]
    fn open_fails_if_not_exists_and_no_create() {
        let temp = tempdir().unwrap();
        let result = StoreDir::open(&temp.path().join("nonexistent"), false);
        assert!(matches!(result, Err(CoreError::InvalidFormat { .. })));
    }

    #[test]
    fn lock_prevents_second_open() {
        let temp = tempdir().unwrap();
        let _dir = StoreDir::open(temp.path(), true).unwrap();

        let result = StoreDir::open(temp.path(), true);
        assert!(matches!(result, Err(CoreError::StoreLocked)));
    }

    #[test]
    fn lock_released_on_drop() {
        let temp = tempdir().unwrap();
        {
            let _dir = StoreDir::open(temp.path(), true).unwrap();
        }
        let _dir = StoreDir::open(temp.path(), true).unwrap();
    }

    #[test]
    fn lists_databases_and_cells() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::open(temp.path(), true).unwrap();

        let zika = dir.database_path("zika");
        fs::create_dir_all(&zika).unwrap();
        fs::create_dir_all(dir.database_path("flu")).unwrap();
        fs::write(zika.join("survey.seg"), b"").unwrap();
        fs::write(zika.join("survey.idx"), b"[]").unwrap();
        fs::write(zika.join("ncbi.seg"), b"").unwrap();

        assert_eq!(dir.database_names().unwrap(), ["flu", "zika"]);
        assert_eq!(cell_names(&zika).unwrap(), ["ncbi", "survey"]);
        assert!(cell_names(&dir.database_path("absent")).unwrap().is_empty());
    }

    #[test]
    fn removing_missing_targets_succeeds() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::open(temp.path(), true).unwrap();

        assert!(!dir.remove_database("absent").unwrap());
        CellFiles::new(&dir.database_path("absent"), "cell").remove().unwrap();
    }

    #[test]
    fn names_are_validated() {
        assert!(validate_name("zika").is_ok());
        assert!(validate_name("survey.2016").is_ok());
        for bad in ["", ".", "..", "a/b", "a\\b", "LOCK"] {
            assert!(
                matches!(validate_name(bad), Err(CoreError::InvalidName { .. })),
                "{bad:?}"
            );
        }
    }
}
