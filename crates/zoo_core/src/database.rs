//! Databases: named groups of cells.

use crate::cell::Cell;
use crate::config::Config;
use crate::dir::{self, CellFiles};
use crate::error::CoreResult;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use zoo_storage::{FileBackend, InMemoryBackend, StorageBackend};

/// Handle to a database.
///
/// Cells are created implicitly the first time they are opened. Handles
/// are cheap to clone; clones share open cells.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    name: String,
    /// Database directory. None for in-memory stores.
    path: Option<PathBuf>,
    config: Config,
    cells: Mutex<HashMap<String, Cell>>,
}

impl Database {
    pub(crate) fn new(name: &str, path: Option<PathBuf>, config: Config) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                name: name.to_string(),
                path,
                config,
                cells: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Returns the database name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Opens a cell, creating it if it doesn't exist.
    ///
    /// # Errors
    ///
    /// `InvalidName` if `name` cannot be used as a file name; store errors
    /// if the cell's segment cannot be opened or is corrupt.
    pub fn cell(&self, name: &str) -> CoreResult<Cell> {
        dir::validate_name(name)?;

        let mut cells = self.inner.cells.lock();
        if let Some(cell) = cells.get(name) {
            if !cell.is_dropped() {
                return Ok(cell.clone());
            }
        }

        let (backend, files): (Box<dyn StorageBackend>, _) = match &self.inner.path {
            Some(path) => {
                let files = CellFiles::new(path, name);
                let backend = FileBackend::open_with_create_dirs(&files.segment)?;
                (Box::new(backend), Some(files))
            }
            None => (Box::new(InMemoryBackend::new()), None),
        };

        let cell = Cell::open(
            &self.inner.name,
            name,
            backend,
            files,
            self.inner.config.sync_on_write,
            self.inner.config.compaction,
        )?;
        cells.insert(name.to_string(), cell.clone());
        Ok(cell)
    }

    /// Opens a cell only if it already exists. Never creates files.
    ///
    /// # Errors
    ///
    /// `InvalidName` for an unusable name; store errors if an existing
    /// cell's segment cannot be opened or is corrupt.
    pub fn existing_cell(&self, name: &str) -> CoreResult<Option<Cell>> {
        dir::validate_name(name)?;

        if let Some(cell) = self.inner.cells.lock().get(name) {
            if !cell.is_dropped() {
                return Ok(Some(cell.clone()));
            }
        }
        match &self.inner.path {
            Some(path) if CellFiles::new(path, name).segment.exists() => self.cell(name).map(Some),
            _ => Ok(None),
        }
    }

    /// Lists the cells of this database, sorted.
    pub fn cell_names(&self) -> CoreResult<Vec<String>> {
        match &self.inner.path {
            Some(path) => dir::cell_names(path),
            None => {
                let cells = self.inner.cells.lock();
                let mut names: Vec<String> = cells
                    .iter()
                    .filter(|(_, cell)| !cell.is_dropped())
                    .map(|(name, _)| name.clone())
                    .collect();
                names.sort();
                Ok(names)
            }
        }
    }

    /// Drops a cell. Returns false when it did not exist.
    pub fn drop_cell(&self, name: &str) -> CoreResult<bool> {
        dir::validate_name(name)?;

        let cached = self.inner.cells.lock().remove(name);
        let mut existed = false;
        if let Some(cell) = cached {
            existed = !cell.is_dropped();
            cell.drop()?;
        }
        if let Some(path) = &self.inner.path {
            let files = CellFiles::new(path, name);
            existed |= files.segment.exists();
            files.remove()?;
        }
        Ok(existed)
    }

    /// Marks every open cell dropped. Their files are removed by the caller.
    pub(crate) fn invalidate(&self) -> CoreResult<()> {
        let cells: Vec<Cell> = self.inner.cells.lock().drain().map(|(_, cell)| cell).collect();
        for cell in cells {
            cell.drop()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.inner.name)
            .field("path", &self.inner.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use tempfile::tempdir;
    use zoo_codec::Value;

    fn in_memory() -> Database {
        Database::new("zika", None, Config::default())
    }

    #[test]
    fn cells_are_created_on_first_access() {
        let db = in_memory();
        assert!(db.cell_names().unwrap().is_empty());

        let cell = db.cell("survey").unwrap();
        cell.insert(Value::map([("a", Value::from(1))])).unwrap();

        assert_eq!(db.cell_names().unwrap(), ["survey"]);
        assert_eq!(db.cell("survey").unwrap().count().unwrap(), 1);
    }

    #[test]
    fn drop_cell_is_idempotent() {
        let db = in_memory();
        let cell = db.cell("survey").unwrap();

        assert!(db.drop_cell("survey").unwrap());
        assert!(!db.drop_cell("survey").unwrap());
        assert!(!db.drop_cell("never").unwrap());
        assert!(cell.is_dropped());
        assert!(db.cell_names().unwrap().is_empty());

        assert_eq!(db.cell("survey").unwrap().count().unwrap(), 0);
    }

    #[test]
    fn existing_cell_never_creates() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("zika");
        let db = Database::new("zika", Some(path.clone()), Config::default());

        assert!(db.existing_cell("typo").unwrap().is_none());
        assert!(!path.join("typo.seg").exists());
        assert!(db.cell_names().unwrap().is_empty());

        db.cell("survey")
            .unwrap()
            .insert(Value::map([("a", Value::from(1))]))
            .unwrap();
        drop(db);
        let reopened = Database::new("zika", Some(path), Config::default());
        let cell = reopened.existing_cell("survey").unwrap().unwrap();
        assert_eq!(cell.count().unwrap(), 1);

        let memory = in_memory();
        assert!(memory.existing_cell("survey").unwrap().is_none());
        memory.cell("survey").unwrap();
        assert!(memory.existing_cell("survey").unwrap().is_some());
        memory.drop_cell("survey").unwrap();
        assert!(memory.existing_cell("survey").unwrap().is_none());
        assert!(matches!(memory.existing_cell("a/b"), Err(CoreError::InvalidName { .. })));
    }

    #[test]
    fn invalid_cell_names_are_rejected() {
        let db = in_memory();
        assert!(matches!(db.cell("a/b"), Err(CoreError::InvalidName { .. })));
        assert!(matches!(db.cell(""), Err(CoreError::InvalidName { .. })));
    }

    #[test]
    fn file_backed_cells_live_in_the_database_directory() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("zika");
        let db = Database::new("zika", Some(path.clone()), Config::default());

        db.cell("survey").unwrap();
        db.cell("ncbi").unwrap();
        assert!(path.join("survey.seg").exists());
        assert_eq!(db.cell_names().unwrap(), ["ncbi", "survey"]);

        assert!(db.drop_cell("survey").unwrap());
        assert!(!path.join("survey.seg").exists());
        assert_eq!(db.cell_names().unwrap(), ["ncbi"]);
    }
}
