//! Store client.

use crate::config::Config;
use crate::database::Database;
use crate::dir::{self, StoreDir};
use crate::error::CoreResult;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;

/// Entry point to a store.
///
/// A file-backed client holds the store's `LOCK` until it is dropped, so
/// one process at a time can use a store root.
///
/// ```rust,ignore
/// use zoo_core::{Client, Config};
///
/// let client = Client::open("zoo-data", Config::default())?;
/// let cell = client.database("zika")?.cell("survey")?;
/// println!("{} records", cell.count()?);
/// ```
pub struct Client {
    /// Store root (holds the lock). None for in-memory stores.
    dir: Option<StoreDir>,
    config: Config,
    databases: Mutex<HashMap<String, Database>>,
}

impl Client {
    /// Opens a file-backed store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The root doesn't exist and `create_if_missing` is false
    /// - Another process holds the lock (`StoreLocked`)
    /// - I/O errors occur
    pub fn open(root: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let dir = StoreDir::open(root.as_ref(), config.create_if_missing)?;
        tracing::debug!(root = %dir.path().display(), "opened store");
        Ok(Self {
            dir: Some(dir),
            config,
            databases: Mutex::new(HashMap::new()),
        })
    }

    /// Creates a store that lives only as long as the client.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            config: Config::default(),
            databases: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the store root, or `None` for in-memory stores.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.dir.as_ref().map(StoreDir::path)
    }

    /// Returns the store configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a handle to a database; nothing is created until a cell is.
    pub fn database(&self, name: &str) -> CoreResult<Database> {
        dir::validate_name(name)?;
        let mut databases = self.databases.lock();
        let db = databases.entry(name.to_string()).or_insert_with(|| {
            let path = self.dir.as_ref().map(|dir| dir.database_path(name));
            Database::new(name, path, self.config.clone())
        });
        Ok(db.clone())
    }

    /// Lists databases holding at least one cell, sorted.
    pub fn database_names(&self) -> CoreResult<Vec<String>> {
        if let Some(dir) = &self.dir {
            return dir.database_names();
        }

        let databases: Vec<Database> = self.databases.lock().values().cloned().collect();
        let mut names = Vec::new();
        for db in databases {
            if !db.cell_names()?.is_empty() {
                names.push(db.name().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Drops a database and every cell in it. Returns false when it did
    /// not exist.
    pub fn drop_database(&self, name: &str) -> CoreResult<bool> {
        dir::validate_name(name)?;

        let cached = self.databases.lock().remove(name);
        let mut existed = false;
        if let Some(db) = cached {
            existed = !db.cell_names()?.is_empty();
            db.invalidate()?;
        }
        if let Some(dir) = &self.dir {
            existed |= dir.remove_database(name)?;
        }

        tracing::info!(database = name, existed, "dropped database");
        Ok(existed)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("root", &self.root())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use tempfile::tempdir;
    use zoo_codec::Value;

    #[test]
    fn in_memory_databases() {
        let client = Client::in_memory();
        assert!(client.root().is_none());
        assert!(client.database_names().unwrap().is_empty());

        client.database("zika").unwrap().cell("survey").unwrap();
        client.database("flu").unwrap();
        assert_eq!(client.database_names().unwrap(), ["zika"]);
    }

    #[test]
    fn database_handles_share_cells() {
        let client = Client::in_memory();
        let cell = client.database("zika").unwrap().cell("survey").unwrap();
        cell.insert(Value::map([("a", Value::from(1))])).unwrap();

        let again = client.database("zika").unwrap().cell("survey").unwrap();
        assert_eq!(again.count().unwrap(), 1);
    }

    #[test]
    fn drop_database_invalidates_cells() {
        let client = Client::in_memory();
        let cell = client.database("zika").unwrap().cell("survey").unwrap();

        assert!(client.drop_database("zika").unwrap());
        assert!(!client.drop_database("zika").unwrap());
        assert!(cell.is_dropped());
        assert!(client.database_names().unwrap().is_empty());
    }

    #[test]
    fn second_client_on_same_root_is_locked_out() {
        let temp = tempdir().unwrap();
        let _client = Client::open(temp.path(), Config::default()).unwrap();
        assert!(matches!(
            Client::open(temp.path(), Config::default()),
            Err(CoreError::StoreLocked)
        ));
    }

    #[test]
    fn file_backed_drop_database_removes_directory() {
        let temp = tempdir().unwrap();
        let client = Client::open(temp.path(), Config::default()).unwrap();
        client.database("zika").unwrap().cell("survey").unwrap();
        assert!(temp.path().join("zika").is_dir());

        assert!(client.drop_database("zika").unwrap());
        assert!(!temp.path().join("zika").exists());
        assert!(!client.drop_database("never").unwrap());
    }
}
