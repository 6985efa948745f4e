//! Commit command implementation.

use super::{find_cell, CommandResult};
use std::path::Path;
use zoo_core::Client;
use zoo_sync::{parse_ksizes, SyncConfig, Synchronizer};

/// Runs the commit command.
///
/// `ksize` is a comma separated list of k-mer sizes; `n` is the number of
/// hashes kept per signature.
pub fn run(
    client: &Client,
    db: &str,
    cell: &str,
    ksize: &str,
    n: usize,
    prefix: &Path,
) -> CommandResult {
    println!("Dumping data cell.");
    let config = SyncConfig::new()
        .with_ksizes(parse_ksizes(ksize)?)
        .with_num(n);
    let sync = Synchronizer::new(config)?;
    let Some(cell) = find_cell(client, db, cell)? else {
        return Ok(());
    };

    let report = sync.commit(&cell, prefix)?;
    println!("{report}");
    println!("Done.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use zoo_testkit::{scenarios, TestClient, TEST_CELL, TEST_DATABASE};

    #[test]
    fn test_commit_writes_both_files() {
        let test_client = scenarios::populated_client(3);
        let temp = tempdir().unwrap();
        let prefix = temp.path().join("survey");

        run(&test_client, TEST_DATABASE, TEST_CELL, "21", 50, &prefix).unwrap();

        assert!(temp.path().join("survey.json").is_file());
        assert!(temp.path().join("survey.zoo").is_file());
    }

    #[test]
    fn test_commit_of_absent_cell_writes_nothing() {
        let test_client = TestClient::file();
        let temp = tempdir().unwrap();
        let prefix = temp.path().join("typo");

        run(&test_client, TEST_DATABASE, "typo", "21", 50, &prefix).unwrap();

        assert!(!temp.path().join("typo.json").exists());
        let db = test_client.database(TEST_DATABASE).unwrap();
        assert!(db.cell_names().unwrap().is_empty());
    }

    #[test]
    fn test_commit_rejects_bad_ksize() {
        let test_client = scenarios::populated_client(1);
        let temp = tempdir().unwrap();
        let prefix = temp.path().join("survey");

        assert!(run(&test_client, TEST_DATABASE, TEST_CELL, "16,x", 50, &prefix).is_err());
        assert!(!temp.path().join("survey.json").exists());
    }
}
