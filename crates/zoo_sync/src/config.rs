//! Configuration for cell synchronization.

use crate::error::{SyncError, SyncResult};
use zoo_codec::{DIGEST_KEY, ID_KEY, LEGACY_DIGEST_KEY};

/// Default k-mer sizes of commit signatures.
pub const DEFAULT_KSIZES: [usize; 2] = [16, 31];

/// Default number of hashes kept per signature.
pub const DEFAULT_NUM_HASHES: usize = 1000;

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Dotted path judging duplicates during `add`.
    pub primkey: String,
    /// k-mer sizes, one signature each.
    pub ksizes: Vec<usize>,
    /// Hashes kept per signature.
    pub num: usize,
    /// Field holding the DNA sequence fed to signatures.
    pub sequence_field: String,
    /// Key `commit` writes the digest under (`digest`, or legacy `md5`).
    pub digest_field: String,
}

impl SyncConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            primkey: ID_KEY.to_string(),
            ksizes: DEFAULT_KSIZES.to_vec(),
            num: DEFAULT_NUM_HASHES,
            sequence_field: "sequence".to_string(),
            digest_field: DIGEST_KEY.to_string(),
        }
    }

    /// Sets the primary key path.
    pub fn with_primkey(mut self, primkey: impl Into<String>) -> Self {
        self.primkey = primkey.into();
        self
    }

    /// Sets the k-mer sizes.
    pub fn with_ksizes(mut self, ksizes: Vec<usize>) -> Self {
        self.ksizes = ksizes;
        self
    }

    /// Sets the number of hashes per signature.
    pub fn with_num(mut self, num: usize) -> Self {
        self.num = num;
        self
    }

    /// Sets the sequence field.
    pub fn with_sequence_field(mut self, field: impl Into<String>) -> Self {
        self.sequence_field = field.into();
        self
    }

    /// Sets the digest key written by `commit`.
    pub fn with_digest_field(mut self, field: impl Into<String>) -> Self {
        self.digest_field = field.into();
        self
    }

    /// Checks the configuration for values no operation can work with.
    pub fn validate(&self) -> SyncResult<()> {
        if self.primkey.is_empty() {
            return Err(SyncError::InvalidConfig("primary key path is empty".into()));
        }
        if self.ksizes.is_empty() || self.ksizes.contains(&0) {
            return Err(SyncError::InvalidConfig(
                "k-mer sizes must be a non-empty list of positive sizes".into(),
            ));
        }
        if self.num == 0 {
            return Err(SyncError::InvalidConfig(
                "signatures must keep at least one hash".into(),
            ));
        }
        if self.digest_field != DIGEST_KEY && self.digest_field != LEGACY_DIGEST_KEY {
            return Err(SyncError::InvalidConfig(format!(
                "digest field must be {DIGEST_KEY:?} or {LEGACY_DIGEST_KEY:?}, not {:?}",
                self.digest_field
            )));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a comma separated list of k-mer sizes such as `16,31`.
pub fn parse_ksizes(list: &str) -> SyncResult<Vec<usize>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| SyncError::InvalidConfig(format!("invalid k-mer size {s:?}")))
        })
        .collect()
}
