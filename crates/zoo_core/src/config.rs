//! Store configuration.

use crate::segment::CompactionConfig;

/// Configuration for opening a [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the store root if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to fsync the segment after every write (safer but slower).
    ///
    /// Writes are always flushed to the OS; this adds a disk sync.
    pub sync_on_write: bool,

    /// When cells reclaim superseded record versions.
    pub compaction: CompactionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_write: false,
            compaction: CompactionConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store root if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to sync segments on every write.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets the compaction thresholds.
    #[must_use]
    pub const fn compaction(mut self, value: CompactionConfig) -> Self {
        self.compaction = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.create_if_missing);
        assert!(!config.sync_on_write);
        assert_eq!(config.compaction, CompactionConfig::default());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .create_if_missing(false)
            .sync_on_write(true)
            .compaction(CompactionConfig::disabled());
        assert!(!config.create_if_missing);
        assert!(config.sync_on_write);
        assert_eq!(config.compaction, CompactionConfig::disabled());
    }
}
