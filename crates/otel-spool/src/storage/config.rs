//! Storage configuration value object.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default upper size bound per buffer file (1 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Default ceiling on how long a spooled file stays readable (18 hours).
/// Files older than this are stale and deleted unread.
pub const DEFAULT_MAX_FILE_AGE_FOR_READ_MS: u64 = 18 * 60 * 60 * 1000;

/// Errors from constructing a [`StorageConfig`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The write window must close strictly before the read window opens,
    /// so a reader can never observe a file mid-append.
    #[error(
        "max write age {max_file_age_for_write_ms} ms must be strictly less than \
         min read age {min_file_age_for_read_ms} ms"
    )]
    InvalidAgeWindow {
        max_file_age_for_write_ms: u64,
        min_file_age_for_read_ms: u64,
    },

    /// The read window would be empty.
    #[error(
        "min read age {min_file_age_for_read_ms} ms must be less than \
         max read age {max_file_age_for_read_ms} ms"
    )]
    InvalidReadWindow {
        min_file_age_for_read_ms: u64,
        max_file_age_for_read_ms: u64,
    },
}

/// Immutable configuration for one storage directory.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    root_dir: PathBuf,
    max_file_size: u64,
    max_file_age_for_write_ms: u64,
    min_file_age_for_read_ms: u64,
    max_file_age_for_read_ms: u64,
}

impl StorageConfig {
    /// Builds a configuration, enforcing `max_file_age_for_write_ms <
    /// min_file_age_for_read_ms` at construction.
    pub fn new(
        root_dir: impl Into<PathBuf>,
        max_file_size: u64,
        max_file_age_for_write_ms: u64,
        min_file_age_for_read_ms: u64,
    ) -> Result<Self, ConfigError> {
        if max_file_age_for_write_ms >= min_file_age_for_read_ms {
            return Err(ConfigError::InvalidAgeWindow {
                max_file_age_for_write_ms,
                min_file_age_for_read_ms,
            });
        }
        Ok(Self {
            root_dir: root_dir.into(),
            max_file_size,
            max_file_age_for_write_ms,
            min_file_age_for_read_ms,
            max_file_age_for_read_ms: DEFAULT_MAX_FILE_AGE_FOR_READ_MS,
        })
    }

    /// Overrides the stale-file ceiling; spooled files older than this are
    /// deleted instead of replayed.
    pub fn with_max_file_age_for_read_ms(mut self, value: u64) -> Result<Self, ConfigError> {
        if self.min_file_age_for_read_ms >= value {
            return Err(ConfigError::InvalidReadWindow {
                min_file_age_for_read_ms: self.min_file_age_for_read_ms,
                max_file_age_for_read_ms: value,
            });
        }
        self.max_file_age_for_read_ms = value;
        Ok(self)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn max_file_age_for_write_ms(&self) -> u64 {
        self.max_file_age_for_write_ms
    }

    pub fn min_file_age_for_read_ms(&self) -> u64 {
        self.min_file_age_for_read_ms
    }

    pub fn max_file_age_for_read_ms(&self) -> u64 {
        self.max_file_age_for_read_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_window_is_accepted() {
        let config = StorageConfig::new("/tmp/buf", DEFAULT_MAX_FILE_SIZE, 5_000, 6_000).unwrap();
        assert_eq!(config.max_file_age_for_write_ms(), 5_000);
        assert_eq!(config.min_file_age_for_read_ms(), 6_000);
    }

    #[test]
    fn write_window_reaching_into_read_window_is_rejected() {
        for (write_ms, read_ms) in [(6_000, 6_000), (7_000, 6_000)] {
            let err = StorageConfig::new("/tmp/buf", DEFAULT_MAX_FILE_SIZE, write_ms, read_ms)
                .unwrap_err();
            // The message quotes both offending values.
            let message = err.to_string();
            let ConfigError::InvalidAgeWindow {
                max_file_age_for_write_ms,
                min_file_age_for_read_ms,
            } = err
            else {
                panic!("unexpected error {err:?}");
            };
            assert_eq!(max_file_age_for_write_ms, write_ms);
            assert_eq!(min_file_age_for_read_ms, read_ms);
            assert!(message.contains(&write_ms.to_string()), "{message}");
            assert!(message.contains(&read_ms.to_string()), "{message}");
        }
    }

    #[test]
    fn empty_read_window_is_rejected() {
        let config = StorageConfig::new("/tmp/buf", DEFAULT_MAX_FILE_SIZE, 5_000, 6_000).unwrap();
        assert!(config.with_max_file_age_for_read_ms(6_000).is_err());
    }
}
