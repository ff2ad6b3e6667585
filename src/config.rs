//! Loader settings, read from `config.toml` in the XDG config directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use tracing::{debug, warn};

/// Entries requested per fetch.
pub const DEFAULT_BATCH_SIZE: usize = 30;

/// How long a load may run before the loading indicator is shown.
pub const DEFAULT_LOADING_DELAY_MS: u64 = 800;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub batch_size: usize,
    pub loading_delay_ms: u64,
    /// List dot-files and dot-folders.
    pub show_hidden: bool,
    /// Depth limit for saved media queries (0 = unlimited).
    pub recursive_query_depth: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            loading_delay_ms: DEFAULT_LOADING_DELAY_MS,
            show_hidden: false,
            recursive_query_depth: 0,
        }
    }
}

impl LoaderConfig {
    /// Loads from the default location, falling back to defaults when the
    /// file is missing or invalid.
    pub fn load() -> Self {
        let path = match Self::default_path() {
            Some(path) => path,
            None => {
                debug!("No config directory available, using defaults");
                return Self::default();
            }
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config {:?}: {:#}", path, e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config.normalized())
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "folderview").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn loading_delay(&self) -> Duration {
        Duration::from_millis(self.loading_delay_ms)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        self.batch_size = self.batch_size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = LoaderConfig::default();
        assert_eq!(config.batch_size, 30);
        assert_eq!(config.loading_delay(), Duration::from_millis(800));
        assert!(!config.show_hidden);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "batch_size = 0\nshow_hidden = true\n").unwrap();

        let config = LoaderConfig::load_from(&path).unwrap();
        assert_eq!(config.batch_size, 1);
        assert!(config.show_hidden);
        assert_eq!(config.loading_delay_ms, 800);
    }

    #[test]
    fn test_load_invalid_file_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "batch_size = \"lots\"").unwrap();

        assert!(LoaderConfig::load_from(&path).is_err());
    }
}
