//! Collaborators the loader pulls entries from.
//!
//! - `PagedQuery` - a source drained in `(offset, count)` batches
//! - `FileEnumerator` - builds folder queries and folder summaries
//! - `MediaResolver` - decides which files are playable
//!
//! `LocalFiles` and `MediaQuery` back these with the real file system,
//! `MemoryFiles` with in-memory listings.

pub mod local;
pub mod memory;
pub mod resolver;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{MediaHandle, RawEntry};

pub use local::{LocalFiles, MediaQuery};
pub use memory::{MemoryFiles, MemoryQuery};
pub use resolver::ExtensionResolver;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {path:?}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a directory: {0:?}")]
    NotADirectory(PathBuf),
    #[error("listing task failed: {0}")]
    TaskFailed(String),
}

impl SourceError {
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self::Unavailable {
            path: path.into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
    }
}

/// A paginated listing. An empty batch means the source is exhausted.
#[async_trait]
pub trait PagedQuery: Send + Sync {
    async fn fetch(&self, offset: usize, count: usize) -> Result<Vec<RawEntry>, SourceError>;

    /// Short human description for logs.
    fn describe(&self) -> String;
}

#[async_trait]
pub trait FileEnumerator: Send + Sync {
    /// Folders and supported media files directly inside `folder`.
    fn supported_children(&self, folder: &Path) -> Arc<dyn PagedQuery>;

    async fn folder_summary(&self, folder: &Path) -> Result<FolderSummary, SourceError>;
}

pub trait MediaResolver: Send + Sync {
    /// Returns a handle for playable media, `None` for anything else.
    fn classify(&self, entry: &RawEntry) -> Option<MediaHandle>;
}

/// Counts of the supported children of a folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub folders: usize,
    pub files: usize,
}

impl FolderSummary {
    pub fn total(&self) -> usize {
        self.folders + self.files
    }
}

/// Copies `entries[offset..offset + count]`, clamped to the slice.
pub(crate) fn page(entries: &[RawEntry], offset: usize, count: usize) -> Vec<RawEntry> {
    let start = offset.min(entries.len());
    let end = offset.saturating_add(count).min(entries.len());
    entries[start..end].to_vec()
}
