//! In-memory sources with optional simulated latency and failures.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use crate::models::RawEntry;
use crate::source::{page, FileEnumerator, FolderSummary, PagedQuery, SourceError};

/// Folder listings held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFiles {
    folders: HashMap<PathBuf, Arc<Vec<RawEntry>>>,
    latency: Duration,
    fail_from: Option<usize>,
    fetches: Arc<AtomicUsize>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folder(mut self, folder: impl Into<PathBuf>, entries: Vec<RawEntry>) -> Self {
        self.folders.insert(folder.into(), Arc::new(entries));
        self
    }

    /// Delay applied to every fetch and summary.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fetches at or past `offset` fail as if the folder vanished.
    pub fn failing_from(mut self, offset: usize) -> Self {
        self.fail_from = Some(offset);
        self
    }

    /// Number of batch fetches issued across all queries built here.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileEnumerator for MemoryFiles {
    fn supported_children(&self, folder: &Path) -> Arc<dyn PagedQuery> {
        Arc::new(MemoryQuery {
            label: folder.display().to_string(),
            entries: self.folders.get(folder).cloned(),
            latency: self.latency,
            fail_from: self.fail_from,
            fetches: Arc::clone(&self.fetches),
        })
    }

    async fn folder_summary(&self, folder: &Path) -> Result<FolderSummary, SourceError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let entries = self
            .folders
            .get(folder)
            .ok_or_else(|| SourceError::missing(folder))?;
        let folders = entries.iter().filter(|e| e.is_folder()).count();
        Ok(FolderSummary {
            folders,
            files: entries.len() - folders,
        })
    }
}

/// A fixed list of entries served in pages.
#[derive(Debug, Clone)]
pub struct MemoryQuery {
    label: String,
    entries: Option<Arc<Vec<RawEntry>>>,
    latency: Duration,
    fail_from: Option<usize>,
    fetches: Arc<AtomicUsize>,
}

impl MemoryQuery {
    pub fn new(label: impl Into<String>, entries: Vec<RawEntry>) -> Self {
        Self {
            label: label.into(),
            entries: Some(Arc::new(entries)),
            latency: Duration::ZERO,
            fail_from: None,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PagedQuery for MemoryQuery {
    async fn fetch(&self, offset: usize, count: usize) -> Result<Vec<RawEntry>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        trace!(label = %self.label, offset, count, "Memory fetch");
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.fail_from.is_some_and(|limit| offset >= limit) {
            return Err(SourceError::missing(&self.label));
        }
        match &self.entries {
            Some(entries) => Ok(page(entries, offset, count)),
            None => Err(SourceError::missing(&self.label)),
        }
    }

    fn describe(&self) -> String {
        format!("memory {}", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_folder_is_unavailable() {
        let files = MemoryFiles::new();
        let query = files.supported_children(Path::new("/nowhere"));
        assert!(query.fetch(0, 30).await.is_err());
        assert_eq!(files.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_from_offset() {
        let entries = (0..10).map(|i| RawEntry::file(format!("/f/{i}.mp3"))).collect();
        let files = MemoryFiles::new().with_folder("/f", entries).failing_from(4);
        let query = files.supported_children(Path::new("/f"));

        assert_eq!(query.fetch(0, 4).await.unwrap().len(), 4);
        assert!(query.fetch(4, 4).await.is_err());
    }
}
