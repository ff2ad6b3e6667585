//! File-system backed sources.
//!
//! Listings are read once, on the first fetch, in a blocking task and then
//! served from the snapshot; a refresh builds a new query.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tokio::task;
use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

use crate::models::{MediaType, RawEntry};
use crate::source::{page, FileEnumerator, FolderSummary, PagedQuery, SourceError};

/// Enumerates folders on the local file system.
#[derive(Debug, Clone, Default)]
pub struct LocalFiles {
    show_hidden: bool,
}

impl LocalFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hidden(mut self, show_hidden: bool) -> Self {
        self.show_hidden = show_hidden;
        self
    }
}

#[async_trait]
impl FileEnumerator for LocalFiles {
    fn supported_children(&self, folder: &Path) -> Arc<dyn PagedQuery> {
        Arc::new(FolderQuery {
            folder: folder.to_path_buf(),
            show_hidden: self.show_hidden,
            snapshot: OnceCell::new(),
        })
    }

    async fn folder_summary(&self, folder: &Path) -> Result<FolderSummary, SourceError> {
        let folder = folder.to_path_buf();
        let show_hidden = self.show_hidden;
        let entries = task::spawn_blocking(move || list_children(&folder, show_hidden))
            .await
            .map_err(|e| SourceError::TaskFailed(e.to_string()))??;

        let folders = entries.iter().filter(|e| e.is_folder()).count();
        Ok(FolderSummary {
            folders,
            files: entries.len() - folders,
        })
    }
}

struct FolderQuery {
    folder: PathBuf,
    show_hidden: bool,
    snapshot: OnceCell<Vec<RawEntry>>,
}

#[async_trait]
impl PagedQuery for FolderQuery {
    async fn fetch(&self, offset: usize, count: usize) -> Result<Vec<RawEntry>, SourceError> {
        let entries = self
            .snapshot
            .get_or_try_init(|| {
                let folder = self.folder.clone();
                let show_hidden = self.show_hidden;
                async move {
                    task::spawn_blocking(move || list_children(&folder, show_hidden))
                        .await
                        .map_err(|e| SourceError::TaskFailed(e.to_string()))?
                }
            })
            .await?;
        Ok(page(entries, offset, count))
    }

    fn describe(&self) -> String {
        format!("folder {}", self.folder.display())
    }
}

/// A saved query: every file of one media type below a root, recursively.
pub struct MediaQuery {
    root: PathBuf,
    media_type: MediaType,
    max_depth: usize,
    show_hidden: bool,
    snapshot: OnceCell<Vec<RawEntry>>,
}

impl MediaQuery {
    pub fn new(root: impl Into<PathBuf>, media_type: MediaType) -> Self {
        Self {
            root: root.into(),
            media_type,
            max_depth: 0,
            show_hidden: false,
            snapshot: OnceCell::new(),
        }
    }

    /// Maximum directory depth (0 = unlimited).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_hidden(mut self, show_hidden: bool) -> Self {
        self.show_hidden = show_hidden;
        self
    }
}

#[async_trait]
impl PagedQuery for MediaQuery {
    async fn fetch(&self, offset: usize, count: usize) -> Result<Vec<RawEntry>, SourceError> {
        let entries = self
            .snapshot
            .get_or_try_init(|| {
                let root = self.root.clone();
                let media_type = self.media_type;
                let max_depth = self.max_depth;
                let show_hidden = self.show_hidden;
                async move {
                    task::spawn_blocking(move || {
                        discover_files(&root, media_type, max_depth, show_hidden)
                    })
                    .await
                    .map_err(|e| SourceError::TaskFailed(e.to_string()))?
                }
            })
            .await?;
        Ok(page(entries, offset, count))
    }

    fn describe(&self) -> String {
        format!("{:?} files under {}", self.media_type, self.root.display())
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn ensure_directory(path: &Path) -> Result<(), SourceError> {
    let metadata = std::fs::metadata(path).map_err(|source| SourceError::Unavailable {
        path: path.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(SourceError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

/// Lists the folders and supported media files directly inside `folder`,
/// folders first, each group ordered by name.
fn list_children(folder: &Path, show_hidden: bool) -> Result<Vec<RawEntry>, SourceError> {
    ensure_directory(folder)?;

    let mut folders = Vec::new();
    let mut files = Vec::new();

    let walker = WalkDir::new(folder).min_depth(1).max_depth(1);
    for entry in walker
        .into_iter()
        .filter_entry(|e| show_hidden || !is_hidden(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to read entry in {:?}: {}", folder, e);
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().is_dir() {
            folders.push(RawEntry::folder(path));
        } else if MediaType::from_path(path).is_some() {
            files.push(RawEntry::file(path));
        } else {
            trace!("Skipping unsupported file {:?}", path);
        }
    }

    let by_name = |a: &RawEntry, b: &RawEntry| a.name().to_lowercase().cmp(&b.name().to_lowercase());
    folders.sort_by(by_name);
    files.sort_by(by_name);

    debug!(
        "Listed {:?}: {} folders, {} files",
        folder,
        folders.len(),
        files.len()
    );
    folders.extend(files);
    Ok(folders)
}

/// Recursively discovers files of one media type, ordered by path.
fn discover_files(
    root: &Path,
    media_type: MediaType,
    max_depth: usize,
    show_hidden: bool,
) -> Result<Vec<RawEntry>, SourceError> {
    ensure_directory(root)?;

    let mut walker = WalkDir::new(root);
    if max_depth > 0 {
        walker = walker.max_depth(max_depth);
    }

    let mut entries: Vec<RawEntry> = walker
        .into_iter()
        .filter_entry(|e| show_hidden || !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| !e.file_type().is_dir())
        .filter(|e| MediaType::from_path(e.path()) == Some(media_type))
        .map(|e| RawEntry::file(e.path()))
        .collect();

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("Discovered {} {:?} files under {:?}", entries.len(), media_type, root);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    #[tokio::test]
    async fn test_folder_query_lists_folders_first() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("b.mp4"));
        touch(&dir.path().join("A.mp3"));
        touch(&dir.path().join("notes.txt"));
        fs::create_dir(dir.path().join("zeta")).unwrap();
        fs::create_dir(dir.path().join(".hidden")).unwrap();
        touch(&dir.path().join(".secret.mp4"));

        let query = LocalFiles::new().supported_children(dir.path());
        let entries = query.fetch(0, 30).await.unwrap();
        let names: Vec<String> = entries.iter().map(|e| e.name()).collect();

        assert_eq!(names, vec!["zeta", "A.mp3", "b.mp4"]);
        assert!(entries[0].is_folder());
    }

    #[tokio::test]
    async fn test_folder_query_pages() {
        let dir = tempdir().unwrap();
        for i in 0..5 {
            touch(&dir.path().join(format!("{i}.mkv")));
        }

        let query = LocalFiles::new().supported_children(dir.path());
        assert_eq!(query.fetch(0, 2).await.unwrap().len(), 2);
        assert_eq!(query.fetch(4, 2).await.unwrap().len(), 1);
        assert!(query.fetch(5, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_folder_query_shows_hidden_when_enabled() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join(".clip.mp4"));

        let query = LocalFiles::new()
            .with_hidden(true)
            .supported_children(dir.path());
        assert_eq!(query.fetch(0, 30).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_folder_is_unavailable() {
        let dir = tempdir().unwrap();
        let query = LocalFiles::new().supported_children(&dir.path().join("gone"));
        let err = query.fetch(0, 30).await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_folder_summary_counts_supported_children() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("a.mp3"));
        touch(&dir.path().join("b.txt"));

        let summary = LocalFiles::new().folder_summary(dir.path()).await.unwrap();
        assert_eq!(summary, FolderSummary { folders: 1, files: 1 });
    }

    #[tokio::test]
    async fn test_media_query_is_recursive_and_files_only() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("season1");
        fs::create_dir(&nested).unwrap();
        touch(&dir.path().join("intro.mp4"));
        touch(&nested.join("e01.mkv"));
        touch(&nested.join("theme.mp3"));

        let query = MediaQuery::new(dir.path(), MediaType::Video);
        let entries = query.fetch(0, 30).await.unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| !e.is_folder()));

        let shallow = MediaQuery::new(dir.path(), MediaType::Video).with_max_depth(1);
        assert_eq!(shallow.fetch(0, 30).await.unwrap().len(), 1);
    }
}
