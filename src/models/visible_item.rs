use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::models::{MediaHandle, RawEntry};
use crate::source::{FileEnumerator, FolderSummary, MediaResolver};

/// One row of the listing: a raw entry adapted for display.
///
/// Clones share the caption cell, so a caption refreshed after the row was
/// appended is visible through every snapshot of it.
#[derive(Debug, Clone)]
pub struct VisibleItem {
    pub entry: RawEntry,
    /// Present iff the entry resolved to playable media.
    pub media: Option<MediaHandle>,
    /// Insertion index in the collection; rows are never reordered.
    pub position: usize,
    caption: Arc<RwLock<Option<String>>>,
}

impl VisibleItem {
    /// Adapts a raw entry. Folders are never classified; files the
    /// resolver rejects stay in the list as plain rows.
    pub fn adapt(entry: RawEntry, position: usize, resolver: &dyn MediaResolver) -> Self {
        let media = if entry.is_folder() {
            None
        } else {
            resolver.classify(&entry)
        };
        Self {
            entry,
            media,
            position,
            caption: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.entry.path
    }

    pub fn name(&self) -> String {
        self.entry.name()
    }

    pub fn is_folder(&self) -> bool {
        self.entry.is_folder()
    }

    pub fn is_playable(&self) -> bool {
        self.media.is_some()
    }

    pub fn caption(&self) -> Option<String> {
        self.caption.read().clone()
    }

    /// Recomputes the caption of a folder row from its contents.
    ///
    /// Safe to call repeatedly; the last completed refresh wins. A failed
    /// lookup leaves the caption as it was.
    pub async fn refresh_caption(&self, files: &dyn FileEnumerator) {
        if !self.is_folder() {
            return;
        }
        match files.folder_summary(self.path()).await {
            Ok(summary) => {
                *self.caption.write() = Some(summary.caption());
            }
            Err(e) => {
                debug!(path = ?self.path(), error = %e, "Caption refresh failed");
            }
        }
    }
}

impl FolderSummary {
    pub fn caption(&self) -> String {
        match self.total() {
            0 => "No items".to_string(),
            1 => "1 item".to_string(),
            n => format!("{} items", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ExtensionResolver, MemoryFiles};

    #[test]
    fn test_adapt_media_file() {
        let item = VisibleItem::adapt(RawEntry::file("/v/clip.mkv"), 0, &ExtensionResolver);
        assert!(item.is_playable());
        assert_eq!(item.media.as_ref().map(|m| m.path.as_path()), Some(item.path()));
    }

    #[test]
    fn test_adapt_unsupported_file_is_plain_row() {
        let item = VisibleItem::adapt(RawEntry::file("/v/notes.txt"), 3, &ExtensionResolver);
        assert!(!item.is_playable());
        assert_eq!(item.position, 3);
    }

    #[test]
    fn test_adapt_folder_is_never_media() {
        let item = VisibleItem::adapt(RawEntry::folder("/v/movie.mkv"), 0, &ExtensionResolver);
        assert!(item.media.is_none());
        assert!(item.is_folder());
    }

    #[test]
    fn test_caption_text() {
        assert_eq!(FolderSummary { folders: 0, files: 0 }.caption(), "No items");
        assert_eq!(FolderSummary { folders: 1, files: 0 }.caption(), "1 item");
        assert_eq!(FolderSummary { folders: 2, files: 3 }.caption(), "5 items");
    }

    #[tokio::test]
    async fn test_refresh_caption_is_shared_between_clones() {
        let files = MemoryFiles::new().with_folder(
            "/lib/a",
            vec![RawEntry::file("/lib/a/1.mp4"), RawEntry::file("/lib/a/2.mp4")],
        );
        let item = VisibleItem::adapt(RawEntry::folder("/lib/a"), 0, &ExtensionResolver);
        let snapshot = item.clone();

        item.refresh_caption(&files).await;
        item.refresh_caption(&files).await;

        assert_eq!(snapshot.caption().as_deref(), Some("2 items"));
    }

    #[tokio::test]
    async fn test_refresh_caption_failure_leaves_caption() {
        let before = MemoryFiles::new()
            .with_folder("/lib/gone", vec![RawEntry::file("/lib/gone/x.mp3")]);
        let after = MemoryFiles::new();
        let item = VisibleItem::adapt(RawEntry::folder("/lib/gone"), 0, &ExtensionResolver);

        item.refresh_caption(&before).await;
        item.refresh_caption(&after).await;

        assert_eq!(item.caption().as_deref(), Some("1 item"));
    }
}
