use tracing::trace;

use crate::models::{MediaHandle, MediaType, RawEntry};
use crate::source::MediaResolver;

/// Classifies files by extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionResolver;

impl MediaResolver for ExtensionResolver {
    fn classify(&self, entry: &RawEntry) -> Option<MediaHandle> {
        if entry.is_folder() {
            return None;
        }
        match MediaType::from_path(&entry.path) {
            Some(media_type) if media_type.is_playable() => {
                Some(MediaHandle::new(entry.path.clone(), media_type))
            }
            _ => {
                trace!(path = ?entry.path, "Not playable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_playable() {
        let handle = ExtensionResolver.classify(&RawEntry::file("/a/song.FLAC")).unwrap();
        assert!(handle.is_audio());
        let handle = ExtensionResolver.classify(&RawEntry::file("/a/movie.mp4")).unwrap();
        assert!(handle.is_video());
    }

    #[test]
    fn test_classify_rejects_images_and_unknown() {
        assert!(ExtensionResolver.classify(&RawEntry::file("/a/cover.jpg")).is_none());
        assert!(ExtensionResolver.classify(&RawEntry::file("/a/readme")).is_none());
        assert!(ExtensionResolver.classify(&RawEntry::folder("/a/b.mp4")).is_none());
    }
}
