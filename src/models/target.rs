use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::source::PagedQuery;

/// A named collection of root folders, e.g. "Videos" spanning several drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    pub name: String,
    pub folders: Vec<PathBuf>,
}

impl Library {
    pub fn new(name: impl Into<String>, folders: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            folders,
        }
    }
}

/// What the view was asked to display.
#[derive(Clone)]
pub enum NavigationTarget {
    Folder(PathBuf),
    /// Root-to-leaf trail; the last folder is the one listed.
    Breadcrumbs(Vec<PathBuf>),
    Library(Library),
    /// A pre-filtered file query; yields files only.
    Query(Arc<dyn PagedQuery>),
}

impl NavigationTarget {
    /// Returns `None` for an empty breadcrumb trail, which names no target.
    pub fn validated(self) -> Option<Self> {
        match self {
            Self::Breadcrumbs(ref trail) if trail.is_empty() => None,
            other => Some(other),
        }
    }
}

impl fmt::Debug for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Folder(path) => f.debug_tuple("Folder").field(path).finish(),
            Self::Breadcrumbs(trail) => f.debug_tuple("Breadcrumbs").field(trail).finish(),
            Self::Library(library) => f.debug_tuple("Library").field(&library.name).finish(),
            Self::Query(query) => f.debug_tuple("Query").field(&query.describe()).finish(),
        }
    }
}
