//! Reference image catalog and its cursor state machine.
//!
//! The catalog is loaded once at startup and never changes afterwards; the
//! only mutable state is the cursor, a single index stepped by the navigation
//! endpoints and snapshotted by each new streaming session.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use thiserror::Error;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Debug, Error)]
pub(crate) enum CatalogError {
    #[error("reference image folder {0:?} does not exist")]
    Missing(PathBuf),
    #[error("no reference images found in {0:?}")]
    Empty(PathBuf),
    #[error("failed to read reference image folder: {0}")]
    Io(#[from] std::io::Error),
}

/// One reference image: display name plus the on-disk handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ReferenceEntry {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
}

/// Consistent view of the cursor taken under the lock.
pub(crate) struct CursorSnapshot {
    pub(crate) index: usize,
    pub(crate) entry: ReferenceEntry,
}

pub(crate) struct ReferenceCatalog {
    entries: Vec<ReferenceEntry>,
    cursor: Mutex<usize>,
}

impl ReferenceCatalog {
    /// Scan `dir` for reference images, sorted by filename.
    ///
    /// A missing or empty folder is a fatal startup error, never a runtime
    /// condition.
    pub(crate) fn load(dir: &Path) -> Result<Self, CatalogError> {
        if !dir.is_dir() {
            return Err(CatalogError::Missing(dir.to_path_buf()));
        }

        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(dir)? {
            let path = dir_entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if !is_image {
                continue;
            }
            let name = match path.file_name().and_then(|name| name.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            entries.push(ReferenceEntry { name, path });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        if entries.is_empty() {
            return Err(CatalogError::Empty(dir.to_path_buf()));
        }
        Ok(Self::from_entries(entries))
    }

    /// Build a catalog from pre-collected entries.
    ///
    /// The cursor arithmetic relies on at least one entry existing; `load`
    /// rejects empty folders with `CatalogError::Empty` before getting here.
    pub(crate) fn from_entries(entries: Vec<ReferenceEntry>) -> Self {
        assert!(
            !entries.is_empty(),
            "reference catalog requires at least one entry"
        );
        Self {
            entries,
            cursor: Mutex::new(0),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Step the cursor forward; no-op at the last entry.
    pub(crate) fn advance(&self) -> CursorSnapshot {
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        *cursor = (*cursor + 1).min(self.entries.len() - 1);
        self.snapshot(*cursor)
    }

    /// Step the cursor backward; no-op at the first entry.
    pub(crate) fn retreat(&self) -> CursorSnapshot {
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        *cursor = cursor.saturating_sub(1);
        self.snapshot(*cursor)
    }

    /// Read the current selection without mutating the cursor.
    pub(crate) fn current(&self) -> CursorSnapshot {
        let cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        self.snapshot(*cursor)
    }

    fn snapshot(&self, index: usize) -> CursorSnapshot {
        CursorSnapshot {
            index,
            entry: self.entries[index].clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_of(names: &[&str]) -> ReferenceCatalog {
        ReferenceCatalog::from_entries(
            names
                .iter()
                .map(|name| ReferenceEntry {
                    name: name.to_string(),
                    path: PathBuf::from(format!("static/images/{name}")),
                })
                .collect(),
        )
    }

    #[test]
    fn starts_at_first_entry() {
        let catalog = catalog_of(&["img0.jpg", "img1.jpg", "img2.jpg"]);
        let snapshot = catalog.current();
        assert_eq!(snapshot.index, 0);
        assert_eq!(snapshot.entry.name, "img0.jpg");
    }

    #[test]
    fn advance_clamps_at_last_entry() {
        let catalog = catalog_of(&["img0.jpg", "img1.jpg", "img2.jpg"]);
        assert_eq!(catalog.advance().index, 1);
        assert_eq!(catalog.advance().index, 2);
        assert_eq!(catalog.advance().index, 2);
        assert_eq!(catalog.advance().entry.name, "img2.jpg");
    }

    #[test]
    fn retreat_clamps_at_first_entry() {
        let catalog = catalog_of(&["img0.jpg", "img1.jpg"]);
        assert_eq!(catalog.retreat().index, 0);
        catalog.advance();
        assert_eq!(catalog.retreat().index, 0);
    }

    #[test]
    fn single_entry_catalog_never_moves() {
        let catalog = catalog_of(&["img0.jpg"]);
        assert_eq!(catalog.retreat().index, 0);
        assert_eq!(catalog.advance().index, 0);
        assert_eq!(catalog.current().index, 0);
    }

    #[test]
    fn cursor_stays_in_range_under_any_command_sequence() {
        let catalog = catalog_of(&["a.jpg", "b.jpg", "c.jpg", "d.jpg"]);
        let commands = [1, 1, 1, 1, 1, -1, -1, -1, -1, -1, -1, 1, -1, 1, 1];
        for step in commands {
            let snapshot = if step > 0 {
                catalog.advance()
            } else {
                catalog.retreat()
            };
            assert!(snapshot.index < catalog.len());
        }
    }

    #[test]
    #[should_panic(expected = "at least one entry")]
    fn empty_catalog_is_rejected_at_construction() {
        ReferenceCatalog::from_entries(Vec::new());
    }

    #[test]
    fn load_rejects_missing_and_empty_folders() {
        let missing = PathBuf::from("/nonexistent/pose-mirror-test");
        assert!(matches!(
            ReferenceCatalog::load(&missing),
            Err(CatalogError::Missing(_))
        ));

        let empty = std::env::temp_dir().join(format!("pose-mirror-empty-{}", std::process::id()));
        fs::create_dir_all(&empty).unwrap();
        assert!(matches!(
            ReferenceCatalog::load(&empty),
            Err(CatalogError::Empty(_))
        ));
        let _ = fs::remove_dir_all(&empty);
    }

    #[test]
    fn load_sorts_entries_by_filename() {
        let dir = std::env::temp_dir().join(format!("pose-mirror-load-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for name in ["pose2.jpg", "pose0.png", "pose1.jpeg", "notes.txt"] {
            fs::write(dir.join(name), b"stub").unwrap();
        }

        let catalog = ReferenceCatalog::load(&dir).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.current().entry.name, "pose0.png");
        assert_eq!(catalog.advance().entry.name, "pose1.jpeg");
        assert_eq!(catalog.advance().entry.name, "pose2.jpg");

        let _ = fs::remove_dir_all(&dir);
    }
}
