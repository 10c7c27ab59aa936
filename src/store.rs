//! File-backed resource collections.
//!
//! Each resource is one pretty-printed JSON array at `{data_dir}/{name}.json`.
//! Collections are always read and written whole.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{LoadError, StoreError};
use crate::loader::load_json;
use crate::types::{collection_file_name, is_valid_resource_name, Collection};

/// Reads and writes whole resource collections under a data directory.
#[derive(Debug, Clone)]
pub struct ResourceStore {
    data_dir: PathBuf,
}

impl ResourceStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path of the collection document for `resource`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidResourceName` if the name is not a safe file name.
    pub fn path_for(&self, resource: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_resource_name(resource) {
            return Err(StoreError::InvalidResourceName {
                name: resource.to_string(),
            });
        }
        Ok(self.data_dir.join(collection_file_name(resource)))
    }

    /// Returns true if a collection document exists for `resource`.
    pub fn exists(&self, resource: &str) -> bool {
        self.path_for(resource)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Load the full collection for `resource`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no document exists, `StoreError::Load`
    /// if it cannot be read or parsed, or `StoreError::NotACollection` if the
    /// document is not a JSON array.
    pub fn read(&self, resource: &str) -> Result<Collection, StoreError> {
        let path = self.path_for(resource)?;
        let doc = load_json(&path).map_err(|e| match e {
            LoadError::FileNotFound { .. } => StoreError::NotFound {
                resource: resource.to_string(),
            },
            other => StoreError::Load(other),
        })?;

        match doc {
            serde_json::Value::Array(items) => {
                tracing::debug!(resource, records = items.len(), "read collection");
                Ok(items)
            }
            _ => Err(StoreError::NotACollection {
                resource: resource.to_string(),
            }),
        }
    }

    /// Replace the collection for `resource`.
    ///
    /// The new content is written to a synced temporary file next to the target
    /// and renamed over it, then the directory is synced. Readers see either the
    /// old or the new collection, and a crash before the rename leaves the old one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteError` if the data directory is not writable.
    pub fn write(&self, resource: &str, collection: &[serde_json::Value]) -> Result<(), StoreError> {
        let path = self.path_for(resource)?;
        let json = serde_json::to_string_pretty(collection).map_err(|source| {
            StoreError::Serialize {
                resource: resource.to_string(),
                source,
            }
        })?;

        let write_err = |source: std::io::Error| StoreError::WriteError {
            path: path.clone(),
            source,
        };

        let tmp = self.stage(&json).map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;
        fsync_dir(&self.data_dir).map_err(write_err)?;

        tracing::debug!(resource, records = collection.len(), "wrote collection");
        Ok(())
    }

    /// Write `json` to a synced temporary file in the data directory.
    ///
    /// The file is removed if it is dropped without being persisted.
    fn stage(&self, json: &str) -> std::io::Result<NamedTempFile> {
        let mut tmp = NamedTempFile::new_in(&self.data_dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        Ok(tmp)
    }
}

/// Sync a directory so a rename inside it survives a crash.
#[cfg(unix)]
fn fsync_dir(path: &Path) -> std::io::Result<()> {
    std::fs::OpenOptions::new().read(true).open(path)?.sync_all()
}

#[cfg(not(unix))]
fn fsync_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, ResourceStore) {
        let dir = TempDir::new().unwrap();
        let store = ResourceStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn read_missing_resource_is_not_found() {
        let (_dir, store) = store();
        let result = store.read("books");
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn write_then_read_round_trips() {
        let (_dir, store) = store();
        let books = vec![
            json!({"_id": "2", "title": "Emma", "tags": ["classic"]}),
            json!({"_id": "1", "title": "Dune", "pages": 412}),
        ];

        store.write("books", &books).unwrap();
        assert_eq!(store.read("books").unwrap(), books);
    }

    #[test]
    fn write_is_pretty_printed() {
        let (dir, store) = store();
        store.write("books", &[json!({"_id": "1"})]).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("books.json")).unwrap();
        assert_eq!(raw, "[\n  {\n    \"_id\": \"1\"\n  }\n]");
    }

    #[test]
    fn write_replaces_prior_content() {
        let (_dir, store) = store();
        store.write("books", &[json!({"_id": "1"}), json!({"_id": "2"})]).unwrap();
        store.write("books", &[json!({"_id": "3"})]).unwrap();

        assert_eq!(store.read("books").unwrap(), vec![json!({"_id": "3"})]);
    }

    #[test]
    fn write_leaves_no_temporary_files() {
        let (dir, store) = store();
        store.write("books", &[]).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn read_invalid_json_is_load_error() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("books.json"), "[{").unwrap();

        let result = store.read("books");
        assert!(matches!(
            result,
            Err(StoreError::Load(LoadError::InvalidJson { .. }))
        ));
    }

    #[test]
    fn read_non_array_is_rejected() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("books.json"), r#"{"_id": "1"}"#).unwrap();

        let result = store.read("books");
        assert!(matches!(result, Err(StoreError::NotACollection { .. })));
    }

    #[test]
    fn unsafe_names_never_touch_disk() {
        let (_dir, store) = store();
        assert!(matches!(
            store.read("../etc/passwd"),
            Err(StoreError::InvalidResourceName { .. })
        ));
        assert!(matches!(
            store.write("..", &[]),
            Err(StoreError::InvalidResourceName { .. })
        ));
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let store = ResourceStore::new("/nonexistent/mock/dir");
        let result = store.write("books", &[]);
        assert!(matches!(result, Err(StoreError::WriteError { .. })));
    }

    #[test]
    fn unfinished_write_keeps_prior_collection() {
        let (dir, store) = store();
        let prior = vec![json!({"_id": "1", "title": "Dune"})];
        store.write("books", &prior).unwrap();

        let staged = store.stage("[]").unwrap();
        drop(staged);

        assert_eq!(store.read("books").unwrap(), prior);
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn failed_rename_is_write_error_and_leaves_no_temporary_file() {
        let (dir, store) = store();
        let authors = vec![json!({"_id": "a1"})];
        store.write("authors", &authors).unwrap();

        let blocker = dir.path().join("books.json");
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), "x").unwrap();

        let result = store.write("books", &[json!({"_id": "1"})]);
        assert!(matches!(result, Err(StoreError::WriteError { .. })));

        assert_eq!(store.read("authors").unwrap(), authors);
        let mut names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec!["authors.json", "books.json"]);
    }

    #[test]
    fn exists_tracks_first_write() {
        let (_dir, store) = store();
        assert!(!store.exists("books"));
        store.write("books", &[]).unwrap();
        assert!(store.exists("books"));
    }
}
