//! Local blob backend.
//!
//! # Responsibility
//! - Keep every collection as a field of one JSON object stored under the
//!   `routina_app_data` namespace key.
//! - Abstract the durable slot so the same layout works on disk and in memory.
//!
//! # Invariants
//! - Never surfaces an error: read failures and malformed blobs read as empty,
//!   write failures are logged and dropped.
//! - A `set` rewrites the whole blob; other collections are preserved.

use super::{BackendResult, Collection, CollectionBackend};
use log::{debug, error, warn};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Fixed namespace key for the blob.
pub const NAMESPACE_KEY: &str = "routina_app_data";

/// Durable storage for one serialized blob.
pub trait BlobSlot {
    /// Returns the stored blob, or `None` when nothing has been written yet.
    fn read(&self) -> io::Result<Option<String>>;
    fn write(&mut self, blob: &str) -> io::Result<()>;
    fn remove(&mut self) -> io::Result<()>;
}

/// Blob kept in `<dir>/routina_app_data.json`.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{NAMESPACE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlobSlot for FileSlot {
    fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&mut self, blob: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(blob.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)
    }

    fn remove(&mut self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Blob kept in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    blob: Option<String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with raw blob text, which need not be valid JSON.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Some(blob.into()),
        }
    }

    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }
}

impl BlobSlot for MemorySlot {
    fn read(&self) -> io::Result<Option<String>> {
        Ok(self.blob.clone())
    }

    fn write(&mut self, blob: &str) -> io::Result<()> {
        self.blob = Some(blob.to_string());
        Ok(())
    }

    fn remove(&mut self) -> io::Result<()> {
        self.blob = None;
        Ok(())
    }
}

/// Backend storing all collections in a single namespaced blob.
#[derive(Debug)]
pub struct LocalBackend<S: BlobSlot> {
    slot: S,
}

impl LocalBackend<MemorySlot> {
    pub fn in_memory() -> Self {
        Self::new(MemorySlot::new())
    }
}

impl LocalBackend<FileSlot> {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(FileSlot::in_dir(dir))
    }
}

impl<S: BlobSlot> LocalBackend<S> {
    pub fn new(slot: S) -> Self {
        Self { slot }
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Drops one collection from the blob.
    pub fn remove(&mut self, collection: Collection) {
        let mut data = self.read_all();
        if data.remove(collection.key()).is_some() {
            self.write_all(&data);
        }
    }

    /// Removes the whole blob.
    pub fn clear(&mut self) {
        if let Err(err) = self.slot.remove() {
            error!("event=blob_clear module=backend status=error error={err}");
        }
    }

    fn read_all(&self) -> Map<String, Value> {
        let blob = match self.slot.read() {
            Ok(Some(blob)) => blob,
            Ok(None) => return Map::new(),
            Err(err) => {
                error!("event=blob_read module=backend status=error error={err}");
                return Map::new();
            }
        };

        match serde_json::from_str::<Value>(&blob) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                warn!(
                    "event=blob_read module=backend status=recovered reason=not_an_object kind={}",
                    value_kind(&other)
                );
                Map::new()
            }
            Err(err) => {
                warn!("event=blob_read module=backend status=recovered reason=parse_error error={err}");
                Map::new()
            }
        }
    }

    fn write_all(&mut self, data: &Map<String, Value>) {
        let blob = match serde_json::to_string(data) {
            Ok(blob) => blob,
            Err(err) => {
                error!("event=blob_write module=backend status=error reason=serialize error={err}");
                return;
            }
        };
        match self.slot.write(&blob) {
            Ok(()) => debug!("event=blob_write module=backend status=ok bytes={}", blob.len()),
            Err(err) => error!("event=blob_write module=backend status=error error={err}"),
        }
    }
}

impl<S: BlobSlot> CollectionBackend for LocalBackend<S> {
    fn get(&mut self, collection: Collection) -> BackendResult<Option<Value>> {
        let mut data = self.read_all();
        Ok(match data.remove(collection.key()) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        })
    }

    fn set(&mut self, collection: Collection, value: &Value) -> BackendResult<()> {
        let mut data = self.read_all();
        data.insert(collection.key().to_string(), value.clone());
        self.write_all(&data);
        Ok(())
    }

    fn set_batch(&mut self, entries: &[(Collection, Value)]) -> BackendResult<()> {
        let mut data = self.read_all();
        for (collection, value) in entries {
            data.insert(collection.key().to_string(), value.clone());
        }
        self.write_all(&data);
        Ok(())
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{LocalBackend, MemorySlot};
    use crate::backend::{Collection, CollectionBackend};
    use serde_json::json;

    #[test]
    fn set_keeps_other_collections() {
        let mut backend = LocalBackend::in_memory();
        backend.set(Collection::Tasks, &json!([{"id": "1"}])).unwrap();
        backend.set(Collection::TotalStreak, &json!("7")).unwrap();

        assert_eq!(
            backend.get(Collection::Tasks).unwrap(),
            Some(json!([{"id": "1"}]))
        );
        assert_eq!(backend.get(Collection::TotalStreak).unwrap(), Some(json!("7")));
    }

    #[test]
    fn malformed_blob_reads_as_empty() {
        let mut backend = LocalBackend::new(MemorySlot::with_blob("{not json"));
        assert_eq!(backend.get(Collection::Goals).unwrap(), None);

        let mut array_blob = LocalBackend::new(MemorySlot::with_blob("[1, 2]"));
        assert_eq!(array_blob.get(Collection::Goals).unwrap(), None);
    }

    #[test]
    fn write_after_malformed_blob_replaces_it() {
        let mut backend = LocalBackend::new(MemorySlot::with_blob("garbage"));
        backend.set(Collection::Reflections, &json!([])).unwrap();
        assert_eq!(
            backend.slot().blob(),
            Some(r#"{"reflections":[]}"#)
        );
    }

    #[test]
    fn remove_and_clear_drop_data() {
        let mut backend = LocalBackend::in_memory();
        backend
            .set_batch(&[
                (Collection::Tasks, json!([])),
                (Collection::Goals, json!([])),
            ])
            .unwrap();

        backend.remove(Collection::Tasks);
        assert_eq!(backend.get(Collection::Tasks).unwrap(), None);
        assert_eq!(backend.get(Collection::Goals).unwrap(), Some(json!([])));

        backend.clear();
        assert!(backend.slot().blob().is_none());
    }
}
