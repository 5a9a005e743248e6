//! NoteStorage trait abstraction for persisting the note list.
//!
//! Implementations:
//! - `InMemoryStorage` - For testing
//! - `JsonFileStore` (in notes-cli) - A JSON file on disk via tokio::fs

use crate::codec;
use crate::note::Note;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The medium could not be read or written.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Data was read but does not parse into notes.
    #[error("Malformed note data: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Persistence collaborator for the note collection.
///
/// `destination` and `source` are opaque locations chosen by the caller
/// (a file path for the JSON store).
#[async_trait]
pub trait NoteStorage: Send + Sync {
    /// Load every persisted note. Returns an empty list if nothing was saved yet.
    async fn load_all(&self) -> Result<Vec<Note>>;

    /// Replace the persisted notes with `notes`.
    async fn save_all(&self, notes: &[Note]) -> Result<()>;

    /// Write `notes` to `destination` in the persistent encoding.
    async fn export_to(&self, destination: &str, notes: &[Note]) -> Result<()>;

    /// Read a note list written by `export_to`.
    async fn import_from(&self, source: &str) -> Result<Vec<Note>>;
}

/// In-memory storage for testing
pub struct InMemoryStorage {
    notes: RwLock<Vec<Note>>,
    /// Exported/importable blobs keyed by location
    files: RwLock<HashMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::with_notes(Vec::new())
    }

    pub fn with_notes(notes: Vec<Note>) -> Self {
        Self {
            notes: RwLock::new(notes),
            files: RwLock::new(HashMap::new()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
        }
    }

    /// Make `load_all` fail with `Unavailable` until reset
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make `save_all` and `export_to` fail with `Unavailable` until reset
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Notes as last saved
    pub fn stored(&self) -> Vec<Note> {
        self.notes.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of successful `save_all` calls
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Place raw bytes at a location for `import_from`
    pub fn put_file(&self, location: &str, bytes: Vec<u8>) {
        self.files
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(location.to_string(), bytes);
    }

    /// Raw bytes previously written by `export_to`
    pub fn file(&self, location: &str) -> Option<Vec<u8>> {
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(location)
            .cloned()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NoteStorage for InMemoryStorage {
    async fn load_all(&self) -> Result<Vec<Note>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("read failure".to_string()));
        }
        Ok(self.stored())
    }

    async fn save_all(&self, notes: &[Note]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("write failure".to_string()));
        }
        *self.notes.write().unwrap_or_else(|e| e.into_inner()) = notes.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn export_to(&self, destination: &str, notes: &[Note]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("write failure".to_string()));
        }
        let bytes = codec::encode_notes(notes)?;
        self.put_file(destination, bytes);
        Ok(())
    }

    async fn import_from(&self, source: &str) -> Result<Vec<Note>> {
        let bytes = self
            .file(source)
            .ok_or_else(|| StorageError::Unavailable(format!("not found: {}", source)))?;
        codec::decode_notes(&bytes)
    }
}

// Lets tests keep a handle on the storage they hand to a collection
#[async_trait]
impl<T: NoteStorage> NoteStorage for std::sync::Arc<T> {
    async fn load_all(&self) -> Result<Vec<Note>> {
        (**self).load_all().await
    }

    async fn save_all(&self, notes: &[Note]) -> Result<()> {
        (**self).save_all(notes).await
    }

    async fn export_to(&self, destination: &str, notes: &[Note]) -> Result<()> {
        (**self).export_to(destination, notes).await
    }

    async fn import_from(&self, source: &str) -> Result<Vec<Note>> {
        (**self).import_from(source).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inmemory_storage_basic_operations() {
        let storage = InMemoryStorage::new();
        assert!(storage.load_all().await.unwrap().is_empty());

        let note = Note::new();
        storage.save_all(std::slice::from_ref(&note)).await.unwrap();
        assert_eq!(storage.load_all().await.unwrap(), vec![note.clone()]);
        assert_eq!(storage.save_count(), 1);

        storage.export_to("backup.json", &[note.clone()]).await.unwrap();
        assert_eq!(storage.import_from("backup.json").await.unwrap(), vec![note]);
    }

    #[tokio::test]
    async fn test_inmemory_storage_failures() {
        let storage = InMemoryStorage::new();
        storage.set_fail_writes(true);
        assert!(matches!(
            storage.save_all(&[]).await,
            Err(StorageError::Unavailable(_))
        ));
        assert_eq!(storage.save_count(), 0);

        storage.set_fail_reads(true);
        assert!(storage.load_all().await.is_err());

        assert!(matches!(
            storage.import_from("missing.json").await,
            Err(StorageError::Unavailable(_))
        ));
        storage.put_file("bad.json", b"[{]".to_vec());
        assert!(matches!(
            storage.import_from("bad.json").await,
            Err(StorageError::Malformed(_))
        ));
    }
}
