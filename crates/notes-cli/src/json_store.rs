//! JSON file storage using tokio::fs.
//!
//! The whole note list lives in one pretty-printed JSON file. Saves go to a
//! sibling temp file that is renamed over the target, so an interrupted
//! write leaves the previous file intact.

use async_trait::async_trait;
use notes_core::codec;
use notes_core::storage::{NoteStorage, Result, StorageError};
use notes_core::Note;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Suffix for a copy of an unparseable notes file, kept before any save can
/// overwrite it.
pub const CORRUPT_SUFFIX: &str = "corrupt";

/// JSON file store for the notes app
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".");
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Path the corrupt copy is written to
    pub fn corrupt_path(&self) -> PathBuf {
        self.sibling(CORRUPT_SUFFIX)
    }

    async fn preserve_corrupt(&self) {
        let target = self.corrupt_path();
        match fs::copy(&self.path, &target).await {
            Ok(_) => warn!("Kept unreadable notes file as {}", target.display()),
            Err(e) => warn!("Failed to keep unreadable notes file: {}", e),
        }
    }
}

#[async_trait]
impl NoteStorage for JsonFileStore {
    async fn load_all(&self) -> Result<Vec<Note>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No notes file at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(StorageError::Unavailable(e.to_string())),
        };

        // Unparseable stays Malformed; the collection recovers from either variant
        match codec::decode_notes(&bytes) {
            Ok(notes) => Ok(notes),
            Err(e) => {
                self.preserve_corrupt().await;
                Err(e)
            }
        }
    }

    async fn save_all(&self, notes: &[Note]) -> Result<()> {
        let bytes = codec::encode_notes(notes)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        }

        let tmp = self.sibling("tmp");
        fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        debug!("Wrote {} note(s) to {}", notes.len(), self.path.display());
        Ok(())
    }

    async fn export_to(&self, destination: &str, notes: &[Note]) -> Result<()> {
        let bytes = codec::encode_notes(notes)?;
        let destination = Path::new(destination);
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        }
        fs::write(destination, bytes)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }

    async fn import_from(&self, source: &str) -> Result<Vec<Note>> {
        let bytes = fs::read(source)
            .await
            .map_err(|e| StorageError::Unavailable(format!("{}: {}", source, e)))?;
        codec::decode_notes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_paths() {
        let store = JsonFileStore::new(PathBuf::from("/data/Notes/notes.json"));
        assert_eq!(store.corrupt_path(), PathBuf::from("/data/Notes/notes.json.corrupt"));
        assert_eq!(store.sibling("tmp"), PathBuf::from("/data/Notes/notes.json.tmp"));
    }
}
