//! JSON encoding of the note list.
//!
//! Persistent storage and export/import share this shape: an array of
//! `{id, content, createdDate, lastModifiedDate}` records.

use crate::note::Note;
use crate::storage::{Result, StorageError};

/// Encode notes as pretty-printed JSON.
pub fn encode_notes(notes: &[Note]) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(notes).map_err(|e| StorageError::Malformed(e.to_string()))
}

/// Decode a note list. Blank input and a JSON `null` decode to no notes.
pub fn decode_notes(bytes: &[u8]) -> Result<Vec<Note>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let notes: Option<Vec<Note>> =
        serde_json::from_slice(bytes).map_err(|e| StorageError::Malformed(e.to_string()))?;
    Ok(notes.unwrap_or_default())
}
