//! EditorSession: the editing buffer for the selected note.
//!
//! Holds a `StyledDocument` and a caret. Every edit goes through the same
//! cycle: splice the plain text, rebuild lines, restyle by position while
//! preserving the caret. Loading a note never marks the buffer dirty; the
//! caller commits `plain_text()` back to the collection when editing ends.

use crate::document::{CaretPosition, StyledDocument};
use crate::note::{Note, NoteId};
use std::ops::Range;

#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    note_id: Option<NoteId>,
    /// Plain text as of the last load or commit.
    committed: String,
    document: StyledDocument,
    caret: usize,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the buffer with `note`'s content, or clear it for `None`.
    pub fn load(&mut self, note: Option<&Note>) {
        match note {
            Some(note) => {
                self.document = StyledDocument::from_content(note.content());
                self.note_id = Some(note.id());
            }
            None => {
                self.document = StyledDocument::default();
                self.note_id = None;
            }
        }
        self.committed = self.document.to_plain_text();
        self.caret = 0;
    }

    /// Note currently loaded, if any.
    pub fn note_id(&self) -> Option<NoteId> {
        self.note_id
    }

    pub fn document(&self) -> &StyledDocument {
        &self.document
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn caret_position(&self) -> CaretPosition {
        self.document.offset_to_position(self.caret)
    }

    pub fn set_caret(&mut self, offset: usize) {
        self.caret = offset.min(self.document.char_len());
    }

    pub fn set_caret_position(&mut self, position: CaretPosition) {
        self.caret = self.document.position_to_offset(position);
    }

    /// Insert `text` at the caret and move the caret past it.
    pub fn insert(&mut self, text: &str) {
        let at = self.caret;
        self.replace_range(at..at, text);
    }

    /// Delete the char before the caret, joining lines at a line start.
    pub fn delete_backward(&mut self) {
        if self.caret == 0 {
            return;
        }
        let at = self.caret;
        self.replace_range(at - 1..at, "");
    }

    /// Replace the chars in `range` (logical offsets) with `text`.
    ///
    /// Carriage returns in `text` are dropped so pasted CRLF text lands as
    /// plain line breaks. The range is clamped to the document. The caret
    /// ends up directly after the inserted text.
    pub fn replace_range(&mut self, range: Range<usize>, text: &str) {
        let len = self.document.char_len();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        let inserted: String = text.chars().filter(|c| *c != '\r').collect();

        let current = self.document.to_plain_text();
        let start_byte = byte_offset(&current, start);
        let end_byte = byte_offset(&current, end);

        let mut updated = String::with_capacity(current.len() + inserted.len());
        updated.push_str(&current[..start_byte]);
        updated.push_str(&inserted);
        updated.push_str(&current[end_byte..]);

        let caret = start + inserted.chars().count();
        self.document = StyledDocument::from_plain_text(&updated);
        self.caret = self.document.restyle_preserving_caret(caret);
    }

    pub fn plain_text(&self) -> String {
        self.document.to_plain_text()
    }

    /// Whether the buffer differs from what was loaded or last committed.
    pub fn is_dirty(&self) -> bool {
        self.plain_text() != self.committed
    }

    /// Record the current text as committed.
    pub fn mark_committed(&mut self) {
        self.committed = self.plain_text();
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}
