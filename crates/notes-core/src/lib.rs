//! notes-core: note collection manager and title/body document model.
//!
//! This crate provides:
//! - The `Note` entity with derived title, preview and year
//! - `StyledDocument`: plain text <-> positionally styled lines
//! - `EditorSession`: caret-preserving edits over a styled document
//! - `NoteCollection`: search, year grouping, selection and persistence
//! - `NoteStorage` trait abstraction and the shared JSON codec

pub mod codec;
pub mod collection;
pub mod document;
pub mod editor;
pub mod events;
pub mod note;
mod persist;
pub mod storage;

pub use collection::{CollectionError, ImportReport, LoadOutcome, NoteCollection, YearGroup};
pub use document::{
    apply_positional_style, to_document, to_plain_text, CaretPosition, LineStyle, StyledDocument,
    StyledLine,
};
pub use editor::EditorSession;
pub use events::{CollectionEvent, EventBus, Subscription};
pub use note::{Note, NoteId};
pub use storage::{InMemoryStorage, NoteStorage, StorageError};
