//! NoteCollection: owns the authoritative note list and its derived views.
//!
//! All views (search filter, year groups, selection) are recomputed wholesale
//! by `refresh_view()` after every state change. Mutations apply in memory
//! first, then persist through the injected `NoteStorage`. A failed save
//! never rolls back the in-memory change; it is returned to the caller and
//! emitted as `CollectionEvent::SaveFailed`.

use crate::codec;
use crate::events::{CollectionEvent, EventBus, Subscription};
use crate::note::{Note, NoteId};
use crate::persist::Persister;
use crate::storage::{NoteStorage, StorageError};
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Import rejected: {0}")]
    ImportMalformed(String),

    #[error("Note not in current view: {0}")]
    NotFound(NoteId),
}

pub type Result<T> = std::result::Result<T, CollectionError>;

/// Notes sharing the year of their last modification, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearGroup {
    pub year: i32,
    pub notes: Vec<Note>,
}

/// Outcome of a merge import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub added_count: usize,
    pub skipped_count: usize,
}

/// Outcome of `load()`
#[derive(Debug)]
pub enum LoadOutcome {
    /// Notes were read from storage (possibly zero).
    Loaded(usize),
    /// Storage failed; the collection started empty.
    Recovered(StorageError),
}

/// Single owner of the note list, search text and selection.
pub struct NoteCollection<S: NoteStorage + 'static> {
    notes: Vec<Note>,
    search_text: String,
    selected: Option<NoteId>,
    /// Derived: filtered notes grouped by year
    groups: Vec<YearGroup>,
    persister: Persister<S>,
    events: Arc<EventBus>,
}

impl<S: NoteStorage + 'static> NoteCollection<S> {
    pub fn new(storage: S) -> Self {
        Self {
            notes: Vec::new(),
            search_text: String::new(),
            selected: None,
            groups: Vec::new(),
            persister: Persister::new(Arc::new(storage)),
            events: Arc::new(EventBus::new()),
        }
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Subscribe to view/selection/save notifications.
    pub fn subscribe(
        &self,
        callback: impl Fn(CollectionEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.events.subscribe(callback)
    }

    // ========================================================================
    // Read side
    // ========================================================================

    /// Every note, in storage order (not the filtered view).
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id() == id)
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Filtered notes grouped by year, newest year first.
    pub fn year_groups(&self) -> &[YearGroup] {
        &self.groups
    }

    /// Filtered notes in display order.
    pub fn visible_notes(&self) -> impl Iterator<Item = &Note> {
        self.groups.iter().flat_map(|g| g.notes.iter())
    }

    pub fn visible_count(&self) -> usize {
        self.groups.iter().map(|g| g.notes.len()).sum()
    }

    pub fn selected_id(&self) -> Option<NoteId> {
        self.selected
    }

    pub fn selected_note(&self) -> Option<&Note> {
        self.selected.and_then(|id| self.note(id))
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Replace the notes with what storage holds and select the newest.
    ///
    /// A storage failure is not fatal: the collection starts empty and the
    /// failure is reported through the outcome and a `LoadRecovered` event.
    pub async fn load(&mut self) -> LoadOutcome {
        let outcome = match self.persister.storage().load_all().await {
            Ok(notes) => {
                self.notes = dedupe_by_id(notes);
                info!("Loaded {} note(s)", self.notes.len());
                LoadOutcome::Loaded(self.notes.len())
            }
            Err(e) => {
                warn!("Failed to load notes, starting empty: {}", e);
                self.notes.clear();
                self.events.emit(CollectionEvent::LoadRecovered {
                    reason: e.to_string(),
                });
                LoadOutcome::Recovered(e)
            }
        };

        self.refresh_view();
        // Newest overall, not newest visible. Falls back to the view when an
        // active search hides it.
        let newest = most_recent(self.notes.iter()).map(Note::id);
        if self.in_view(newest) {
            self.set_selected(newest);
        } else if !self.notes.is_empty() {
            let first_visible = self.visible_notes().next().map(Note::id);
            self.set_selected(first_visible);
        }
        outcome
    }

    /// Update the search text and refresh. Never touches the notes.
    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
        debug!("Search text set to {:?}", self.search_text);
        self.refresh_view();
    }

    /// Select a note in the current view. No persistence side effect.
    pub fn select_note(&mut self, id: NoteId) -> Result<()> {
        if !self.in_view(Some(id)) {
            return Err(CollectionError::NotFound(id));
        }
        self.set_selected(Some(id));
        Ok(())
    }

    /// Create an empty note at the head of the list, select it and save.
    ///
    /// Clears any active search, since an empty note matches none and the
    /// selection must stay in view. On a save failure the note stays in the
    /// collection and selected.
    pub async fn add_note(&mut self) -> Result<Note> {
        let note = Note::new_at(Utc::now());
        self.notes.insert(0, note.clone());
        info!("Added note {}", note.id());

        if !self.search_text.is_empty() {
            debug!("Clearing search {:?} to show the new note", self.search_text);
            self.search_text.clear();
        }
        self.refresh_view();
        self.set_selected(Some(note.id()));
        self.save().await?;
        Ok(note)
    }

    /// Remove the selected note and save. Returns the removed note, or
    /// `None` if nothing was selected.
    pub async fn delete_selected(&mut self) -> Result<Option<Note>> {
        let Some(id) = self.selected else {
            return Ok(None);
        };
        let Some(index) = self.notes.iter().position(|n| n.id() == id) else {
            return Ok(None);
        };

        let removed = self.notes.remove(index);
        info!("Deleted note {}", id);
        self.refresh_view();
        self.save().await?;
        Ok(Some(removed))
    }

    /// Write the editor's text into the selected note.
    ///
    /// Returns `false` without saving when nothing is selected or the text is
    /// unchanged, so no-op commits never bump `last_modified_date`.
    pub async fn commit_editor_content(&mut self, new_content: &str) -> Result<bool> {
        let Some(id) = self.selected else {
            return Ok(false);
        };
        let Some(note) = self.notes.iter_mut().find(|n| n.id() == id) else {
            return Ok(false);
        };
        if !note.set_content(new_content, Utc::now()) {
            return Ok(false);
        }

        debug!("Committed {} char(s) to note {}", new_content.chars().count(), id);
        self.refresh_view();
        self.save().await?;
        Ok(true)
    }

    /// Encode the full note list (not the filtered view).
    pub fn export_all(&self) -> Result<Vec<u8>> {
        Ok(codec::encode_notes(&self.notes)?)
    }

    /// Export the full note list to `destination` through storage.
    /// Returns the number of notes written.
    pub async fn export_to(&self, destination: &str) -> Result<usize> {
        self.persister
            .storage()
            .export_to(destination, &self.notes)
            .await?;
        info!("Exported {} note(s) to {}", self.notes.len(), destination);
        Ok(self.notes.len())
    }

    /// Append imported notes whose ids are new, skipping the rest.
    ///
    /// Imported notes keep their ids and timestamps. Nothing is saved when
    /// no note was added.
    pub async fn import_merge(&mut self, imported: Vec<Note>) -> Result<ImportReport> {
        let mut known: HashSet<NoteId> = self.notes.iter().map(Note::id).collect();
        let mut report = ImportReport::default();

        for note in imported {
            if known.insert(note.id()) {
                self.notes.push(note);
                report.added_count += 1;
            } else {
                report.skipped_count += 1;
            }
        }

        info!(
            "Imported {} note(s), skipped {} duplicate(s)",
            report.added_count, report.skipped_count
        );
        if report.added_count > 0 {
            self.refresh_view();
            self.save().await?;
        }
        Ok(report)
    }

    /// Read a note list from `source` through storage and merge it.
    ///
    /// Malformed data rejects the whole import and leaves the notes untouched.
    pub async fn import_from(&mut self, source: &str) -> Result<ImportReport> {
        let imported = match self.persister.storage().import_from(source).await {
            Ok(notes) => notes,
            Err(StorageError::Malformed(reason)) => {
                warn!("Rejected import from {}: {}", source, reason);
                return Err(CollectionError::ImportMalformed(reason));
            }
            Err(e) => return Err(e.into()),
        };
        self.import_merge(imported).await
    }

    /// Persist the current notes, e.g. to retry after a failed save.
    pub async fn save(&self) -> Result<()> {
        match self.persister.save(self.notes.clone()).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("Failed to save notes: {}", e);
                self.events.emit(CollectionEvent::SaveFailed {
                    reason: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Wait for outstanding saves. Call before shutdown.
    pub async fn flush(&self) {
        self.persister.flush().await;
    }

    // ========================================================================
    // Derived view
    // ========================================================================

    /// Recompute filter, year groups and selection from scratch.
    fn refresh_view(&mut self) {
        let needle = self.search_text.trim();
        let filtered = self
            .notes
            .iter()
            .filter(|n| needle.is_empty() || n.matches(&self.search_text));

        let mut by_year: BTreeMap<i32, Vec<Note>> = BTreeMap::new();
        for note in filtered {
            by_year.entry(note.year()).or_default().push(note.clone());
        }

        self.groups = by_year
            .into_iter()
            .rev()
            .map(|(year, mut notes)| {
                notes.sort_by(|a, b| b.last_modified_date().cmp(&a.last_modified_date()));
                YearGroup { year, notes }
            })
            .collect();

        self.events.emit(CollectionEvent::ViewChanged {
            visible: self.visible_count(),
            groups: self.groups.len(),
        });

        // Selection repair
        if self.selected.is_some() && !self.in_view(self.selected) {
            let fallback = self.visible_notes().next().map(Note::id);
            self.set_selected(fallback);
        }
    }

    fn in_view(&self, id: Option<NoteId>) -> bool {
        id.is_some_and(|id| self.visible_notes().any(|n| n.id() == id))
    }

    fn set_selected(&mut self, id: Option<NoteId>) {
        if self.selected != id {
            self.selected = id;
            self.events
                .emit(CollectionEvent::SelectionChanged { selected: id });
        }
    }
}

fn most_recent<'a>(notes: impl Iterator<Item = &'a Note>) -> Option<&'a Note> {
    notes.reduce(|best, n| {
        if n.last_modified_date() > best.last_modified_date() {
            n
        } else {
            best
        }
    })
}

/// Keep the first occurrence of each id.
fn dedupe_by_id(notes: Vec<Note>) -> Vec<Note> {
    let mut seen = HashSet::new();
    let before = notes.len();
    let unique: Vec<Note> = notes.into_iter().filter(|n| seen.insert(n.id())).collect();
    if unique.len() < before {
        warn!("Dropped {} note(s) with duplicate ids", before - unique.len());
    }
    unique
}
