//! Command handlers for the `notes` binary.
//!
//! Each handler drives a loaded `NoteCollection` and writes user-facing
//! output to `out`. Edits go through an `EditorSession` the same way an
//! interactive editor would.

use anyhow::{Context, Result};
use notes_core::{
    CollectionError, EditorSession, NoteCollection, NoteId, NoteStorage, YearGroup,
};
use std::io::Write;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No note matches id {0:?}")]
    UnknownId(String),

    #[error("Id prefix {0:?} matches {1} notes; use more characters")]
    AmbiguousId(String, usize),
}

/// Find the note whose id equals or starts with `prefix`.
pub fn resolve_id<S: NoteStorage + 'static>(
    collection: &NoteCollection<S>,
    prefix: &str,
) -> Result<NoteId> {
    let wanted = prefix.trim().to_lowercase();
    if let Ok(id) = wanted.parse::<NoteId>() {
        if collection.note(id).is_some() {
            return Ok(id);
        }
    }

    let matches: Vec<NoteId> = collection
        .notes()
        .iter()
        .map(|n| n.id())
        .filter(|id| !wanted.is_empty() && id.to_string().starts_with(&wanted))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(CommandError::UnknownId(prefix.to_string()).into()),
        many => Err(CommandError::AmbiguousId(prefix.to_string(), many.len()).into()),
    }
}

/// Render year groups as an indented listing.
pub fn render_groups(groups: &[YearGroup]) -> String {
    let mut out = String::new();
    for group in groups {
        out.push_str(&format!("{}\n", group.year));
        for note in &group.notes {
            let preview = note.preview();
            if preview.is_empty() {
                out.push_str(&format!(
                    "  {}  {}  {}\n",
                    note.id().short(),
                    note.date_display(),
                    note.title()
                ));
            } else {
                out.push_str(&format!(
                    "  {}  {}  {} - {}\n",
                    note.id().short(),
                    note.date_display(),
                    note.title(),
                    preview
                ));
            }
        }
    }
    out
}

pub fn list<S: NoteStorage + 'static>(
    collection: &mut NoteCollection<S>,
    search: Option<&str>,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    if let Some(search) = search {
        collection.set_search_text(search);
    }

    if json {
        serde_json::to_writer_pretty(&mut *out, collection.year_groups())?;
        writeln!(out)?;
    } else if collection.year_groups().is_empty() {
        writeln!(out, "No notes")?;
    } else {
        write!(out, "{}", render_groups(collection.year_groups()))?;
    }
    Ok(())
}

pub fn show<S: NoteStorage + 'static>(
    collection: &NoteCollection<S>,
    id: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let id = resolve_id(collection, id)?;
    let note = collection
        .note(id)
        .ok_or_else(|| CommandError::UnknownId(id.to_string()))?;
    writeln!(out, "{}", note.content())?;
    Ok(())
}

pub async fn add<S: NoteStorage + 'static>(
    collection: &mut NoteCollection<S>,
    content: Option<&str>,
    out: &mut dyn Write,
) -> Result<()> {
    let note = collection.add_note().await.context("Failed to save new note")?;
    if let Some(content) = content {
        write_through_editor(collection, content).await?;
    }
    let title = collection
        .note(note.id())
        .map(|n| n.title())
        .unwrap_or_default();
    writeln!(out, "Added {} {}", note.id().short(), title)?;
    Ok(())
}

pub async fn edit<S: NoteStorage + 'static>(
    collection: &mut NoteCollection<S>,
    id: &str,
    content: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let id = resolve_id(collection, id)?;
    collection.select_note(id)?;
    if write_through_editor(collection, content).await? {
        writeln!(out, "Updated {}", id.short())?;
    } else {
        writeln!(out, "No changes to {}", id.short())?;
    }
    Ok(())
}

pub async fn delete<S: NoteStorage + 'static>(
    collection: &mut NoteCollection<S>,
    id: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let id = resolve_id(collection, id)?;
    collection.select_note(id)?;
    if let Some(removed) = collection.delete_selected().await? {
        writeln!(out, "Deleted {} {}", removed.id().short(), removed.title())?;
    }
    Ok(())
}

pub async fn export<S: NoteStorage + 'static>(
    collection: &NoteCollection<S>,
    destination: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let count = collection
        .export_to(destination)
        .await
        .with_context(|| format!("Failed to export to {}", destination))?;
    writeln!(out, "Exported {} note(s) to {}", count, destination)?;
    Ok(())
}

pub async fn import<S: NoteStorage + 'static>(
    collection: &mut NoteCollection<S>,
    source: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let report = match collection.import_from(source).await {
        Ok(report) => report,
        Err(CollectionError::ImportMalformed(reason)) => {
            writeln!(out, "Imported 0 new note(s) (skipped 0 duplicate(s))")?;
            writeln!(out, "Rejected {}: {}", source, reason)?;
            return Err(CollectionError::ImportMalformed(reason))
                .with_context(|| format!("Failed to import {}", source));
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to import {}", source)),
    };
    writeln!(
        out,
        "Imported {} new note(s) (skipped {} duplicate(s))",
        report.added_count, report.skipped_count
    )?;
    Ok(())
}

/// Replace the selected note's text via an editor session and commit it.
async fn write_through_editor<S: NoteStorage + 'static>(
    collection: &mut NoteCollection<S>,
    content: &str,
) -> Result<bool> {
    let mut session = EditorSession::new();
    session.load(collection.selected_note());
    let end = session.document().char_len();
    session.replace_range(0..end, content);
    debug!(
        "Editor holds {} line(s), dirty: {}",
        session.document().line_count(),
        session.is_dirty()
    );

    collection
        .commit_editor_content(&session.plain_text())
        .await
        .context("Failed to save note")
}
