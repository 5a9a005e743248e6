//! Note: the atomic data entity of the collection.
//!
//! A note's `content` is the single source of truth. The first line is the
//! title line, everything after it is the body. `title`, `preview` and `year`
//! are computed on every read so they can never go stale.

use chrono::{DateTime, Datelike, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Title shown for a note whose content is empty or whitespace.
pub const UNTITLED: &str = "New Note";

/// Maximum number of characters kept from the title line.
pub const TITLE_MAX_CHARS: usize = 40;

/// Maximum number of characters kept from the joined body.
pub const PREVIEW_MAX_CHARS: usize = 60;

const ELLIPSIS: &str = "...";

/// Opaque, immutable note identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// First eight hex digits, enough to tell notes apart in listings.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for NoteId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A single user-authored note.
///
/// Only the four persisted fields live here. The PascalCase aliases accept
/// backup files written by the desktop app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(alias = "Id")]
    id: NoteId,
    #[serde(alias = "Content", default)]
    content: String,
    #[serde(alias = "CreatedDate")]
    created_date: DateTime<Utc>,
    #[serde(alias = "LastModifiedDate")]
    last_modified_date: DateTime<Utc>,
}

impl Note {
    /// Create an empty note stamped with the current time.
    pub fn new() -> Self {
        Self::new_at(Utc::now())
    }

    /// Create an empty note whose created and modified dates are both `now`.
    pub fn new_at(now: DateTime<Utc>) -> Self {
        Self {
            id: NoteId::new(),
            content: String::new(),
            created_date: now,
            last_modified_date: now,
        }
    }

    /// Rebuild a note from its persisted fields without touching them.
    pub fn from_parts(
        id: NoteId,
        content: impl Into<String>,
        created_date: DateTime<Utc>,
        last_modified_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            content: content.into(),
            created_date,
            last_modified_date,
        }
    }

    pub fn id(&self) -> NoteId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_date(&self) -> DateTime<Utc> {
        self.created_date
    }

    pub fn last_modified_date(&self) -> DateTime<Utc> {
        self.last_modified_date
    }

    /// Replace the content, bumping `last_modified_date` to `now`.
    ///
    /// Returns `false` and leaves the note untouched when the content is
    /// identical, so no-op edits never churn the timestamp.
    pub fn set_content(&mut self, content: &str, now: DateTime<Utc>) -> bool {
        if self.content == content {
            return false;
        }
        self.content = content.to_string();
        self.last_modified_date = now;
        true
    }

    /// Year of the last modification, in the local calendar.
    pub fn year(&self) -> i32 {
        self.last_modified_date.with_timezone(&Local).year()
    }

    pub fn title(&self) -> String {
        title_of(&self.content)
    }

    pub fn preview(&self) -> String {
        preview_of(&self.content)
    }

    /// Last modification formatted as `yyyy/MM/dd HH:mm` in local time.
    pub fn date_display(&self) -> String {
        self.last_modified_date
            .with_timezone(&Local)
            .format("%Y/%m/%d %H:%M")
            .to_string()
    }

    /// Case-insensitive substring match against the content.
    pub fn matches(&self, needle: &str) -> bool {
        contains_ignore_case(&self.content, needle)
    }
}

impl Default for Note {
    fn default() -> Self {
        Self::new()
    }
}

/// Title line of `content`, or [`UNTITLED`] for blank content.
pub fn title_of(content: &str) -> String {
    if content.trim().is_empty() {
        return UNTITLED.to_string();
    }
    let first = content.split('\n').next().unwrap_or_default();
    truncate_chars(first.trim_end_matches('\r'), TITLE_MAX_CHARS)
}

/// Body lines of `content` joined by single spaces, or empty if there are none.
pub fn preview_of(content: &str) -> String {
    if content.trim().is_empty() {
        return String::new();
    }
    let mut lines = content.split('\n');
    lines.next();
    let body: Vec<&str> = lines.map(|line| line.trim_end_matches('\r')).collect();
    if body.is_empty() {
        return String::new();
    }
    truncate_chars(body.join(" ").trim(), PREVIEW_MAX_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
