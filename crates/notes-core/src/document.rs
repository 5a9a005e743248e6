//! StyledDocument: the line-by-line editing model for a note's content.
//!
//! Each line of the plain-text content becomes one styled line:
//! - line 0 is the title (large, bold)
//! - every other line is body text
//!
//! Style is a function of position only. It is recomputed from scratch after
//! every structural edit and never changes the characters of the document, so
//! `to_plain_text(to_document(s)) == s` for any LF-delimited `s`.

use serde::Serialize;

/// Visual style of a line, derived from its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LineStyle {
    Title,
    Body,
}

impl LineStyle {
    pub fn for_position(index: usize) -> Self {
        if index == 0 {
            LineStyle::Title
        } else {
            LineStyle::Body
        }
    }

    /// Font size in points.
    pub fn font_size(self) -> f32 {
        match self {
            LineStyle::Title => 22.0,
            LineStyle::Body => 14.0,
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, LineStyle::Title)
    }

    pub fn line_height(self) -> f32 {
        match self {
            LineStyle::Title => 30.0,
            LineStyle::Body => 22.0,
        }
    }

    /// Space below the paragraph.
    pub fn bottom_margin(self) -> f32 {
        match self {
            LineStyle::Title => 4.0,
            LineStyle::Body => 2.0,
        }
    }
}

/// One line of text plus its style tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyledLine {
    pub text: String,
    pub style: LineStyle,
}

impl StyledLine {
    pub fn new(text: impl Into<String>, style: LineStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Caret location expressed as a line index and a char column within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaretPosition {
    pub line: usize,
    pub column: usize,
}

/// Ordered, never-empty sequence of styled lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyledDocument {
    lines: Vec<StyledLine>,
}

impl StyledDocument {
    /// Build a document from note content, stripping `\r` left over from
    /// CRLF line endings.
    pub fn from_content(content: &str) -> Self {
        let lines = content
            .split('\n')
            .map(|line| line.trim_end_matches('\r'))
            .enumerate()
            .map(|(i, text)| StyledLine::new(text, LineStyle::for_position(i)))
            .collect();
        Self { lines }
    }

    /// Build a document from text that is already LF-delimited, keeping every
    /// character as-is. Used by the editor after each edit.
    pub(crate) fn from_plain_text(text: &str) -> Self {
        let lines = text
            .split('\n')
            .enumerate()
            .map(|(i, text)| StyledLine::new(text, LineStyle::for_position(i)))
            .collect();
        Self { lines }
    }

    /// Wrap existing lines, keeping whatever style tags they carry.
    ///
    /// An empty list becomes a single empty title line so the editor always
    /// has a line to receive input.
    pub fn from_lines(mut lines: Vec<StyledLine>) -> Self {
        if lines.is_empty() {
            lines.push(StyledLine::new("", LineStyle::Title));
        }
        Self { lines }
    }

    pub fn lines(&self) -> &[StyledLine] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn title_line(&self) -> &StyledLine {
        &self.lines[0]
    }

    /// Re-tag every line by its current index. Idempotent.
    pub fn apply_positional_style(&mut self) {
        for (i, line) in self.lines.iter_mut().enumerate() {
            line.style = LineStyle::for_position(i);
        }
    }

    pub fn is_positionally_styled(&self) -> bool {
        self.lines
            .iter()
            .enumerate()
            .all(|(i, line)| line.style == LineStyle::for_position(i))
    }

    /// Join the raw line texts with `\n`, ignoring style.
    pub fn to_plain_text(&self) -> String {
        let texts: Vec<&str> = self.lines.iter().map(|line| line.text.as_str()).collect();
        texts.join("\n")
    }

    /// Total length in chars, counting each line break as one.
    pub fn char_len(&self) -> usize {
        let text: usize = self.lines.iter().map(StyledLine::char_len).sum();
        text + self.lines.len() - 1
    }

    /// Map a logical char offset to a line/column pair, clamping past the end.
    pub fn offset_to_position(&self, offset: usize) -> CaretPosition {
        let mut remaining = offset;
        for (line, styled) in self.lines.iter().enumerate() {
            let len = styled.char_len();
            if remaining <= len {
                return CaretPosition {
                    line,
                    column: remaining,
                };
            }
            remaining -= len + 1;
        }
        let last = self.lines.len() - 1;
        CaretPosition {
            line: last,
            column: self.lines[last].char_len(),
        }
    }

    /// Map a line/column pair back to a logical char offset, clamping both.
    pub fn position_to_offset(&self, position: CaretPosition) -> usize {
        let line = position.line.min(self.lines.len() - 1);
        let before: usize = self.lines[..line]
            .iter()
            .map(|styled| styled.char_len() + 1)
            .sum();
        before + position.column.min(self.lines[line].char_len())
    }

    /// Restyle the document around a caret without moving it.
    ///
    /// Captures the caret's logical offset, applies positional styling, and
    /// returns the same offset. Styling only touches tags, so the text, and
    /// therefore the offset, is identical before and after.
    pub fn restyle_preserving_caret(&mut self, caret: usize) -> usize {
        let caret = caret.min(self.char_len());
        if cfg!(debug_assertions) {
            let before = self.to_plain_text();
            self.apply_positional_style();
            debug_assert_eq!(before, self.to_plain_text(), "restyling changed document text");
        } else {
            self.apply_positional_style();
        }
        caret
    }
}

impl Default for StyledDocument {
    fn default() -> Self {
        Self::from_content("")
    }
}

/// Convert note content into a positionally styled document.
pub fn to_document(content: &str) -> StyledDocument {
    StyledDocument::from_content(content)
}

/// Re-tag every line by position, independent of prior tags.
pub fn apply_positional_style(mut document: StyledDocument) -> StyledDocument {
    document.apply_positional_style();
    document
}

/// Extract the plain text of a document.
pub fn to_plain_text(document: &StyledDocument) -> String {
    document.to_plain_text()
}
