//! Shared document engine.
//!
//! A room's document is a plain text buffer mutated by position-indexed
//! operations, applied strictly in the order the server receives them.
//! There is no transform/rebase step: concurrent edits of the same region
//! are resolved by arrival order only.
//!
//! Positions and lengths count Unicode scalar values (`char`s), not bytes.

/// An edit applied to a room's document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOperation {
    /// Splice `text` into the buffer at `position`.
    Insert { position: usize, text: String },
    /// Remove `length` characters starting at `position`.
    Delete { position: usize, length: usize },
}

impl DocumentOperation {
    pub fn position(&self) -> usize {
        match self {
            Self::Insert { position, .. } | Self::Delete { position, .. } => *position,
        }
    }

    /// Wire name of the operation (`"insert"` / `"delete"`)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Delete { .. } => "delete",
        }
    }
}

/// A room's shared text buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    content: String,
}

impl Document {
    pub fn new(content: String) -> Self {
        Self { content }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Apply an operation to the buffer.
    ///
    /// An insert past the end appends; a delete range is clamped to the end
    /// of the buffer.
    pub fn apply(&mut self, operation: &DocumentOperation) {
        match operation {
            DocumentOperation::Insert { position, text } => {
                let at = byte_offset(&self.content, *position);
                self.content.insert_str(at, text);
            }
            DocumentOperation::Delete { position, length } => {
                let start = byte_offset(&self.content, *position);
                let end = byte_offset(&self.content, position.saturating_add(*length));
                self.content.replace_range(start..end, "");
            }
        }
    }
}

/// Adjust a cursor position for an operation that has just been applied.
///
/// - insert: cursors at or after `position` move forward by the inserted length
/// - delete: cursors after the removed range move back by `length`, cursors
///   inside the range collapse to `position`, cursors at or before
///   `position` stay put
pub fn shift_cursor(cursor: usize, operation: &DocumentOperation) -> usize {
    match operation {
        DocumentOperation::Insert { position, text } => {
            if cursor >= *position {
                cursor.saturating_add(text.chars().count())
            } else {
                cursor
            }
        }
        DocumentOperation::Delete { position, length } => {
            let end = position.saturating_add(*length);
            if cursor > end {
                cursor - length
            } else if cursor > *position {
                *position
            } else {
                cursor
            }
        }
    }
}

/// Byte offset of the `char_position`-th character, clamped to the end.
fn byte_offset(content: &str, char_position: usize) -> usize {
    content
        .char_indices()
        .nth(char_position)
        .map(|(offset, _)| offset)
        .unwrap_or(content.len())
}
