//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record shared by every layer.
//! - Validate titles on write paths and timestamps on read paths.
//!
//! # Invariants
//! - `id` is assigned by the store on insert and is immutable.
//! - `updated_at >= created_at` for every persisted row.
//! - `content` is opaque rich-text markup and is stored verbatim.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned note identifier (SQLite rowid).
pub type NoteId = i64;

/// Persisted note record.
///
/// Serialized with camelCase keys to match the display contract
/// (`createdAt`, `updatedAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    /// Serialized editor markup (HTML).
    pub content: String,
    /// `YYYY-MM-DD HH:MM:SS.SSS` UTC, set once on insert.
    pub created_at: String,
    /// Same format as `created_at`; refreshed on every update.
    pub updated_at: String,
}

/// Replacement payload for an existing note.
///
/// Unknown fields (for example a full `Note` sent back by the display) are
/// ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteUpdate {
    pub id: NoteId,
    pub title: String,
    pub content: String,
}

impl From<&Note> for NoteUpdate {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            content: note.content.clone(),
        }
    }
}

/// Validation failures for note input and persisted rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Title is empty or whitespace-only.
    EmptyTitle,
    /// Persisted `updatedAt` sorts before `createdAt`.
    UpdatedBeforeCreated { id: NoteId },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be empty"),
            Self::UpdatedBeforeCreated { id } => {
                write!(f, "note {id} has updatedAt earlier than createdAt")
            }
        }
    }
}

impl Error for NoteValidationError {}

impl Note {
    /// Checks read-side invariants of a persisted row.
    ///
    /// Timestamps share one lexically ordered text format, so string
    /// comparison matches chronological order.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.updated_at.as_str() < self.created_at.as_str() {
            return Err(NoteValidationError::UpdatedBeforeCreated { id: self.id });
        }
        Ok(())
    }
}

/// Rejects empty or whitespace-only titles.
pub fn validate_title(title: &str) -> Result<(), NoteValidationError> {
    if title.trim().is_empty() {
        return Err(NoteValidationError::EmptyTitle);
    }
    Ok(())
}
