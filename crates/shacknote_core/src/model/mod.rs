//! Domain model for persisted notes.
//!
//! # Responsibility
//! - Define the single persisted entity and its read-side invariants.
//! - Provide write-side input validation shared by service and UI.
//!
//! # Invariants
//! - Every note is identified by a store-assigned `NoteId` that never changes.
//! - Deletion is a hard delete; there are no tombstones.

pub mod note;
pub mod preview;
