//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for the notes table.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Read paths reject persisted rows that fail `Note::validate()`.
//! - Write paths report affected row counts; absence of a row is not an
//!   error at this layer.

pub mod note_repo;
