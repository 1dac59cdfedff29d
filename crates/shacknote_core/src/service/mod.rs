//! Core use-case services.
//!
//! # Responsibility
//! - Own the store handle and expose the note operation set.
//! - Convert every failure into a result envelope instead of propagating it.

pub mod envelope;
pub mod note_service;
