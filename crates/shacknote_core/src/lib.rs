//! Core domain logic for ShackNote.
//! This crate owns the notes store and every persistence invariant.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{validate_title, Note, NoteId, NoteUpdate, NoteValidationError};
pub use model::preview::note_preview;
pub use repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
pub use service::envelope::{
    Ack, CreateNoteResult, CreatedNote, DeleteNoteResult, Envelope, EnvelopeError, ErrorKind,
    GetAllNotesResult, GetNoteResult, GetNotesWithPaginationResult, NoteFound, NoteList, NotePage,
    UpdateNoteResult, NOTE_NOT_FOUND_MESSAGE,
};
pub use service::note_service::{NoteService, ServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
