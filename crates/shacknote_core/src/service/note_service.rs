//! Note persistence service.
//!
//! # Responsibility
//! - Own the one SQLite handle for a notes database and its lifecycle.
//! - Expose create/get/list/page/update/delete as envelope-returning calls.
//! - Log every operation with its name and non-sensitive identifiers.
//!
//! # Invariants
//! - Operations never panic or propagate errors; every failure becomes an
//!   error envelope.
//! - Calls before `initialize()` report `NotInitialized`; calls after
//!   `close()` report `StoreUnavailable`.
//! - At most one service per database file is open in a process.
//! - Update/delete of a missing id succeed with zero rows affected.
//! - Blank titles are rejected on create and update.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::note::{validate_title, NoteId};
use crate::repo::note_repo::{NoteRepository, RepoError, SqliteNoteRepository};
use crate::service::envelope::{
    Ack, CreateNoteResult, CreatedNote, DeleteNoteResult, Envelope, EnvelopeError, ErrorKind,
    GetAllNotesResult, GetNoteResult, GetNotesWithPaginationResult, NoteFound, NoteList, NotePage,
    UpdateNoteResult,
};
use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

static OPEN_STORES: Lazy<Mutex<HashSet<PathBuf>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Lifecycle errors raised while opening the store.
#[derive(Debug)]
pub enum ServiceError {
    /// Another service in this process already holds the file.
    AlreadyOpen(PathBuf),
    /// The service was closed and cannot be reopened.
    Closed,
    /// The database path could not be resolved.
    InvalidPath { path: PathBuf, reason: String },
    Db(DbError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyOpen(path) => {
                write!(f, "notes database `{}` is already open", path.display())
            }
            Self::Closed => write!(f, "notes service is closed"),
            Self::InvalidPath { path, reason } => {
                write!(f, "invalid notes database path `{}`: {reason}", path.display())
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreLocation {
    File(PathBuf),
    Memory,
}

enum ServiceState {
    Uninitialized,
    Ready(Connection),
    Closed,
}

/// Persistence service over one notes database.
pub struct NoteService {
    location: StoreLocation,
    state: ServiceState,
    /// Registry key held while the file store is open.
    registered: Option<PathBuf>,
}

impl NoteService {
    /// Creates an uninitialized service for a database file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            state: ServiceState::Uninitialized,
            registered: None,
        }
    }

    /// Creates an uninitialized service backed by a private in-memory database.
    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            state: ServiceState::Uninitialized,
            registered: None,
        }
    }

    /// Creates and initializes a service for a database file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ServiceError> {
        let mut service = Self::new(path);
        service.initialize()?;
        Ok(service)
    }

    /// Creates and initializes an in-memory service.
    pub fn open_in_memory() -> Result<Self, ServiceError> {
        let mut service = Self::in_memory();
        service.initialize()?;
        Ok(service)
    }

    /// Opens the store, applies migrations and enables WAL.
    ///
    /// Calling this on a ready service is a no-op.
    ///
    /// # Errors
    /// - `Closed` after `close()`.
    /// - `AlreadyOpen` when another service in this process holds the file.
    /// - `Db`/`Repo` when bootstrap fails; the service stays uninitialized.
    pub fn initialize(&mut self) -> Result<(), ServiceError> {
        match self.state {
            ServiceState::Ready(_) => {
                debug!("event=service_init module=service status=noop");
                return Ok(());
            }
            ServiceState::Closed => return Err(ServiceError::Closed),
            ServiceState::Uninitialized => {}
        }

        let conn = match &self.location {
            StoreLocation::Memory => open_db_in_memory()?,
            StoreLocation::File(path) => {
                let key = registry_key(path)?;
                if !lock_registry().insert(key.clone()) {
                    warn!(
                        "event=service_init module=service status=error error_code=already_open path={}",
                        key.display()
                    );
                    return Err(ServiceError::AlreadyOpen(key));
                }
                match open_db(path) {
                    Ok(conn) => {
                        self.registered = Some(key);
                        conn
                    }
                    Err(err) => {
                        lock_registry().remove(&key);
                        return Err(err.into());
                    }
                }
            }
        };

        if let Err(err) = SqliteNoteRepository::try_new(&conn) {
            self.release_registration();
            return Err(err.into());
        }

        self.state = ServiceState::Ready(conn);
        info!("event=service_init module=service status=ok");
        Ok(())
    }

    /// Returns whether operations can currently reach the store.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, ServiceState::Ready(_))
    }

    /// Inserts a note with store-assigned timestamps.
    pub fn create(&self, title: &str, content: &str) -> CreateNoteResult {
        let repo = match self.repo("note_create") {
            Ok(repo) => repo,
            Err(err) => return Envelope::Err(err),
        };
        if let Err(err) = validate_title(title) {
            return invalid_input("note_create", None, err);
        }

        match repo.insert_note(title, content) {
            Ok(id) => {
                info!(
                    "event=note_create module=service status=ok id={} title_len={} content_len={}",
                    id,
                    title.chars().count(),
                    content.len()
                );
                Envelope::Ok(CreatedNote {
                    id,
                    message: "Note created successfully".to_string(),
                })
            }
            Err(err) => store_failure("note_create", None, "Failed to create note", &err),
        }
    }

    /// Looks up one note by id.
    pub fn get_one(&self, id: NoteId) -> GetNoteResult {
        let repo = match self.repo("note_get") {
            Ok(repo) => repo,
            Err(err) => return Envelope::Err(err),
        };

        match repo.get_note(id) {
            Ok(Some(note)) => {
                debug!("event=note_get module=service status=ok id={id}");
                Envelope::Ok(NoteFound { note })
            }
            Ok(None) => {
                info!("event=note_get module=service status=not_found id={id}");
                Envelope::Err(EnvelopeError::not_found())
            }
            Err(err) => store_failure("note_get", Some(id), "Failed to get note", &err),
        }
    }

    /// Lists every note, most recently updated first.
    pub fn get_all(&self) -> GetAllNotesResult {
        let repo = match self.repo("note_list") {
            Ok(repo) => repo,
            Err(err) => return Envelope::Err(err),
        };

        match repo.list_notes() {
            Ok(notes) => {
                debug!(
                    "event=note_list module=service status=ok count={}",
                    notes.len()
                );
                Envelope::Ok(NoteList { notes })
            }
            Err(err) => store_failure("note_list", None, "Failed to get notes", &err),
        }
    }

    /// Returns at most `limit` notes starting at `offset`, plus the total.
    ///
    /// Arguments are not clamped; an offset past the end yields an empty
    /// page with `has_more == false`.
    pub fn get_page(&self, limit: u32, offset: u32) -> GetNotesWithPaginationResult {
        let repo = match self.repo("note_page") {
            Ok(repo) => repo,
            Err(err) => return Envelope::Err(err),
        };

        let page = repo
            .count_notes()
            .and_then(|total| Ok((total, repo.list_notes_page(limit, offset)?)));
        match page {
            Ok((total, notes)) => {
                let has_more = u64::from(offset) + (notes.len() as u64) < total;
                debug!(
                    "event=note_page module=service status=ok limit={} offset={} count={} total={} has_more={}",
                    limit,
                    offset,
                    notes.len(),
                    total,
                    has_more
                );
                Envelope::Ok(NotePage {
                    notes,
                    total,
                    has_more,
                })
            }
            Err(err) => store_failure("note_page", None, "Failed to get notes", &err),
        }
    }

    /// Replaces title/content and refreshes `updatedAt`.
    ///
    /// Updating an id with no row still succeeds.
    pub fn update(&self, id: NoteId, title: &str, content: &str) -> UpdateNoteResult {
        let repo = match self.repo("note_update") {
            Ok(repo) => repo,
            Err(err) => return Envelope::Err(err),
        };
        if let Err(err) = validate_title(title) {
            return invalid_input("note_update", Some(id), err);
        }

        match repo.update_note(id, title, content) {
            Ok(changed) => {
                if changed == 0 {
                    warn!("event=note_update module=service status=noop id={id} rows=0");
                } else {
                    info!(
                        "event=note_update module=service status=ok id={} title_len={} content_len={}",
                        id,
                        title.chars().count(),
                        content.len()
                    );
                }
                Envelope::Ok(Ack {
                    message: "Note updated successfully".to_string(),
                })
            }
            Err(err) => store_failure("note_update", Some(id), "Failed to update note", &err),
        }
    }

    /// Hard-deletes one note.
    ///
    /// Deleting an id with no row still succeeds.
    pub fn delete(&self, id: NoteId) -> DeleteNoteResult {
        let repo = match self.repo("note_delete") {
            Ok(repo) => repo,
            Err(err) => return Envelope::Err(err),
        };

        match repo.delete_note(id) {
            Ok(removed) => {
                if removed == 0 {
                    warn!("event=note_delete module=service status=noop id={id} rows=0");
                } else {
                    info!("event=note_delete module=service status=ok id={id}");
                }
                Envelope::Ok(Ack {
                    message: "Note deleted successfully".to_string(),
                })
            }
            Err(err) => store_failure("note_delete", Some(id), "Failed to delete note", &err),
        }
    }

    /// Releases the store handle. Safe to call repeatedly and at shutdown.
    pub fn close(&mut self) {
        let previous = std::mem::replace(&mut self.state, ServiceState::Closed);
        if let ServiceState::Ready(conn) = previous {
            match conn.close() {
                Ok(()) => info!("event=service_close module=service status=ok"),
                Err((_conn, err)) => error!(
                    "event=service_close module=service status=error error_code=db_close_failed error={}",
                    err
                ),
            }
        }
        self.release_registration();
    }

    fn repo(&self, op: &'static str) -> Result<SqliteNoteRepository<'_>, EnvelopeError> {
        match &self.state {
            ServiceState::Ready(conn) => Ok(SqliteNoteRepository::new(conn)),
            ServiceState::Uninitialized => {
                error!("event={op} module=service status=error error_code=not_initialized");
                Err(EnvelopeError::new(
                    ErrorKind::NotInitialized,
                    "Notes service has not been initialized",
                ))
            }
            ServiceState::Closed => {
                warn!("event={op} module=service status=error error_code=store_unavailable");
                Err(EnvelopeError::new(
                    ErrorKind::StoreUnavailable,
                    "Notes store is closed",
                ))
            }
        }
    }

    fn release_registration(&mut self) {
        if let Some(key) = self.registered.take() {
            lock_registry().remove(&key);
        }
    }
}

impl Drop for NoteService {
    fn drop(&mut self) {
        self.close();
    }
}

/// Resolves `path` to one spelling per file: `..` segments and symlinks
/// are resolved, and a not-yet-created file is keyed under its canonical
/// parent directory.
fn registry_key(path: &Path) -> Result<PathBuf, ServiceError> {
    let invalid = |err: std::io::Error| ServiceError::InvalidPath {
        path: path.to_path_buf(),
        reason: err.to_string(),
    };

    if let Ok(existing) = std::fs::canonicalize(path) {
        return Ok(existing);
    }

    let absolute = std::path::absolute(path).map_err(invalid)?;
    let file_name = absolute.file_name().ok_or_else(|| ServiceError::InvalidPath {
        path: path.to_path_buf(),
        reason: "path has no file name".to_string(),
    })?;
    let parent = match absolute.parent() {
        Some(parent) => parent,
        None => return Ok(absolute.clone()),
    };
    std::fs::create_dir_all(parent).map_err(invalid)?;
    let parent = std::fs::canonicalize(parent).map_err(invalid)?;
    Ok(parent.join(file_name))
}

fn lock_registry() -> MutexGuard<'static, HashSet<PathBuf>> {
    // The set stays consistent even if a holder panicked mid-insert.
    OPEN_STORES
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn invalid_input<T>(op: &str, id: Option<NoteId>, err: impl Display) -> Envelope<T> {
    warn!(
        "event={} module=service status=error id={} error_code=invalid_input error={}",
        op,
        format_id(id),
        err
    );
    Envelope::failure(ErrorKind::InvalidInput, capitalize(&err.to_string()))
}

fn store_failure<T>(op: &str, id: Option<NoteId>, summary: &str, err: &RepoError) -> Envelope<T> {
    error!(
        "event={} module=service status=error id={} error_code=store_failure error={}",
        op,
        format_id(id),
        err
    );
    Envelope::failure(ErrorKind::StoreFailure, format!("{summary}: {err}"))
}

fn format_id(id: Option<NoteId>) -> String {
    id.map_or_else(|| "-".to_string(), |id| id.to_string())
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
