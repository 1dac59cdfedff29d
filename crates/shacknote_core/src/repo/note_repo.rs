//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and pagination over the `notes` table.
//! - Keep SQL text and row mapping inside the persistence boundary.
//!
//! # Invariants
//! - Listing order is always `updatedAt DESC, id DESC`.
//! - Timestamps are written by SQLite itself (`strftime(..., 'now')`);
//!   both timestamps of an insert come from one statement and are equal.
//! - Writes never move `updatedAt` before `createdAt`; rows that already
//!   violate this are clamped on read and logged, never fail a listing.
//! - Statements go through the connection's prepared-statement cache.

use crate::db::DbError;
use crate::model::note::{Note, NoteId};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    createdAt,
    updatedAt
FROM notes";

/// SQLite expression producing the stored timestamp format.
const NOW_SQL: &str = "strftime('%Y-%m-%d %H:%M:%f', 'now')";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Inserts one note and returns the store-assigned id.
    fn insert_note(&self, title: &str, content: &str) -> RepoResult<NoteId>;
    /// Gets one note by id.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Lists every note, most recently updated first.
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
    /// Lists at most `limit` notes starting at `offset` in list order.
    fn list_notes_page(&self, limit: u32, offset: u32) -> RepoResult<Vec<Note>>;
    /// Counts all notes.
    fn count_notes(&self) -> RepoResult<u64>;
    /// Replaces title/content and refreshes `updatedAt`. Returns rows changed.
    fn update_note(&self, id: NoteId, title: &str, content: &str) -> RepoResult<usize>;
    /// Hard-deletes one note. Returns rows removed.
    fn delete_note(&self, id: NoteId) -> RepoResult<usize>;
}

/// SQLite-backed notes repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Wraps a connection without checking the schema.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self::new(conn))
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, title: &str, content: &str) -> RepoResult<NoteId> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "INSERT INTO notes (title, content, createdAt, updatedAt)
             VALUES (?1, ?2, {NOW_SQL}, {NOW_SQL});"
        ))?;
        stmt.execute(params![title, content])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt.query_row([id], read_note_row).optional()?;
        Ok(row.map(clamp_timestamps))
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{NOTE_SELECT_SQL} ORDER BY updatedAt DESC, id DESC;"
        ))?;
        let rows = stmt.query_map([], read_note_row)?;
        collect_notes(rows)
    }

    fn list_notes_page(&self, limit: u32, offset: u32) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{NOTE_SELECT_SQL} ORDER BY updatedAt DESC, id DESC LIMIT ?1 OFFSET ?2;"
        ))?;
        let rows = stmt.query_map(
            params![i64::from(limit), i64::from(offset)],
            read_note_row,
        )?;
        collect_notes(rows)
    }

    fn count_notes(&self) -> RepoResult<u64> {
        let mut stmt = self.conn.prepare_cached("SELECT COUNT(*) FROM notes;")?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative note count `{count}`")))
    }

    fn update_note(&self, id: NoteId, title: &str, content: &str) -> RepoResult<usize> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "UPDATE notes
             SET
                title = ?1,
                content = ?2,
                updatedAt = MAX(createdAt, {NOW_SQL})
             WHERE id = ?3;"
        ))?;
        Ok(stmt.execute(params![title, content, id])?)
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<usize> {
        let mut stmt = self.conn.prepare_cached("DELETE FROM notes WHERE id = ?1;")?;
        Ok(stmt.execute([id])?)
    }
}

fn read_note_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        created_at: row.get("createdAt")?,
        updated_at: row.get("updatedAt")?,
    })
}

fn collect_notes(
    rows: impl Iterator<Item = rusqlite::Result<Note>>,
) -> RepoResult<Vec<Note>> {
    let mut notes = Vec::new();
    for row in rows {
        notes.push(clamp_timestamps(row?));
    }
    Ok(notes)
}

/// Repairs a row whose `updatedAt` sorts before `createdAt`.
fn clamp_timestamps(mut note: Note) -> Note {
    if let Err(err) = note.validate() {
        warn!(
            "event=note_read module=repo status=repaired id={} error_code=timestamp_order error={}",
            note.id, err
        );
        note.updated_at = note.created_at.clone();
    }
    note
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let mut stmt = conn.prepare("PRAGMA table_info(notes);")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if columns.is_empty() {
        return Err(RepoError::InvalidData("missing required table `notes`".to_string()));
    }
    for required in ["id", "title", "content", "createdAt", "updatedAt"] {
        if !columns.iter().any(|column| column == required) {
            return Err(RepoError::InvalidData(format!(
                "missing required column `notes.{required}`"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{NoteRepository, RepoError, SqliteNoteRepository};
    use crate::db::open_db_in_memory;
    use rusqlite::Connection;

    #[test]
    fn try_new_rejects_connection_without_notes_table() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteNoteRepository::try_new(&conn)
            .err()
            .expect("unmigrated connection must be rejected");
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("notes")));
    }

    #[test]
    fn insert_sets_equal_timestamps() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteNoteRepository::try_new(&conn).unwrap();
        let id = repo.insert_note("t", "c").unwrap();
        let note = repo.get_note(id).unwrap().unwrap();
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn update_and_delete_report_affected_rows() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteNoteRepository::try_new(&conn).unwrap();
        let id = repo.insert_note("t", "c").unwrap();

        assert_eq!(repo.update_note(id, "t2", "c2").unwrap(), 1);
        assert_eq!(repo.update_note(id + 100, "x", "y").unwrap(), 0);
        assert_eq!(repo.delete_note(id).unwrap(), 1);
        assert_eq!(repo.delete_note(id).unwrap(), 0);
    }

    #[test]
    fn read_path_clamps_rows_with_reversed_timestamps() {
        let conn = open_db_in_memory().unwrap();
        conn.execute(
            "INSERT INTO notes (title, content, createdAt, updatedAt)
             VALUES ('t', 'c', '2024-02-01 00:00:00.000', '2024-01-01 00:00:00.000');",
            [],
        )
        .unwrap();
        let repo = SqliteNoteRepository::try_new(&conn).unwrap();
        repo.insert_note("fine", "c").unwrap();

        let notes = repo.list_notes().unwrap();
        assert_eq!(notes.len(), 2);
        let repaired = notes.iter().find(|note| note.title == "t").unwrap();
        assert_eq!(repaired.updated_at, "2024-02-01 00:00:00.000");
        assert_eq!(repo.list_notes_page(10, 0).unwrap().len(), 2);
        assert_eq!(
            repo.get_note(repaired.id).unwrap().unwrap().updated_at,
            repaired.created_at
        );
    }

    #[test]
    fn update_never_moves_updated_at_before_created_at() {
        let conn = open_db_in_memory().unwrap();
        conn.execute(
            "INSERT INTO notes (title, content, createdAt, updatedAt)
             VALUES ('future', 'c', '2999-01-01 00:00:00.000', '2999-01-01 00:00:00.000');",
            [],
        )
        .unwrap();
        let id = conn.last_insert_rowid();
        let repo = SqliteNoteRepository::try_new(&conn).unwrap();

        assert_eq!(repo.update_note(id, "edited", "c2").unwrap(), 1);
        let stored: String = conn
            .query_row("SELECT updatedAt FROM notes WHERE id = ?1;", [id], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, "2999-01-01 00:00:00.000");
    }
}
