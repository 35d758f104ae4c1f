//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the persistence collaborator consumed by the gatekeeper:
//!   lookup by name, delete by name and save.
//! - Keep SQL details for `notes` and `note_actions` inside this module.
//!
//! # Invariants
//! - `save` calls `Note::validate()` before any SQL mutation.
//! - A note and its actions are written in one transaction.
//! - Name lookups are exact and return rows oldest first.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::note::{
    ActionQuery, ActionStatus, Note, NoteAction, NoteId, NoteType, NoteValidationError,
};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    type,
    locale,
    title,
    content,
    content_data,
    icon,
    source,
    date_created,
    date_reminder,
    is_snoozable
FROM notes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Note violates its invariants; nothing was written.
    Validation(NoteValidationError),
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid note: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "connection is not migrated: missing table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
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

/// Persistence collaborator for inbox notes.
pub trait NoteRepository {
    /// Returns ids of every stored note with this exact name, oldest first.
    fn find_by_name(&self, name: &str) -> RepoResult<Vec<NoteId>>;
    /// Deletes every stored note with this exact name. Returns rows removed.
    fn delete_by_name(&self, name: &str) -> RepoResult<usize>;
    /// Validates and inserts one note with its actions.
    fn save(&self, note: &Note) -> RepoResult<NoteId>;
    /// Loads one note with its actions.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Loads every note with this exact name, oldest first.
    fn list_by_name(&self, name: &str) -> RepoResult<Vec<Note>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when migrations have not been applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        for table in ["notes", "note_actions"] {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn find_by_name(&self, name: &str) -> RepoResult<Vec<NoteId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid FROM notes WHERE name = ?1 ORDER BY rowid ASC;")?;
        let mut rows = stmt.query([name])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get(0)?;
            ids.push(parse_uuid(&uuid_text)?);
        }
        Ok(ids)
    }

    fn delete_by_name(&self, name: &str) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM notes WHERE name = ?1;", [name])?;
        Ok(removed)
    }

    fn save(&self, note: &Note) -> RepoResult<NoteId> {
        note.validate()?;

        let content_data = serde_json::to_string(&note.content_data)
            .map_err(|err| RepoError::InvalidData(format!("content_data: {err}")))?;
        let note_uuid = note.id.to_string();

        // Single writer per process, so the unchecked variant is sufficient.
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO notes (
                uuid,
                name,
                type,
                locale,
                title,
                content,
                content_data,
                icon,
                source,
                date_created,
                date_reminder,
                is_snoozable
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            params![
                note_uuid.as_str(),
                note.name.as_str(),
                note.kind.as_str(),
                note.locale.as_str(),
                note.title.as_str(),
                note.content.as_str(),
                content_data.as_str(),
                note.icon.as_str(),
                note.source.as_str(),
                note.date_created,
                note.date_reminder,
                bool_to_int(note.is_snoozable),
            ],
        )?;

        for (position, action) in note.actions.iter().enumerate() {
            tx.execute(
                "INSERT INTO note_actions (
                    note_uuid,
                    position,
                    name,
                    label,
                    query,
                    status,
                    is_primary
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    note_uuid.as_str(),
                    position as i64,
                    action.name.as_str(),
                    action.label.as_str(),
                    action.query.as_target(),
                    action.status.as_str(),
                    bool_to_int(action.primary),
                ],
            )?;
        }

        tx.commit()?;
        Ok(note.id)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut note = parse_note_row(row)?;
            note.actions = load_actions(self.conn, &note.id)?;
            return Ok(Some(note));
        }
        Ok(None)
    }

    fn list_by_name(&self, name: &str) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL} WHERE name = ?1 ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query([name])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        for note in &mut notes {
            note.actions = load_actions(self.conn, &note.id)?;
        }
        Ok(notes)
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text)?;

    let type_text: String = row.get("type")?;
    let kind = NoteType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid note type `{type_text}` in notes.type"))
    })?;

    let content_data_text: String = row.get("content_data")?;
    let content_data = serde_json::from_str(&content_data_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid json in notes.content_data: {err}"))
    })?;

    Ok(Note {
        id,
        name: row.get("name")?,
        kind,
        locale: row.get("locale")?,
        title: row.get("title")?,
        content: row.get("content")?,
        content_data,
        icon: row.get("icon")?,
        source: row.get("source")?,
        date_created: row.get("date_created")?,
        date_reminder: row.get("date_reminder")?,
        is_snoozable: int_to_bool(row.get("is_snoozable")?, "notes.is_snoozable")?,
        actions: Vec::new(),
    })
}

fn load_actions(conn: &Connection, note_id: &NoteId) -> RepoResult<Vec<NoteAction>> {
    let mut stmt = conn.prepare(
        "SELECT name, label, query, status, is_primary
         FROM note_actions
         WHERE note_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([note_id.to_string()])?;
    let mut actions = Vec::new();
    while let Some(row) = rows.next()? {
        let status_text: String = row.get("status")?;
        let status = ActionStatus::parse(&status_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid action status `{status_text}` in note_actions.status"
            ))
        })?;
        actions.push(NoteAction {
            name: row.get("name")?,
            label: row.get("label")?,
            query: ActionQuery::from(row.get::<_, Option<String>>("query")?),
            status,
            primary: int_to_bool(row.get("is_primary")?, "note_actions.is_primary")?,
        });
    }
    Ok(actions)
}

fn parse_uuid(value: &str) -> RepoResult<NoteId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in notes.uuid")))
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
