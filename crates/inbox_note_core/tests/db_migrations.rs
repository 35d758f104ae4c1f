use inbox_note_core::db::migrations::latest_version;
use inbox_note_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "notes");
    assert_table_exists(&conn, "note_actions");
    assert_table_exists(&conn, "settings");
}

#[test]
fn foreign_keys_are_enabled() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbox.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "notes");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn notes_reject_blank_names_and_unknown_types() {
    let conn = open_db_in_memory().unwrap();

    let blank_name = insert_note(&conn, "n-1", "   ", "informational");
    assert!(is_constraint_violation(blank_name));
    let bad_type = insert_note(&conn, "n-2", "welcome", "urgent");
    assert!(is_constraint_violation(bad_type));
    insert_note(&conn, "n-3", "welcome", "marketing").unwrap();
}

#[test]
fn action_names_are_unique_within_a_note_only() {
    let conn = open_db_in_memory().unwrap();
    insert_note(&conn, "n-1", "welcome", "informational").unwrap();
    insert_note(&conn, "n-2", "welcome", "informational").unwrap();

    insert_action(&conn, "n-1", 0, "open").unwrap();
    assert!(is_constraint_violation(insert_action(&conn, "n-1", 1, "open")));
    insert_action(&conn, "n-2", 0, "open").unwrap();
}

#[test]
fn deleting_a_note_cascades_to_its_actions() {
    let conn = open_db_in_memory().unwrap();
    insert_note(&conn, "n-1", "welcome", "informational").unwrap();
    insert_action(&conn, "n-1", 0, "open").unwrap();
    insert_action(&conn, "n-1", 1, "dismiss").unwrap();

    conn.execute("DELETE FROM notes WHERE uuid = 'n-1';", [])
        .unwrap();
    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM note_actions;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn actions_require_an_existing_note() {
    let conn = open_db_in_memory().unwrap();
    assert!(is_constraint_violation(insert_action(&conn, "missing", 0, "open")));
}

fn insert_note(conn: &Connection, uuid: &str, name: &str, kind: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO notes (uuid, name, type, locale, title, content, icon, source, date_created)
         VALUES (?1, ?2, ?3, 'en_US', 'Title', 'Body', 'info', 'tests', 0);",
        [uuid, name, kind],
    )
}

fn insert_action(
    conn: &Connection,
    note_uuid: &str,
    position: i64,
    name: &str,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO note_actions (note_uuid, position, name, label, status)
         VALUES (?1, ?2, ?3, 'Label', 'actioned');",
        rusqlite::params![note_uuid, position, name],
    )
}

fn is_constraint_violation(result: rusqlite::Result<usize>) -> bool {
    matches!(
        result,
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
