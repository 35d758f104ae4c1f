use inbox_note_core::db::open_db_in_memory;
use inbox_note_core::{
    build_note, ActionConfig, ActionQuery, ActionStatus, NoteConfig, NoteRepository, NoteType,
    NoteValidationError, RepoError, SettingsStore, SqliteNoteRepository, SqliteSettingsStore,
};
use rusqlite::Connection;
use serde_json::json;

fn note_with_actions(name: &str, content: &str) -> NoteConfig {
    NoteConfig {
        content: Some(content.to_string()),
        content_data: Some(json!({"campaign": "spring", "weight": 3})),
        kind: Some(NoteType::Actionable),
        date_reminder: Some(1_700_000_500),
        actions: vec![
            ActionConfig {
                name: Some("open".to_string()),
                label: Some("Open".to_string()),
                query: Some("https://shop.test/admin".to_string()),
                status: Some(ActionStatus::Unactioned),
                primary: Some(true),
            },
            ActionConfig::default(),
        ],
        ..NoteConfig::named(name)
    }
}

#[test]
fn save_and_get_roundtrip_keeps_every_field() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let note = build_note(note_with_actions("welcome", "Hi <em>there</em>"), 1_700_000_000);
    let id = repo.save(&note).unwrap();

    let loaded = repo.get_note(id).unwrap().unwrap();
    assert_eq!(loaded, note);
    assert_eq!(loaded.actions[1].name, "action-1");
    assert_eq!(loaded.actions[1].query, ActionQuery::NoNavigation);
}

#[test]
fn loaded_note_exposes_markup_free_preview() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let note = build_note(note_with_actions("welcome", "Hi <em>there</em>"), 0);
    let id = repo.save(&note).unwrap();

    let loaded = repo.list_by_name("welcome").unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, id);
    assert_eq!(loaded[0].preview_text().as_deref(), Some("Hi there"));
}

#[test]
fn names_are_not_unique_and_lookup_is_oldest_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let first = build_note(NoteConfig::named("dup"), 0);
    let second = build_note(NoteConfig::named("dup"), 0);
    let other = build_note(NoteConfig::named("other"), 0);
    repo.save(&first).unwrap();
    repo.save(&second).unwrap();
    repo.save(&other).unwrap();

    assert_eq!(repo.find_by_name("dup").unwrap(), vec![first.id, second.id]);
    assert_eq!(repo.list_by_name("other").unwrap().len(), 1);
    assert!(repo.find_by_name("missing").unwrap().is_empty());
}

#[test]
fn delete_by_name_removes_notes_and_cascades_actions() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    repo.save(&build_note(note_with_actions("gone", "a"), 0)).unwrap();
    repo.save(&build_note(note_with_actions("gone", "b"), 0)).unwrap();
    let kept = build_note(note_with_actions("kept", "c"), 0);
    repo.save(&kept).unwrap();

    assert_eq!(repo.delete_by_name("gone").unwrap(), 2);
    assert!(repo.find_by_name("gone").unwrap().is_empty());
    assert_eq!(count_rows(&conn, "note_actions"), 2);
    assert_eq!(repo.get_note(kept.id).unwrap().unwrap().actions.len(), 2);
    assert_eq!(repo.delete_by_name("gone").unwrap(), 0);
}

#[test]
fn save_rejects_missing_note_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let err = repo.save(&build_note(NoteConfig::default(), 0)).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(NoteValidationError::EmptyName)
    ));
    assert_eq!(count_rows(&conn, "notes"), 0);
}

#[test]
fn save_rejects_colliding_generated_action_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let config = NoteConfig {
        actions: vec![
            ActionConfig::default(),
            ActionConfig {
                name: Some("action-0".to_string()),
                ..ActionConfig::default()
            },
        ],
        ..NoteConfig::named("clash")
    };
    let err = repo.save(&build_note(config, 0)).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(NoteValidationError::DuplicateActionName(_))
    ));
    assert_eq!(count_rows(&conn, "notes"), 0);
}

#[test]
fn repositories_refuse_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqliteNoteRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("notes"))
    ));
    assert!(matches!(
        SqliteSettingsStore::try_new(&conn),
        Err(RepoError::MissingRequiredTable("settings"))
    ));
}

#[test]
fn settings_store_reads_typed_values() {
    let conn = open_db_in_memory().unwrap();
    let settings = SqliteSettingsStore::try_new(&conn).unwrap();

    assert_eq!(settings.get("absent").unwrap(), None);
    assert_eq!(settings.get_or("absent", "fallback").unwrap(), "fallback");
    assert!(settings.get_bool("absent", true).unwrap());

    settings.set("flag", "yes").unwrap();
    settings.set("count", "12").unwrap();
    settings.set("count", "13").unwrap();
    assert!(settings.get_bool("flag", false).unwrap());
    assert_eq!(settings.get_i64("count").unwrap(), Some(13));

    settings.set("count", "many").unwrap();
    assert!(matches!(
        settings.get_i64("count"),
        Err(RepoError::InvalidData(_))
    ));
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
