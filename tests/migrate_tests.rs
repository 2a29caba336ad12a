// tests/migrate_tests.rs
//! End-to-end migration: round trips, failure atomicity and preconditions

mod common;
mod support;

use std::fs;

use rusqlite::Connection;
use sqlcipher_migrate::config::MigrationSettings;
use sqlcipher_migrate::{CoreError, DatabaseStatus, Direction, ErrorKind, Migrator};
use support::{
    create_sample_db, logical_contents, migrator, open_encrypted, open_plain, passphrase,
    Workspace, PASSPHRASE,
};

#[test]
fn encrypt_then_decrypt_preserves_every_table() {
    common::setup();
    let ws = Workspace::new();
    create_sample_db(&ws.db);
    let before = logical_contents(&open_plain(&ws.db));
    let m = migrator();
    let pass = passphrase(PASSPHRASE);

    let report = m.encrypt(&ws.db, &pass, None).unwrap();
    assert_eq!(report.direction, Direction::Encrypt);
    // users, notes, audit, empty_things, order items
    assert_eq!(report.total_rows(), 2 + 3 + 3 + 0 + 1);
    assert_eq!(m.check_status(&ws.db), DatabaseStatus::Locked);
    assert_eq!(logical_contents(&open_encrypted(&ws.db, PASSPHRASE)), before);

    let raw = fs::read(&ws.db).unwrap();
    assert!(!raw.windows(17).any(|w| w == b"alice@example.com"));

    let report = m.decrypt(&ws.db, &pass, None).unwrap();
    assert_eq!(report.direction, Direction::Decrypt);
    assert_eq!(m.check_status(&ws.db), DatabaseStatus::Unencrypted);
    assert_eq!(logical_contents(&open_plain(&ws.db)), before);

    assert_eq!(ws.entries(), ["app.db"]);
}

#[test]
fn secondary_objects_and_header_survive_round_trip() {
    common::setup();
    let ws = Workspace::new();
    create_sample_db(&ws.db);
    let m = migrator();
    let pass = passphrase(PASSPHRASE);

    m.encrypt(&ws.db, &pass, None).unwrap();
    m.decrypt(&ws.db, &pass, None).unwrap();

    let conn = open_plain(&ws.db);
    let objects: Vec<(String, String)> = conn
        .prepare("SELECT type, name FROM sqlite_master WHERE type != 'table' AND sql IS NOT NULL ORDER BY name")
        .unwrap()
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
        .unwrap()
        .collect::<rusqlite::Result<_>>()
        .unwrap();
    assert_eq!(
        objects,
        [
            ("index".to_owned(), "idx_notes_user".to_owned()),
            ("view".to_owned(), "user_names".to_owned()),
            ("trigger".to_owned(), "users_audit".to_owned()),
        ]
    );

    let user_version: i64 = conn
        .pragma_query_value(None, "user_version", |r| r.get(0))
        .unwrap();
    assert_eq!(user_version, 7);

    // The trigger still works, and the deleted id 3 is not handed out again
    conn.execute("INSERT INTO users (name) VALUES ('dave')", [])
        .unwrap();
    let id: i64 = conn
        .query_row("SELECT id FROM users WHERE name = 'dave'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(id, 4);
    let audited: i64 = conn
        .query_row("SELECT count(*) FROM audit", [], |r| r.get(0))
        .unwrap();
    assert_eq!(audited, 4);
}

#[test]
fn failure_mid_copy_leaves_original_untouched() {
    common::setup();
    let ws = Workspace::new();
    {
        // A row that violates the CHECK constraint only fails once it is re-inserted
        let conn = Connection::open(&ws.db).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE readings (v INTEGER CHECK (v > 0));
            PRAGMA ignore_check_constraints = ON;
            INSERT INTO readings VALUES (1), (2), (-3), (4);
            "#,
        )
        .unwrap();
    }
    let original = fs::read(&ws.db).unwrap();

    let err = migrator()
        .encrypt(&ws.db, &passphrase(PASSPHRASE), None)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CopyFailed);
    assert!(err.to_string().contains("readings"));
    assert_eq!(fs::read(&ws.db).unwrap(), original);
    assert_eq!(migrator().check_status(&ws.db), DatabaseStatus::Unencrypted);
    assert_eq!(ws.entries(), ["app.db"]);
}

#[test]
fn failure_mid_decrypt_leaves_encrypted_file_untouched() {
    common::setup();
    let ws = Workspace::new();
    Connection::open(&ws.db)
        .unwrap()
        .execute_batch("CREATE TABLE readings (v INTEGER CHECK (v > 0)); INSERT INTO readings VALUES (1), (2);")
        .unwrap();
    let m = migrator();
    let pass = passphrase(PASSPHRASE);
    m.encrypt(&ws.db, &pass, None).unwrap();
    open_encrypted(&ws.db, PASSPHRASE)
        .execute_batch("PRAGMA ignore_check_constraints = ON; INSERT INTO readings VALUES (-3);")
        .unwrap();
    let encrypted = fs::read(&ws.db).unwrap();

    let err = m.decrypt(&ws.db, &pass, None).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CopyFailed);
    assert!(err.to_string().contains("readings"));
    assert_eq!(fs::read(&ws.db).unwrap(), encrypted);
    assert_eq!(m.check_status(&ws.db), DatabaseStatus::Locked);
    assert_eq!(ws.entries(), ["app.db"]);
}

#[test]
fn child_table_declared_before_its_parent_round_trips() {
    common::setup();
    let ws = Workspace::new();
    Connection::open(&ws.db)
        .unwrap()
        .execute_batch(
            r#"
            CREATE TABLE child (id INTEGER PRIMARY KEY, parent_id INTEGER REFERENCES parent(id));
            CREATE TABLE parent (id INTEGER PRIMARY KEY);
            INSERT INTO parent VALUES (1);
            INSERT INTO child VALUES (10, 1);
            "#,
        )
        .unwrap();
    let before = logical_contents(&open_plain(&ws.db));
    let m = migrator();
    let pass = passphrase(PASSPHRASE);

    m.encrypt(&ws.db, &pass, None).unwrap();
    assert_eq!(logical_contents(&open_encrypted(&ws.db, PASSPHRASE)), before);
    m.decrypt(&ws.db, &pass, None).unwrap();
    assert_eq!(logical_contents(&open_plain(&ws.db)), before);
}

#[test]
fn self_reference_to_a_later_row_round_trips() {
    common::setup();
    let ws = Workspace::new();
    {
        let conn = Connection::open(&ws.db).unwrap();
        // Row 1 points at row 2, which is inserted first
        conn.execute_batch(
            r#"
            CREATE TABLE emp (id INTEGER PRIMARY KEY, boss INTEGER REFERENCES emp(id));
            INSERT INTO emp VALUES (2, NULL);
            INSERT INTO emp VALUES (1, 2);
            "#,
        )
        .unwrap();
        let violations: i64 = conn
            .query_row("SELECT count(*) FROM pragma_foreign_key_check", [], |r| r.get(0))
            .unwrap();
        assert_eq!(violations, 0);
    }
    let before = logical_contents(&open_plain(&ws.db));
    let m = migrator();
    let pass = passphrase(PASSPHRASE);

    m.encrypt(&ws.db, &pass, None).unwrap();
    assert_eq!(logical_contents(&open_encrypted(&ws.db, PASSPHRASE)), before);
    m.decrypt(&ws.db, &pass, None).unwrap();
    assert_eq!(logical_contents(&open_plain(&ws.db)), before);
    assert_eq!(ws.entries(), ["app.db"]);
}

#[test]
fn decrypt_with_wrong_passphrase_touches_nothing() {
    common::setup();
    let ws = Workspace::new();
    create_sample_db(&ws.db);
    let m = migrator();
    m.encrypt(&ws.db, &passphrase(PASSPHRASE), None).unwrap();
    let encrypted = fs::read(&ws.db).unwrap();

    let err = m.decrypt(&ws.db, &passphrase("wrong"), None).unwrap_err();

    assert!(matches!(err, CoreError::InvalidPassphraseOrCorrupt));
    assert_eq!(fs::read(&ws.db).unwrap(), encrypted);
    assert_eq!(ws.entries(), ["app.db"]);
}

#[test]
fn encrypting_an_encrypted_file_fails_cleanly() {
    common::setup();
    let ws = Workspace::new();
    create_sample_db(&ws.db);
    let m = migrator();
    m.encrypt(&ws.db, &passphrase(PASSPHRASE), None).unwrap();
    let encrypted = fs::read(&ws.db).unwrap();

    let err = m
        .encrypt(&ws.db, &passphrase(PASSPHRASE), None)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CopyFailed);
    assert_eq!(fs::read(&ws.db).unwrap(), encrypted);
    assert_eq!(ws.entries(), ["app.db"]);
}

#[test]
fn empty_database_encrypts_to_valid_empty_database() {
    common::setup();
    let ws = Workspace::new();
    Connection::open(&ws.db)
        .unwrap()
        .execute_batch("PRAGMA user_version = 1;")
        .unwrap();

    let report = migrator()
        .encrypt(&ws.db, &passphrase(PASSPHRASE), None)
        .unwrap();

    assert!(report.tables.is_empty());
    assert_eq!(migrator().check_status(&ws.db), DatabaseStatus::Locked);
    let conn = open_encrypted(&ws.db, PASSPHRASE);
    let objects: i64 = conn
        .query_row("SELECT count(*) FROM sqlite_master", [], |r| r.get(0))
        .unwrap();
    assert_eq!(objects, 0);
}

#[test]
fn missing_source_is_source_not_found() {
    common::setup();
    let ws = Workspace::new();

    let err = migrator()
        .encrypt(&ws.db, &passphrase(PASSPHRASE), None)
        .unwrap_err();
    assert!(matches!(err, CoreError::SourceNotFound(_)));

    let err = migrator()
        .decrypt(&ws.db, &passphrase(PASSPHRASE), None)
        .unwrap_err();
    assert!(matches!(err, CoreError::SourceNotFound(_)));
    assert!(ws.entries().is_empty());
}

#[test]
fn missing_engine_is_reported_before_any_work() {
    common::setup();
    let ws = Workspace::new();
    create_sample_db(&ws.db);
    let original = fs::read(&ws.db).unwrap();

    let err = Migrator::without_cipher(MigrationSettings::default())
        .encrypt(&ws.db, &passphrase(PASSPHRASE), None)
        .unwrap_err();

    assert!(matches!(err, CoreError::EngineUnavailable));
    assert_eq!(fs::read(&ws.db).unwrap(), original);
}

#[test]
fn empty_passphrase_is_rejected() {
    common::setup();
    let ws = Workspace::new();
    create_sample_db(&ws.db);

    let err = migrator()
        .encrypt(&ws.db, &passphrase(""), None)
        .unwrap_err();
    assert!(matches!(err, CoreError::NullPassphrase));
    assert_eq!(migrator().check_status(&ws.db), DatabaseStatus::Unencrypted);
}

#[test]
fn explicit_temp_path_is_used_and_consumed() {
    common::setup();
    let ws = Workspace::new();
    create_sample_db(&ws.db);
    let temp = ws.dir.path().join("staging.db");

    migrator()
        .encrypt(&ws.db, &passphrase(PASSPHRASE), Some(&temp))
        .unwrap();

    assert!(!temp.exists());
    assert_eq!(ws.entries(), ["app.db"]);
    assert_eq!(migrator().check_status(&ws.db), DatabaseStatus::Locked);
}

#[test]
fn occupied_temp_path_is_refused_and_preserved() {
    common::setup();
    let ws = Workspace::new();
    create_sample_db(&ws.db);
    let original = fs::read(&ws.db).unwrap();
    let temp = ws.dir.path().join("staging.db");
    fs::write(&temp, b"someone else's file").unwrap();

    let err = migrator()
        .encrypt(&ws.db, &passphrase(PASSPHRASE), Some(&temp))
        .unwrap_err();

    assert!(matches!(err, CoreError::TempPathOccupied(_)));
    assert_eq!(fs::read(&temp).unwrap(), b"someone else's file");
    assert_eq!(fs::read(&ws.db).unwrap(), original);
}

#[test]
fn passphrase_with_quotes_round_trips() {
    common::setup();
    let ws = Workspace::new();
    create_sample_db(&ws.db);
    let before = logical_contents(&open_plain(&ws.db));
    let pass = passphrase("o'brien's \"vault\" ''");
    let m = migrator();

    m.encrypt(&ws.db, &pass, None).unwrap();
    assert!(m.unlock(&ws.db, &passphrase("o'brien's")).is_err());
    m.decrypt(&ws.db, &pass, None).unwrap();

    assert_eq!(logical_contents(&open_plain(&ws.db)), before);
}

#[cfg(unix)]
#[test]
fn permissions_follow_the_original() {
    use std::os::unix::fs::PermissionsExt;

    common::setup();
    let ws = Workspace::new();
    create_sample_db(&ws.db);
    fs::set_permissions(&ws.db, fs::Permissions::from_mode(0o640)).unwrap();

    migrator()
        .encrypt(&ws.db, &passphrase(PASSPHRASE), None)
        .unwrap();

    let mode = fs::metadata(&ws.db).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o640);
}
