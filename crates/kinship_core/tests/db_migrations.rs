use kinship_core::db::migrations::{apply_migrations, latest_version};
use kinship_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["people", "person_relations", "person_tags", "life_events"] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kinship.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "people");
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
fn deleting_person_row_cascades_to_detail_rows() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO people (id, position, first_name, last_name)
         VALUES ('p1', 0, 'Ada', 'Byron');
         INSERT INTO person_relations (person_id, role, related_id, position)
         VALUES ('p1', 'child', 'p2', 0);
         INSERT INTO person_tags (person_id, position, tag) VALUES ('p1', 0, 'poet');
         DELETE FROM people WHERE id = 'p1';",
    )
    .unwrap();

    for table in ["person_relations", "person_tags"] {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0, "{table} kept rows of a deleted person");
    }
}

#[test]
fn schema_rejects_unknown_relation_role() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO people (id, position, first_name, last_name) VALUES ('p1', 0, 'A', 'B');",
    )
    .unwrap();
    let result = conn.execute(
        "INSERT INTO person_relations (person_id, role, related_id, position)
         VALUES ('p1', 'sibling', 'p2', 0);",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn people_table_holds_only_snapshot_columns() {
    let conn = open_db_in_memory().unwrap();
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('people');").unwrap();
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        columns,
        vec![
            "id",
            "position",
            "first_name",
            "last_name",
            "nickname",
            "gender",
            "birth_date",
            "death_date",
            "photo",
            "notes",
            "collapsed",
        ]
    );
}

#[test]
fn failing_migration_is_named_and_leaves_version_unchanged() {
    let mut conn = Connection::open_in_memory().unwrap();
    // A view named `people` cannot be indexed by the first migration.
    conn.execute_batch("CREATE VIEW people AS SELECT 1 AS position;")
        .unwrap();

    let err = apply_migrations(&mut conn).unwrap_err();
    match err {
        DbError::MigrationFailed { version, name, .. } => {
            assert_eq!(version, 1);
            assert_eq!(name, "people");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(schema_version(&conn), 0);
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
