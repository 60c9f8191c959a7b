use orgtree_core::db::migrations::latest_version;
use orgtree_core::db::{open_db, open_db_in_memory, DbError};
use orgtree_core::{RepoError, SqliteDepartmentRepository, SqliteEmployeeRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "departments");
    assert_table_exists(&conn, "employees");

    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orgtree.sqlite3");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute("INSERT INTO departments (name) VALUES ('Engineering');", [])
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM departments;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

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
fn repositories_reject_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    assert!(matches!(
        SqliteDepartmentRepository::try_new(&conn),
        Err(RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        })
    ));
    assert!(matches!(
        SqliteEmployeeRepository::try_new(&conn),
        Err(RepoError::UninitializedConnection { .. })
    ));
}

#[test]
fn repositories_reject_missing_table() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("DROP TABLE employees;").unwrap();

    assert!(matches!(
        SqliteEmployeeRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("employees"))
    ));
}

#[test]
fn root_name_uniqueness_is_enforced_by_schema() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO departments (name) VALUES ('Sales');", [])
        .unwrap();

    let duplicate = conn.execute("INSERT INTO departments (name) VALUES ('Sales');", []);
    assert!(duplicate.is_err());

    conn.execute("INSERT INTO departments (name) VALUES ('sales');", [])
        .unwrap();
}

#[test]
fn schema_rejects_blank_and_oversized_names() {
    let conn = open_db_in_memory().unwrap();

    assert!(conn
        .execute("INSERT INTO departments (name) VALUES ('');", [])
        .is_err());
    let too_long = "x".repeat(201);
    assert!(conn
        .execute("INSERT INTO departments (name) VALUES (?1);", [too_long])
        .is_err());
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
