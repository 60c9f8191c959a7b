//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the department/employee store contracts used by services.
//! - Isolate SQLite query details from service orchestration.
//! - Provide an in-memory store with the same observable semantics.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`DepartmentNotFound`,
//!   `AlreadyExists`) in addition to DB transport errors.
//! - (parent, name) uniqueness is enforced by the store itself, not only by
//!   service pre-checks.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::error::ErrorKind;
use crate::model::department::{Department, DepartmentId};
use crate::model::employee::Employee;
use crate::model::tree::DepartmentTree;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod department_repo;
pub mod employee_repo;
pub mod memory;

/// Result type used by repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from department/employee repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target department does not exist.
    DepartmentNotFound(DepartmentId),
    /// Another department already uses this (parent, name) pair.
    AlreadyExists {
        parent_id: Option<DepartmentId>,
        name: String,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DepartmentNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExist,
            _ => ErrorKind::Internal,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::DepartmentNotFound(id) => write!(f, "department not found: {id}"),
            Self::AlreadyExists { parent_id, name } => match parent_id {
                Some(parent_id) => write!(
                    f,
                    "department `{name}` already exists under parent {parent_id}"
                ),
                None => write!(f, "root department `{name}` already exists"),
            },
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "organization repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "organization repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "organization repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid organization data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
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

/// Loads `depth` levels of children below `root`, breadth first.
///
/// Lookups go through the supplied closures so SQLite and in-memory stores
/// share one traversal. A child id seen twice means the stored parent links
/// form a cycle and is reported as invalid data.
pub(crate) fn build_tree(
    root: Department,
    depth: usize,
    include_employees: bool,
    mut children_of: impl FnMut(DepartmentId) -> RepoResult<Vec<Department>>,
    mut employees_of: impl FnMut(DepartmentId) -> RepoResult<Vec<Employee>>,
) -> RepoResult<DepartmentTree> {
    let mut tree = DepartmentTree::new(root);
    let mut frontier = vec![tree.root_id()];

    for _ in 0..depth {
        let mut next = Vec::new();
        for parent_id in frontier {
            for child in children_of(parent_id)? {
                let child_id = child.id;
                if !tree.attach(child) {
                    return Err(RepoError::InvalidData(format!(
                        "department {child_id} appears twice under root {}",
                        tree.root_id()
                    )));
                }
                next.push(child_id);
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    if include_employees {
        for id in tree.ids() {
            let employees = employees_of(id)?;
            tree.set_employees(id, employees);
        }
    }

    Ok(tree)
}

/// Checks that `conn` is migrated and exposes `table` with `columns`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    for column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
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

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
