//! Department repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for the department tree.
//! - Keep SQL details and child/employee ordering inside the repository.
//!
//! # Invariants
//! - Children load in `id ASC` order; employees in `full_name ASC, id ASC`.
//! - Deleting a department cascades to descendants and their employees via
//!   foreign keys.
//! - Reassign-then-delete runs in one immediate transaction.

use crate::db::DbError;
use crate::model::department::{Department, DepartmentChanges, DepartmentId};
use crate::model::tree::DepartmentTree;
use crate::repo::employee_repo::{list_employees, reassign_employees};
use crate::repo::{build_tree, ensure_connection_ready, RepoError, RepoResult};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};

const DEPARTMENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    parent_id,
    created_at
FROM departments";

/// Repository interface for department tree operations.
pub trait DepartmentRepository {
    /// Creates one department under an optional parent.
    fn create_department(
        &self,
        name: &str,
        parent_id: Option<DepartmentId>,
    ) -> RepoResult<Department>;
    /// Loads one department record without relations.
    fn get_department(&self, id: DepartmentId) -> RepoResult<Department>;
    /// Loads one department with `depth` levels of children.
    fn get_department_tree(
        &self,
        id: DepartmentId,
        depth: usize,
        include_employees: bool,
    ) -> RepoResult<DepartmentTree>;
    /// Exact (name, parent) lookup. Absence is not an error.
    fn find_by_name_and_parent(
        &self,
        name: &str,
        parent_id: Option<DepartmentId>,
    ) -> RepoResult<Option<Department>>;
    /// Writes only the fields present in `changes`.
    fn update_department(&self, id: DepartmentId, changes: &DepartmentChanges)
        -> RepoResult<()>;
    /// Deletes one department together with its subtree.
    fn delete_department(&self, id: DepartmentId) -> RepoResult<()>;
    /// Moves direct employees to `reassign_to_id`, then deletes `id`.
    fn delete_department_with_reassign(
        &self,
        id: DepartmentId,
        reassign_to_id: DepartmentId,
    ) -> RepoResult<()>;
    /// Returns whether the department exists.
    fn exists(&self, id: DepartmentId) -> RepoResult<bool>;
    /// Total number of stored departments.
    fn count_departments(&self) -> RepoResult<u64>;
}

impl<T: DepartmentRepository + ?Sized> DepartmentRepository for &T {
    fn create_department(
        &self,
        name: &str,
        parent_id: Option<DepartmentId>,
    ) -> RepoResult<Department> {
        (**self).create_department(name, parent_id)
    }

    fn get_department(&self, id: DepartmentId) -> RepoResult<Department> {
        (**self).get_department(id)
    }

    fn get_department_tree(
        &self,
        id: DepartmentId,
        depth: usize,
        include_employees: bool,
    ) -> RepoResult<DepartmentTree> {
        (**self).get_department_tree(id, depth, include_employees)
    }

    fn find_by_name_and_parent(
        &self,
        name: &str,
        parent_id: Option<DepartmentId>,
    ) -> RepoResult<Option<Department>> {
        (**self).find_by_name_and_parent(name, parent_id)
    }

    fn update_department(
        &self,
        id: DepartmentId,
        changes: &DepartmentChanges,
    ) -> RepoResult<()> {
        (**self).update_department(id, changes)
    }

    fn delete_department(&self, id: DepartmentId) -> RepoResult<()> {
        (**self).delete_department(id)
    }

    fn delete_department_with_reassign(
        &self,
        id: DepartmentId,
        reassign_to_id: DepartmentId,
    ) -> RepoResult<()> {
        (**self).delete_department_with_reassign(id, reassign_to_id)
    }

    fn exists(&self, id: DepartmentId) -> RepoResult<bool> {
        (**self).exists(id)
    }

    fn count_departments(&self) -> RepoResult<u64> {
        (**self).count_departments()
    }
}

/// SQLite-backed department repository.
pub struct SqliteDepartmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDepartmentRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            "departments",
            &["id", "name", "parent_id", "created_at"],
        )?;
        Ok(Self { conn })
    }
}

impl DepartmentRepository for SqliteDepartmentRepository<'_> {
    fn create_department(
        &self,
        name: &str,
        parent_id: Option<DepartmentId>,
    ) -> RepoResult<Department> {
        let inserted = self.conn.execute(
            "INSERT INTO departments (name, parent_id) VALUES (?1, ?2);",
            params![name, parent_id],
        );
        if let Err(err) = inserted {
            return Err(map_write_error(DbError::Sqlite(err), name, parent_id));
        }

        let id = self.conn.last_insert_rowid();
        debug!("event=department_insert module=repo status=ok department_id={id}");
        load_required_department(self.conn, id)
    }

    fn get_department(&self, id: DepartmentId) -> RepoResult<Department> {
        load_required_department(self.conn, id)
    }

    fn get_department_tree(
        &self,
        id: DepartmentId,
        depth: usize,
        include_employees: bool,
    ) -> RepoResult<DepartmentTree> {
        let root = load_required_department(self.conn, id)?;
        build_tree(
            root,
            depth,
            include_employees,
            |parent_id| list_child_departments(self.conn, parent_id),
            |department_id| list_employees(self.conn, department_id),
        )
    }

    fn find_by_name_and_parent(
        &self,
        name: &str,
        parent_id: Option<DepartmentId>,
    ) -> RepoResult<Option<Department>> {
        let sql = match parent_id {
            Some(_) => format!("{DEPARTMENT_SELECT_SQL} WHERE name = ?1 AND parent_id = ?2;"),
            None => format!("{DEPARTMENT_SELECT_SQL} WHERE name = ?1 AND parent_id IS NULL;"),
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let found = match parent_id {
            Some(parent_id) => stmt
                .query_row(params![name, parent_id], parse_department_row)
                .optional()?,
            None => stmt
                .query_row(params![name], parse_department_row)
                .optional()?,
        };
        Ok(found)
    }

    fn update_department(
        &self,
        id: DepartmentId,
        changes: &DepartmentChanges,
    ) -> RepoResult<()> {
        let mut assignments = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(name) = &changes.name {
            assignments.push("name = ?");
            bind_values.push(Value::Text(name.clone()));
        }
        if let Some(parent_id) = changes.parent_id {
            assignments.push("parent_id = ?");
            bind_values.push(Value::Integer(parent_id));
        }

        if assignments.is_empty() {
            return if self.exists(id)? {
                Ok(())
            } else {
                Err(RepoError::DepartmentNotFound(id))
            };
        }

        bind_values.push(Value::Integer(id));
        let sql = format!(
            "UPDATE departments SET {} WHERE id = ?;",
            assignments.join(", ")
        );

        let changed = match self.conn.execute(&sql, params_from_iter(bind_values)) {
            Ok(changed) => changed,
            Err(err) => {
                let db_error = DbError::Sqlite(err);
                if !db_error.is_unique_violation() {
                    return Err(map_write_error(db_error, "", changes.parent_id));
                }
                // Report the effective (parent, name) pair that collided.
                let current = load_required_department(self.conn, id)?;
                return Err(RepoError::AlreadyExists {
                    parent_id: changes.parent_id.or(current.parent_id),
                    name: changes.name.clone().unwrap_or(current.name),
                });
            }
        };

        if changed == 0 {
            return Err(RepoError::DepartmentNotFound(id));
        }
        Ok(())
    }

    fn delete_department(&self, id: DepartmentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM departments WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::DepartmentNotFound(id));
        }
        Ok(())
    }

    fn delete_department_with_reassign(
        &self,
        id: DepartmentId,
        reassign_to_id: DepartmentId,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let moved = reassign_employees(&tx, id, reassign_to_id)?;
        let changed = tx.execute("DELETE FROM departments WHERE id = ?1;", [id])?;
        if changed == 0 {
            // Dropping `tx` rolls the reassignment back.
            return Err(RepoError::DepartmentNotFound(id));
        }

        tx.commit()?;
        debug!(
            "event=department_delete_reassign module=repo status=ok department_id={id} reassign_to_id={reassign_to_id} moved_employees={moved}"
        );
        Ok(())
    }

    fn exists(&self, id: DepartmentId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM departments WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn count_departments(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM departments;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative department count {count}")))
    }
}

fn load_required_department(conn: &Connection, id: DepartmentId) -> RepoResult<Department> {
    let mut stmt = conn.prepare(&format!("{DEPARTMENT_SELECT_SQL} WHERE id = ?1;"))?;
    stmt.query_row([id], parse_department_row)
        .optional()?
        .ok_or(RepoError::DepartmentNotFound(id))
}

fn list_child_departments(
    conn: &Connection,
    parent_id: DepartmentId,
) -> RepoResult<Vec<Department>> {
    let mut stmt = conn.prepare(&format!(
        "{DEPARTMENT_SELECT_SQL} WHERE parent_id = ?1 ORDER BY id ASC;"
    ))?;
    let mut rows = stmt.query([parent_id])?;
    let mut children = Vec::new();
    while let Some(row) = rows.next()? {
        children.push(parse_department_row(row)?);
    }
    Ok(children)
}

fn parse_department_row(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get("id")?,
        name: row.get("name")?,
        parent_id: row.get("parent_id")?,
        created_at: row.get("created_at")?,
    })
}

fn map_write_error(
    db_error: DbError,
    name: &str,
    parent_id: Option<DepartmentId>,
) -> RepoError {
    if db_error.is_unique_violation() {
        return RepoError::AlreadyExists {
            parent_id,
            name: name.to_string(),
        };
    }
    if db_error.is_foreign_key_violation() {
        if let Some(parent_id) = parent_id {
            return RepoError::DepartmentNotFound(parent_id);
        }
    }
    RepoError::Db(db_error)
}
