//! Employee repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist employees bound to existing departments.
//! - Provide bulk department reassignment used by reassign-mode deletes.
//!
//! # Invariants
//! - Listing order is `full_name ASC, id ASC` (binary collation).
//! - `hired_at` is stored as `YYYY-MM-DD` text or NULL.

use crate::db::DbError;
use crate::model::department::DepartmentId;
use crate::model::employee::{Employee, EmployeeId, NewEmployee};
use crate::model::validation::DATE_FORMAT;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use chrono::NaiveDate;
use log::debug;
use rusqlite::{params, Connection, Row};

const EMPLOYEE_SELECT_SQL: &str = "SELECT
    id,
    department_id,
    full_name,
    position,
    hired_at,
    created_at
FROM employees";

/// Repository interface for employee operations.
pub trait EmployeeRepository {
    /// Creates one employee in an existing department.
    fn create_employee(&self, employee: &NewEmployee) -> RepoResult<Employee>;
    /// Loads one employee by id.
    fn get_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>>;
    /// Lists direct employees of one department.
    fn list_by_department(&self, department_id: DepartmentId) -> RepoResult<Vec<Employee>>;
    /// Moves every direct employee of `from_id` to `to_id`.
    ///
    /// Returns the number of moved employees.
    fn reassign_department(&self, from_id: DepartmentId, to_id: DepartmentId)
        -> RepoResult<usize>;
}

impl<T: EmployeeRepository + ?Sized> EmployeeRepository for &T {
    fn create_employee(&self, employee: &NewEmployee) -> RepoResult<Employee> {
        (**self).create_employee(employee)
    }

    fn get_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        (**self).get_employee(id)
    }

    fn list_by_department(&self, department_id: DepartmentId) -> RepoResult<Vec<Employee>> {
        (**self).list_by_department(department_id)
    }

    fn reassign_department(
        &self,
        from_id: DepartmentId,
        to_id: DepartmentId,
    ) -> RepoResult<usize> {
        (**self).reassign_department(from_id, to_id)
    }
}

/// SQLite-backed employee repository.
pub struct SqliteEmployeeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            "employees",
            &[
                "id",
                "department_id",
                "full_name",
                "position",
                "hired_at",
                "created_at",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl EmployeeRepository for SqliteEmployeeRepository<'_> {
    fn create_employee(&self, employee: &NewEmployee) -> RepoResult<Employee> {
        let inserted = self.conn.execute(
            "INSERT INTO employees (
                department_id,
                full_name,
                position,
                hired_at
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                employee.department_id,
                employee.full_name.as_str(),
                employee.position.as_str(),
                employee
                    .hired_at
                    .map(|date| date.format(DATE_FORMAT).to_string()),
            ],
        );
        if let Err(err) = inserted {
            let db_error = DbError::Sqlite(err);
            if db_error.is_foreign_key_violation() {
                return Err(RepoError::DepartmentNotFound(employee.department_id));
            }
            return Err(db_error.into());
        }

        let id = self.conn.last_insert_rowid();
        debug!(
            "event=employee_insert module=repo status=ok employee_id={id} department_id={}",
            employee.department_id
        );
        self.get_employee(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("employee {id} missing right after insert"))
        })
    }

    fn get_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EMPLOYEE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_employee_row(row)?));
        }
        Ok(None)
    }

    fn list_by_department(&self, department_id: DepartmentId) -> RepoResult<Vec<Employee>> {
        list_employees(self.conn, department_id)
    }

    fn reassign_department(
        &self,
        from_id: DepartmentId,
        to_id: DepartmentId,
    ) -> RepoResult<usize> {
        reassign_employees(self.conn, from_id, to_id)
    }
}

pub(crate) fn list_employees(
    conn: &Connection,
    department_id: DepartmentId,
) -> RepoResult<Vec<Employee>> {
    let mut stmt = conn.prepare(&format!(
        "{EMPLOYEE_SELECT_SQL}
         WHERE department_id = ?1
         ORDER BY full_name ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([department_id])?;
    let mut employees = Vec::new();
    while let Some(row) = rows.next()? {
        employees.push(parse_employee_row(row)?);
    }
    Ok(employees)
}

pub(crate) fn reassign_employees(
    conn: &Connection,
    from_id: DepartmentId,
    to_id: DepartmentId,
) -> RepoResult<usize> {
    let moved = conn
        .execute(
            "UPDATE employees SET department_id = ?2 WHERE department_id = ?1;",
            params![from_id, to_id],
        )
        .map_err(|err| {
            let db_error = DbError::Sqlite(err);
            if db_error.is_foreign_key_violation() {
                RepoError::DepartmentNotFound(to_id)
            } else {
                RepoError::Db(db_error)
            }
        })?;
    Ok(moved)
}

fn parse_employee_row(row: &Row<'_>) -> RepoResult<Employee> {
    let hired_at = row
        .get::<_, Option<String>>("hired_at")?
        .map(|value| {
            NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|_| {
                RepoError::InvalidData(format!("invalid date `{value}` in employees.hired_at"))
            })
        })
        .transpose()?;

    Ok(Employee {
        id: row.get("id")?,
        department_id: row.get("department_id")?,
        full_name: row.get("full_name")?,
        position: row.get("position")?,
        hired_at,
        created_at: row.get("created_at")?,
    })
}
