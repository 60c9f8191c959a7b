//! Route handlers.

use axum::extract::rejection::JsonRejection;
use orgtree_core::{DepartmentId, SqliteDepartmentRepository, SqliteEmployeeRepository};
use rusqlite::Connection;

use crate::{ApiError, ApiResult};

pub mod departments;
pub mod employees;
pub mod health;

/// Parses a `{id}` path segment. Anything that is not an integer id names
/// no department.
pub(crate) fn parse_id(op: &'static str, raw: &str) -> ApiResult<DepartmentId> {
    raw.parse()
        .map_err(|_| ApiError::not_found(op, format!("department not found: {raw}")))
}

pub(crate) fn json_body<T>(
    op: &'static str,
    body: Result<axum::Json<T>, JsonRejection>,
) -> ApiResult<T> {
    body.map(|axum::Json(value)| value)
        .map_err(|rejection| ApiError::invalid_request(op, rejection.body_text()))
}

pub(crate) fn department_repo<'conn>(
    op: &'static str,
    conn: &'conn Connection,
) -> ApiResult<SqliteDepartmentRepository<'conn>> {
    SqliteDepartmentRepository::try_new(conn).map_err(ApiError::repo(op))
}

pub(crate) fn employee_repo<'conn>(
    op: &'static str,
    conn: &'conn Connection,
) -> ApiResult<SqliteEmployeeRepository<'conn>> {
    SqliteEmployeeRepository::try_new(conn).map_err(ApiError::repo(op))
}

#[cfg(test)]
mod tests {
    use super::parse_id;
    use axum::http::StatusCode;

    #[test]
    fn non_numeric_ids_are_not_found() {
        assert_eq!(parse_id("t", "42").unwrap(), 42);
        for raw in ["abc", "", "1.5", "99999999999999999999"] {
            assert_eq!(parse_id("t", raw).unwrap_err().status(), StatusCode::NOT_FOUND);
        }
    }
}
