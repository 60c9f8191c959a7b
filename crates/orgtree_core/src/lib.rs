//! Core domain logic for the organization tree service.
//! This crate is the single source of truth for tree invariants.

pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod projection;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError};
pub use error::{ErrorKind, StatusClass};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::department::{DeleteMode, Department, DepartmentChanges, DepartmentId};
pub use model::employee::{Employee, EmployeeId, NewEmployee};
pub use model::tree::{DepartmentNode, DepartmentTree};
pub use model::validation::FieldError;
pub use projection::{DepartmentResponse, EmployeeResponse};
pub use repo::department_repo::{DepartmentRepository, SqliteDepartmentRepository};
pub use repo::employee_repo::{EmployeeRepository, SqliteEmployeeRepository};
pub use repo::memory::InMemoryOrgStore;
pub use repo::{RepoError, RepoResult};
pub use service::department_service::{
    CreateDepartmentRequest, DeleteDepartmentRequest, DepartmentService, DepartmentServiceError,
    GetDepartmentQuery, DEFAULT_DEPTH, MAX_DEPTH,
};
pub use service::employee_service::{
    CreateEmployeeRequest, EmployeeService, EmployeeServiceError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
