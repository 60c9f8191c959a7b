//! Employee use-case service.
//!
//! # Responsibility
//! - Validate employee input and bind employees to existing departments.
//! - Move employees between departments.
//!
//! # Invariants
//! - `full_name` and `position` are trimmed, non-empty and at most 200
//!   characters.
//! - `hired_at`, when present, is a strict `YYYY-MM-DD` calendar date.

use crate::error::ErrorKind;
use crate::model::department::DepartmentId;
use crate::model::employee::NewEmployee;
use crate::model::validation::{normalize_text, parse_date, FieldError};
use crate::projection::EmployeeResponse;
use crate::repo::department_repo::DepartmentRepository;
use crate::repo::employee_repo::EmployeeRepository;
use crate::repo::RepoError;
use log::info;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input for creating one employee.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateEmployeeRequest {
    pub full_name: String,
    pub position: String,
    #[serde(default)]
    pub hired_at: Option<String>,
}

/// Errors from employee service operations.
#[derive(Debug)]
pub enum EmployeeServiceError {
    Validation(FieldError),
    DepartmentNotFound(DepartmentId),
    /// Source and target department are the same.
    InvalidReassignTarget {
        from_id: DepartmentId,
        to_id: DepartmentId,
    },
    Repo(RepoError),
}

impl EmployeeServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(err) => err.kind(),
            Self::DepartmentNotFound(_) => ErrorKind::DepartmentNotFound,
            Self::InvalidReassignTarget { .. } => ErrorKind::InvalidReassignToId,
            Self::Repo(err) => err.kind(),
        }
    }
}

impl Display for EmployeeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DepartmentNotFound(id) => write!(f, "department not found: {id}"),
            Self::InvalidReassignTarget { from_id, to_id } => write!(
                f,
                "cannot reassign employees from department {from_id} to {to_id}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EmployeeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FieldError> for EmployeeServiceError {
    fn from(value: FieldError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for EmployeeServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DepartmentNotFound(id) => Self::DepartmentNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Employee service facade.
pub struct EmployeeService<D: DepartmentRepository, E: EmployeeRepository> {
    departments: D,
    employees: E,
}

impl<D: DepartmentRepository, E: EmployeeRepository> EmployeeService<D, E> {
    pub fn new(departments: D, employees: E) -> Self {
        Self {
            departments,
            employees,
        }
    }

    /// Creates one employee in an existing department.
    pub fn create_employee(
        &self,
        department_id: DepartmentId,
        request: &CreateEmployeeRequest,
    ) -> Result<EmployeeResponse, EmployeeServiceError> {
        let full_name = normalize_text("full_name", &request.full_name)?;
        let position = normalize_text("position", &request.position)?;

        if !self.departments.exists(department_id)? {
            return Err(EmployeeServiceError::DepartmentNotFound(department_id));
        }

        let hired_at = request
            .hired_at
            .as_deref()
            .map(|value| parse_date("hired_at", value))
            .transpose()?;

        let employee = self.employees.create_employee(&NewEmployee {
            department_id,
            full_name,
            position,
            hired_at,
        })?;

        info!(
            "event=employee_create module=service status=ok employee_id={} department_id={department_id}",
            employee.id
        );
        Ok(EmployeeResponse::from(&employee))
    }

    /// Moves every direct employee of `from_id` to `to_id`.
    ///
    /// Returns the number of moved employees.
    pub fn reassign_employees(
        &self,
        from_id: DepartmentId,
        to_id: DepartmentId,
    ) -> Result<usize, EmployeeServiceError> {
        if from_id == to_id {
            return Err(EmployeeServiceError::InvalidReassignTarget { from_id, to_id });
        }
        for id in [from_id, to_id] {
            if !self.departments.exists(id)? {
                return Err(EmployeeServiceError::DepartmentNotFound(id));
            }
        }

        let moved = self.employees.reassign_department(from_id, to_id)?;
        info!(
            "event=employee_reassign module=service status=ok from_id={from_id} to_id={to_id} moved={moved}"
        );
        Ok(moved)
    }
}
