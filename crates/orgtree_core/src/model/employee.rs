//! Employee domain records.

use crate::model::department::DepartmentId;
use chrono::NaiveDate;

/// Store-assigned employee identifier.
pub type EmployeeId = i64;

/// Persisted employee record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: EmployeeId,
    /// Owning department. Always references an existing department.
    pub department_id: DepartmentId,
    pub full_name: String,
    pub position: String,
    /// Calendar hire date without time component.
    pub hired_at: Option<NaiveDate>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

/// Validated employee payload ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub department_id: DepartmentId,
    pub full_name: String,
    pub position: String,
    pub hired_at: Option<NaiveDate>,
}
