//! Response projection for departments and employees.
//!
//! # Responsibility
//! - Convert domain records and loaded subtrees into serializable views.
//!
//! # Invariants
//! - Empty `employees` / `children` are omitted from serialized output, not
//!   rendered as `[]`.
//! - `hired_at` is always present, as `YYYY-MM-DD` or `null`.
//! - Nesting never exceeds the depth the subtree was loaded with.

use crate::model::department::{Department, DepartmentId};
use crate::model::employee::{Employee, EmployeeId};
use crate::model::tree::{DepartmentNode, DepartmentTree};
use crate::model::validation::DATE_FORMAT;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Department view with optionally nested employees and children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentResponse {
    pub id: DepartmentId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<DepartmentId>,
    /// RFC 3339 UTC timestamp.
    pub created_at: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub employees: Vec<EmployeeResponse>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DepartmentResponse>,
}

/// Employee view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeResponse {
    pub id: EmployeeId,
    pub department_id: DepartmentId,
    pub full_name: String,
    pub position: String,
    pub hired_at: Option<String>,
    /// RFC 3339 UTC timestamp.
    pub created_at: String,
}

impl DepartmentResponse {
    /// Projects a bare department record.
    pub fn from_department(department: &Department) -> Self {
        Self {
            id: department.id,
            name: department.name.clone(),
            parent_id: department.parent_id,
            created_at: format_timestamp(department.created_at),
            employees: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Projects a loaded subtree starting at its root.
    pub fn from_tree(tree: &DepartmentTree) -> Self {
        project_node(tree, tree.root())
    }
}

impl From<&Employee> for EmployeeResponse {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            department_id: employee.department_id,
            full_name: employee.full_name.clone(),
            position: employee.position.clone(),
            hired_at: employee
                .hired_at
                .map(|date| date.format(DATE_FORMAT).to_string()),
            created_at: format_timestamp(employee.created_at),
        }
    }
}

fn project_node(tree: &DepartmentTree, node: &DepartmentNode) -> DepartmentResponse {
    let mut response = DepartmentResponse::from_department(&node.department);
    response.employees = node.employees.iter().map(EmployeeResponse::from).collect();
    response.children = node
        .children
        .iter()
        .filter_map(|child_id| tree.node(*child_id))
        .map(|child| project_node(tree, child))
        .collect();
    response
}

/// Formats epoch milliseconds as RFC 3339 UTC with millisecond precision.
pub fn format_timestamp(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|value| value.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| epoch_ms.to_string())
}
