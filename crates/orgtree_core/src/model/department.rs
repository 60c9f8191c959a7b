//! Department domain records.

use serde::Deserialize;

/// Store-assigned department identifier.
pub type DepartmentId = i64;

/// Persisted department record without children or employees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    pub id: DepartmentId,
    /// Trimmed display name, unique among siblings.
    pub name: String,
    /// `None` means root department.
    pub parent_id: Option<DepartmentId>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

/// Partial department update. Only `Some` fields are written.
///
/// An absent `parent_id` leaves the parent unchanged; moving a department
/// back to root level is not expressible through this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DepartmentChanges {
    pub name: Option<String>,
    pub parent_id: Option<DepartmentId>,
}

impl DepartmentChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_id.is_none()
    }
}

/// How a department delete treats dependent records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    /// Remove the department, its whole subtree and every employee in it.
    #[default]
    Cascade,
    /// Move direct employees to another department, then delete.
    ///
    /// Child departments are still removed by the store cascade.
    Reassign,
}

impl DeleteMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cascade => "cascade",
            Self::Reassign => "reassign",
        }
    }

    /// Parses `cascade` / `reassign`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cascade" => Some(Self::Cascade),
            "reassign" => Some(Self::Reassign),
            _ => None,
        }
    }
}
