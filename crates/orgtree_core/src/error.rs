//! Error taxonomy shared by services and transport adapters.
//!
//! # Responsibility
//! - Name every failure kind a caller can observe.
//! - Collapse kinds into the fixed set of status classes a transport exposes.
//!
//! # Invariants
//! - Unrecognized failures always classify as `Internal`.

use std::fmt::{Display, Formatter};

/// Caller-observable failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Generic missing entity.
    NotFound,
    DepartmentNotFound,
    ParentNotFound,
    /// Sibling name collision.
    DuplicateName,
    /// Store-level uniqueness violation not attributed to a sibling check.
    AlreadyExist,
    /// Reparent would make a department its own ancestor.
    CycleConstraint,
    LengthConstraint,
    /// Blank value after trim.
    EmptyConstraint,
    /// Missing, self-referential or absent reassignment target.
    InvalidReassignToId,
    /// Malformed input that is not a field constraint (depth, date, mode).
    InvalidInput,
    Internal,
}

/// Response class a transport maps each kind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    NotFound,
    Conflict,
    BadRequest,
    Internal,
}

impl ErrorKind {
    pub fn status_class(self) -> StatusClass {
        match self {
            Self::NotFound | Self::DepartmentNotFound | Self::ParentNotFound => {
                StatusClass::NotFound
            }
            Self::DuplicateName | Self::AlreadyExist | Self::CycleConstraint => {
                StatusClass::Conflict
            }
            Self::LengthConstraint
            | Self::EmptyConstraint
            | Self::InvalidReassignToId
            | Self::InvalidInput => StatusClass::BadRequest,
            Self::Internal => StatusClass::Internal,
        }
    }

    /// Stable snake_case code used in logs and error bodies.
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::DepartmentNotFound => "department_not_found",
            Self::ParentNotFound => "parent_not_found",
            Self::DuplicateName => "duplicate_name",
            Self::AlreadyExist => "already_exist",
            Self::CycleConstraint => "cycle_constraint",
            Self::LengthConstraint => "length_constraint",
            Self::EmptyConstraint => "empty_constraint",
            Self::InvalidReassignToId => "invalid_reassign_to_id",
            Self::InvalidInput => "invalid_input",
            Self::Internal => "internal",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, StatusClass};

    #[test]
    fn kinds_collapse_into_fixed_status_classes() {
        let cases = [
            (ErrorKind::NotFound, StatusClass::NotFound),
            (ErrorKind::DepartmentNotFound, StatusClass::NotFound),
            (ErrorKind::ParentNotFound, StatusClass::NotFound),
            (ErrorKind::DuplicateName, StatusClass::Conflict),
            (ErrorKind::AlreadyExist, StatusClass::Conflict),
            (ErrorKind::CycleConstraint, StatusClass::Conflict),
            (ErrorKind::LengthConstraint, StatusClass::BadRequest),
            (ErrorKind::EmptyConstraint, StatusClass::BadRequest),
            (ErrorKind::InvalidReassignToId, StatusClass::BadRequest),
            (ErrorKind::InvalidInput, StatusClass::BadRequest),
            (ErrorKind::Internal, StatusClass::Internal),
        ];
        for (kind, class) in cases {
            assert_eq!(kind.status_class(), class, "{kind}");
        }
    }
}
