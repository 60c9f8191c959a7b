//! Department use-case service.
//!
//! # Responsibility
//! - Validate tree invariants above the repository layer.
//! - Provide department create, subtree read, update and delete operations.
//!
//! # Invariants
//! - Names are trimmed, non-empty and at most 200 characters.
//! - A parent, when given, must exist.
//! - Reparenting must not create a cycle; the ancestor walk is bounded by
//!   the number of stored departments.
//! - (parent, name) is unique among siblings, case-sensitive.
//! - Subtree reads load between 1 and 5 levels of children.

use crate::error::ErrorKind;
use crate::model::department::{DeleteMode, DepartmentChanges, DepartmentId};
use crate::model::validation::{normalize_text, FieldError};
use crate::projection::DepartmentResponse;
use crate::repo::department_repo::DepartmentRepository;
use crate::repo::RepoError;
use log::{info, warn};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Deepest subtree level a read may request.
pub const MAX_DEPTH: i64 = 5;
/// Subtree depth used when the caller does not choose one.
pub const DEFAULT_DEPTH: i64 = 1;

/// Input for creating one department.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<DepartmentId>,
}

/// Options for reading one department subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetDepartmentQuery {
    /// Child levels to load. Values above [`MAX_DEPTH`] are capped.
    pub depth: i64,
    pub include_employees: bool,
}

impl Default for GetDepartmentQuery {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            include_employees: true,
        }
    }
}

/// Input for deleting one department.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteDepartmentRequest {
    pub mode: DeleteMode,
    /// Required when `mode` is [`DeleteMode::Reassign`].
    pub reassign_to_id: Option<DepartmentId>,
}

/// Errors from department service operations.
#[derive(Debug)]
pub enum DepartmentServiceError {
    /// Name failed trim/length validation.
    Validation(FieldError),
    /// Requested depth is zero or negative.
    InvalidDepth(i64),
    /// Target department does not exist.
    DepartmentNotFound(DepartmentId),
    /// Requested parent does not exist.
    ParentNotFound(DepartmentId),
    /// A sibling already uses this name.
    DuplicateName {
        parent_id: Option<DepartmentId>,
        name: String,
    },
    /// Reparenting would make the department its own ancestor.
    CycleDetected {
        department_id: DepartmentId,
        parent_id: DepartmentId,
    },
    /// Reassign target is missing or equals the deleted department.
    InvalidReassignTarget {
        department_id: DepartmentId,
        reassign_to_id: Option<DepartmentId>,
    },
    /// Stored parent links loop; the ancestor walk ran out of steps.
    CorruptTree {
        start_id: DepartmentId,
        steps: u64,
    },
    /// Repository-level failure.
    Repo(RepoError),
}

impl DepartmentServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(err) => err.kind(),
            Self::InvalidDepth(_) => ErrorKind::InvalidInput,
            Self::DepartmentNotFound(_) => ErrorKind::DepartmentNotFound,
            Self::ParentNotFound(_) => ErrorKind::ParentNotFound,
            Self::DuplicateName { .. } => ErrorKind::DuplicateName,
            Self::CycleDetected { .. } => ErrorKind::CycleConstraint,
            Self::InvalidReassignTarget { .. } => ErrorKind::InvalidReassignToId,
            Self::CorruptTree { .. } => ErrorKind::Internal,
            Self::Repo(err) => err.kind(),
        }
    }
}

impl Display for DepartmentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidDepth(depth) => {
                write!(f, "depth must be between 1 and {MAX_DEPTH}, got {depth}")
            }
            Self::DepartmentNotFound(id) => write!(f, "department not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent department not found: {id}"),
            Self::DuplicateName { parent_id, name } => match parent_id {
                Some(parent_id) => write!(
                    f,
                    "department `{name}` already exists under parent {parent_id}"
                ),
                None => write!(f, "root department `{name}` already exists"),
            },
            Self::CycleDetected {
                department_id,
                parent_id,
            } => write!(
                f,
                "moving department {department_id} under {parent_id} would create a cycle"
            ),
            Self::InvalidReassignTarget {
                department_id,
                reassign_to_id,
            } => match reassign_to_id {
                Some(target) => write!(
                    f,
                    "invalid reassign target {target} for department {department_id}"
                ),
                None => write!(
                    f,
                    "reassign target is required to delete department {department_id} in reassign mode"
                ),
            },
            Self::CorruptTree { start_id, steps } => write!(
                f,
                "ancestor walk from department {start_id} exceeded {steps} steps; parent links form a loop"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DepartmentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FieldError> for DepartmentServiceError {
    fn from(value: FieldError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for DepartmentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DepartmentNotFound(id) => Self::DepartmentNotFound(id),
            RepoError::AlreadyExists { parent_id, name } => {
                Self::DuplicateName { parent_id, name }
            }
            other => Self::Repo(other),
        }
    }
}

/// Department service facade.
pub struct DepartmentService<R: DepartmentRepository> {
    repo: R,
}

impl<R: DepartmentRepository> DepartmentService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one department under an optional parent.
    pub fn create_department(
        &self,
        request: &CreateDepartmentRequest,
    ) -> Result<DepartmentResponse, DepartmentServiceError> {
        let name = normalize_text("name", &request.name)?;
        let parent_id = request.parent_id;

        if let Some(parent_id) = parent_id {
            self.ensure_parent_exists(parent_id)?;
        }
        if self.repo.find_by_name_and_parent(&name, parent_id)?.is_some() {
            return Err(DepartmentServiceError::DuplicateName { parent_id, name });
        }

        let department = self
            .repo
            .create_department(&name, parent_id)
            .map_err(|err| match err {
                // Parent vanished between the check and the insert.
                RepoError::DepartmentNotFound(missing) => {
                    DepartmentServiceError::ParentNotFound(missing)
                }
                other => other.into(),
            })?;

        info!(
            "event=department_create module=service status=ok department_id={} parent_id={}",
            department.id,
            display_parent(department.parent_id)
        );
        Ok(DepartmentResponse::from_department(&department))
    }

    /// Loads one department with a depth-bounded subtree.
    pub fn get_department(
        &self,
        id: DepartmentId,
        query: GetDepartmentQuery,
    ) -> Result<DepartmentResponse, DepartmentServiceError> {
        let depth = effective_depth(query.depth)?;
        let tree = self
            .repo
            .get_department_tree(id, depth, query.include_employees)?;
        Ok(DepartmentResponse::from_tree(&tree))
    }

    /// Renames and/or reparents one department.
    ///
    /// Only fields present in `changes` are written. With no fields present
    /// the current record is returned without touching the store.
    pub fn update_department(
        &self,
        id: DepartmentId,
        changes: &DepartmentChanges,
    ) -> Result<DepartmentResponse, DepartmentServiceError> {
        let current = self.repo.get_department(id)?;

        let name = changes
            .name
            .as_deref()
            .map(|value| normalize_text("name", value))
            .transpose()?;

        if let Some(parent_id) = changes.parent_id {
            self.ensure_parent_exists(parent_id)?;
            if parent_id == id {
                return Err(DepartmentServiceError::CycleDetected {
                    department_id: id,
                    parent_id,
                });
            }
            self.ensure_no_cycle(id, parent_id)?;
        }

        let normalized = DepartmentChanges {
            name,
            parent_id: changes.parent_id,
        };
        if normalized.is_empty() {
            return Ok(DepartmentResponse::from_department(&current));
        }

        let effective_name = normalized.name.as_deref().unwrap_or(current.name.as_str());
        let effective_parent = normalized.parent_id.or(current.parent_id);
        if let Some(existing) = self
            .repo
            .find_by_name_and_parent(effective_name, effective_parent)?
        {
            if existing.id != id {
                return Err(DepartmentServiceError::DuplicateName {
                    parent_id: effective_parent,
                    name: effective_name.to_string(),
                });
            }
        }

        self.repo
            .update_department(id, &normalized)
            .map_err(|err| match err {
                RepoError::DepartmentNotFound(missing) if missing != id => {
                    DepartmentServiceError::ParentNotFound(missing)
                }
                other => other.into(),
            })?;

        let tree = self.repo.get_department_tree(id, 1, false)?;
        info!(
            "event=department_update module=service status=ok department_id={id} renamed={} reparented={}",
            normalized.name.is_some(),
            normalized.parent_id.is_some()
        );
        Ok(DepartmentResponse::from_tree(&tree))
    }

    /// Deletes one department in cascade or reassign mode.
    pub fn delete_department(
        &self,
        id: DepartmentId,
        request: DeleteDepartmentRequest,
    ) -> Result<(), DepartmentServiceError> {
        if !self.repo.exists(id)? {
            return Err(DepartmentServiceError::DepartmentNotFound(id));
        }

        match request.mode {
            DeleteMode::Reassign => {
                let target = request.reassign_to_id.ok_or(
                    DepartmentServiceError::InvalidReassignTarget {
                        department_id: id,
                        reassign_to_id: None,
                    },
                )?;
                if target == id {
                    return Err(DepartmentServiceError::InvalidReassignTarget {
                        department_id: id,
                        reassign_to_id: Some(target),
                    });
                }
                if !self.repo.exists(target)? {
                    return Err(DepartmentServiceError::DepartmentNotFound(target));
                }
                self.repo.delete_department_with_reassign(id, target)?;
            }
            DeleteMode::Cascade => self.repo.delete_department(id)?,
        }

        info!(
            "event=department_delete module=service status=ok department_id={id} mode={}",
            request.mode.as_str()
        );
        Ok(())
    }

    fn ensure_parent_exists(&self, parent_id: DepartmentId) -> Result<(), DepartmentServiceError> {
        if !self.repo.exists(parent_id)? {
            return Err(DepartmentServiceError::ParentNotFound(parent_id));
        }
        Ok(())
    }

    fn ensure_no_cycle(
        &self,
        department_id: DepartmentId,
        candidate_parent_id: DepartmentId,
    ) -> Result<(), DepartmentServiceError> {
        let max_steps = self.repo.count_departments()?.saturating_add(1);
        let mut steps = 0_u64;
        let mut cursor = Some(candidate_parent_id);

        while let Some(current) = cursor {
            if current == department_id {
                return Err(DepartmentServiceError::CycleDetected {
                    department_id,
                    parent_id: candidate_parent_id,
                });
            }
            if steps >= max_steps {
                warn!(
                    "event=ancestor_walk module=service status=error error_code=corrupt_tree start_id={candidate_parent_id} steps={steps}"
                );
                return Err(DepartmentServiceError::CorruptTree {
                    start_id: candidate_parent_id,
                    steps,
                });
            }
            steps += 1;

            let ancestor = self.repo.get_department(current).map_err(|err| match err {
                RepoError::DepartmentNotFound(missing) => {
                    DepartmentServiceError::ParentNotFound(missing)
                }
                other => other.into(),
            })?;
            cursor = ancestor.parent_id;
        }
        Ok(())
    }
}

/// Validates and caps a requested subtree depth.
pub fn effective_depth(requested: i64) -> Result<usize, DepartmentServiceError> {
    if requested <= 0 {
        return Err(DepartmentServiceError::InvalidDepth(requested));
    }
    // Capped to MAX_DEPTH, so the cast cannot truncate.
    Ok(requested.min(MAX_DEPTH) as usize)
}

fn display_parent(parent_id: Option<DepartmentId>) -> String {
    parent_id.map_or_else(|| "root".to_string(), |id| id.to_string())
}
