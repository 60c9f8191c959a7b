//! In-memory organization store.
//!
//! Implements both repository traits over one shared arena so services can
//! run without SQLite. Semantics mirror the SQLite schema: (parent, name)
//! uniqueness, cascade on delete and all-or-nothing reassign-then-delete.

use crate::model::department::{Department, DepartmentChanges, DepartmentId};
use crate::model::employee::{Employee, EmployeeId, NewEmployee};
use crate::model::tree::DepartmentTree;
use crate::repo::department_repo::DepartmentRepository;
use crate::repo::employee_repo::EmployeeRepository;
use crate::repo::{build_tree, RepoError, RepoResult};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MemoryState {
    next_department_id: DepartmentId,
    next_employee_id: EmployeeId,
    /// Monotonic fake clock in epoch ms.
    clock: i64,
    departments: BTreeMap<DepartmentId, Department>,
    employees: BTreeMap<EmployeeId, Employee>,
}

impl MemoryState {
    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }

    fn sibling_named(
        &self,
        name: &str,
        parent_id: Option<DepartmentId>,
    ) -> Option<&Department> {
        self.departments
            .values()
            .find(|department| department.parent_id == parent_id && department.name == name)
    }

    fn children_of(&self, parent_id: DepartmentId) -> Vec<Department> {
        self.departments
            .values()
            .filter(|department| department.parent_id == Some(parent_id))
            .cloned()
            .collect()
    }

    fn employees_of(&self, department_id: DepartmentId) -> Vec<Employee> {
        let mut employees: Vec<Employee> = self
            .employees
            .values()
            .filter(|employee| employee.department_id == department_id)
            .cloned()
            .collect();
        employees.sort_by(|left, right| {
            left.full_name
                .cmp(&right.full_name)
                .then(left.id.cmp(&right.id))
        });
        employees
    }

    /// Removes `id`, every descendant and their employees.
    fn cascade_delete(&mut self, id: DepartmentId) {
        let mut doomed = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !doomed.insert(current) {
                continue;
            }
            stack.extend(
                self.departments
                    .values()
                    .filter(|department| department.parent_id == Some(current))
                    .map(|department| department.id),
            );
        }

        self.departments.retain(|id, _| !doomed.contains(id));
        self.employees
            .retain(|_, employee| !doomed.contains(&employee.department_id));
    }
}

/// Mutex-guarded in-memory store implementing both repository traits.
#[derive(Debug, Default)]
pub struct InMemoryOrgStore {
    state: Mutex<MemoryState>,
}

impl InMemoryOrgStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn department_count(&self) -> usize {
        self.lock().departments.len()
    }

    pub fn employee_count(&self) -> usize {
        self.lock().employees.len()
    }
}

impl DepartmentRepository for InMemoryOrgStore {
    fn create_department(
        &self,
        name: &str,
        parent_id: Option<DepartmentId>,
    ) -> RepoResult<Department> {
        let mut state = self.lock();
        if let Some(parent_id) = parent_id {
            if !state.departments.contains_key(&parent_id) {
                return Err(RepoError::DepartmentNotFound(parent_id));
            }
        }
        if state.sibling_named(name, parent_id).is_some() {
            return Err(RepoError::AlreadyExists {
                parent_id,
                name: name.to_string(),
            });
        }

        state.next_department_id += 1;
        let department = Department {
            id: state.next_department_id,
            name: name.to_string(),
            parent_id,
            created_at: state.tick(),
        };
        state
            .departments
            .insert(department.id, department.clone());
        Ok(department)
    }

    fn get_department(&self, id: DepartmentId) -> RepoResult<Department> {
        self.lock()
            .departments
            .get(&id)
            .cloned()
            .ok_or(RepoError::DepartmentNotFound(id))
    }

    fn get_department_tree(
        &self,
        id: DepartmentId,
        depth: usize,
        include_employees: bool,
    ) -> RepoResult<DepartmentTree> {
        let state = self.lock();
        let root = state
            .departments
            .get(&id)
            .cloned()
            .ok_or(RepoError::DepartmentNotFound(id))?;
        build_tree(
            root,
            depth,
            include_employees,
            |parent_id| Ok(state.children_of(parent_id)),
            |department_id| Ok(state.employees_of(department_id)),
        )
    }

    fn find_by_name_and_parent(
        &self,
        name: &str,
        parent_id: Option<DepartmentId>,
    ) -> RepoResult<Option<Department>> {
        Ok(self.lock().sibling_named(name, parent_id).cloned())
    }

    fn update_department(
        &self,
        id: DepartmentId,
        changes: &DepartmentChanges,
    ) -> RepoResult<()> {
        let mut state = self.lock();
        let current = state
            .departments
            .get(&id)
            .cloned()
            .ok_or(RepoError::DepartmentNotFound(id))?;

        let name = changes.name.clone().unwrap_or(current.name);
        let parent_id = changes.parent_id.or(current.parent_id);
        if let Some(parent_id) = changes.parent_id {
            if !state.departments.contains_key(&parent_id) {
                return Err(RepoError::DepartmentNotFound(parent_id));
            }
        }
        if let Some(existing) = state.sibling_named(&name, parent_id) {
            if existing.id != id {
                return Err(RepoError::AlreadyExists { parent_id, name });
            }
        }

        if let Some(department) = state.departments.get_mut(&id) {
            department.name = name;
            department.parent_id = parent_id;
        }
        Ok(())
    }

    fn delete_department(&self, id: DepartmentId) -> RepoResult<()> {
        let mut state = self.lock();
        if !state.departments.contains_key(&id) {
            return Err(RepoError::DepartmentNotFound(id));
        }
        state.cascade_delete(id);
        Ok(())
    }

    fn delete_department_with_reassign(
        &self,
        id: DepartmentId,
        reassign_to_id: DepartmentId,
    ) -> RepoResult<()> {
        let mut state = self.lock();
        if !state.departments.contains_key(&id) {
            return Err(RepoError::DepartmentNotFound(id));
        }
        if !state.departments.contains_key(&reassign_to_id) {
            return Err(RepoError::DepartmentNotFound(reassign_to_id));
        }

        for employee in state.employees.values_mut() {
            if employee.department_id == id {
                employee.department_id = reassign_to_id;
            }
        }
        state.cascade_delete(id);
        Ok(())
    }

    fn exists(&self, id: DepartmentId) -> RepoResult<bool> {
        Ok(self.lock().departments.contains_key(&id))
    }

    fn count_departments(&self) -> RepoResult<u64> {
        Ok(self.lock().departments.len() as u64)
    }
}

impl EmployeeRepository for InMemoryOrgStore {
    fn create_employee(&self, employee: &NewEmployee) -> RepoResult<Employee> {
        let mut state = self.lock();
        if !state.departments.contains_key(&employee.department_id) {
            return Err(RepoError::DepartmentNotFound(employee.department_id));
        }

        state.next_employee_id += 1;
        let created = Employee {
            id: state.next_employee_id,
            department_id: employee.department_id,
            full_name: employee.full_name.clone(),
            position: employee.position.clone(),
            hired_at: employee.hired_at,
            created_at: state.tick(),
        };
        state.employees.insert(created.id, created.clone());
        Ok(created)
    }

    fn get_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        Ok(self.lock().employees.get(&id).cloned())
    }

    fn list_by_department(&self, department_id: DepartmentId) -> RepoResult<Vec<Employee>> {
        Ok(self.lock().employees_of(department_id))
    }

    fn reassign_department(
        &self,
        from_id: DepartmentId,
        to_id: DepartmentId,
    ) -> RepoResult<usize> {
        let mut state = self.lock();
        if !state.departments.contains_key(&to_id) {
            return Err(RepoError::DepartmentNotFound(to_id));
        }

        let mut moved = 0;
        for employee in state.employees.values_mut() {
            if employee.department_id == from_id {
                employee.department_id = to_id;
                moved += 1;
            }
        }
        Ok(moved)
    }
}
