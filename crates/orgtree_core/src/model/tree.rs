//! Arena representation of a loaded department subtree.
//!
//! # Responsibility
//! - Hold department records keyed by id, with ordered child id lists.
//! - Let callers walk a subtree without owning nested object graphs.
//!
//! # Invariants
//! - Every node except the root is listed in exactly one parent's
//!   `children`.
//! - Child order is the load order chosen by the store.

use crate::model::department::{Department, DepartmentId};
use crate::model::employee::Employee;
use std::collections::HashMap;

/// One loaded department plus its loaded relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentNode {
    pub department: Department,
    /// Child ids in load order. Empty when the depth limit was reached.
    pub children: Vec<DepartmentId>,
    /// Direct employees in load order. Empty unless employees were requested.
    pub employees: Vec<Employee>,
}

/// Depth-bounded department subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentTree {
    root: DepartmentId,
    nodes: HashMap<DepartmentId, DepartmentNode>,
}

impl DepartmentTree {
    /// Starts a tree with a single root node.
    pub fn new(root: Department) -> Self {
        let root_id = root.id;
        let mut nodes = HashMap::new();
        nodes.insert(root_id, node_for(root));
        Self {
            root: root_id,
            nodes,
        }
    }

    pub fn root_id(&self) -> DepartmentId {
        self.root
    }

    pub fn root(&self) -> &DepartmentNode {
        &self.nodes[&self.root]
    }

    pub fn node(&self, id: DepartmentId) -> Option<&DepartmentNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: DepartmentId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of loaded departments, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of all loaded departments, in no particular order.
    pub fn ids(&self) -> Vec<DepartmentId> {
        self.nodes.keys().copied().collect()
    }

    /// Attaches `department` under its parent.
    ///
    /// Returns `false` and leaves the tree untouched when the parent is not
    /// loaded or the id is already present.
    pub fn attach(&mut self, department: Department) -> bool {
        let Some(parent_id) = department.parent_id else {
            return false;
        };
        if self.nodes.contains_key(&department.id) || !self.nodes.contains_key(&parent_id) {
            return false;
        }

        let id = department.id;
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.push(id);
        }
        self.nodes.insert(id, node_for(department));
        true
    }

    /// Replaces the employee list of one loaded department.
    pub fn set_employees(&mut self, id: DepartmentId, employees: Vec<Employee>) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.employees = employees;
        }
    }

    /// Levels below the root that contain at least one department.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut frontier = vec![self.root];
        loop {
            let next: Vec<DepartmentId> = frontier
                .iter()
                .filter_map(|id| self.nodes.get(id))
                .flat_map(|node| node.children.iter().copied())
                .collect();
            if next.is_empty() {
                return depth;
            }
            depth += 1;
            frontier = next;
        }
    }

    /// Total number of loaded employees across the subtree.
    pub fn employee_count(&self) -> usize {
        self.nodes.values().map(|node| node.employees.len()).sum()
    }
}

fn node_for(department: Department) -> DepartmentNode {
    DepartmentNode {
        department,
        children: Vec::new(),
        employees: Vec::new(),
    }
}
