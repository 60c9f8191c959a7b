//! Domain model for the organization tree.
//!
//! # Responsibility
//! - Define department and employee records shared by store and services.
//! - Provide the arena-shaped subtree returned by tree reads.
//! - Own field-level validation rules (trim, length, date format).
//!
//! # Invariants
//! - Department names are stored trimmed and are 1..=200 characters.
//! - A department subtree never holds the same id twice.

pub mod department;
pub mod employee;
pub mod tree;
pub mod validation;
