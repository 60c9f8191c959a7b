//! Use-case services over the repository layer.

pub mod department_service;
pub mod employee_service;
