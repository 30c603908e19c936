//! Employee directory domain module.
//!
//! Employees are owned by the HR system; this crate only models the read side
//! plus the contact write-back that card requests perform.

pub mod employee;
pub mod filter;

pub use employee::{ContactNumbers, Employee, OrgUnit};
pub use filter::EmployeeFilter;
