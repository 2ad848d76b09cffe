//! Resource services
//!
//! Thin typed wrappers over the backend's REST endpoints.

pub mod divisions;
pub mod employees;

pub use divisions::{DivisionPage, DivisionService};
pub use employees::{EmployeeInput, EmployeePage, EmployeeService, ImageFile, MAX_IMAGE_BYTES};
