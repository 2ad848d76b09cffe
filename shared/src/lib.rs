//! Shared types for the EMS client
//!
//! Wire types exchanged with the employee-management backend: entity
//! models, response envelopes, request parameters and auth DTOs.

pub mod client;
pub mod models;
pub mod request;
pub mod response;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use client::{LoginData, LoginRequest, ProfileData, ProfileUpdate};
pub use models::{Division, Employee, User};
pub use response::{ApiEnvelope, ApiPagination, ErrorBody, PagedEnvelope};
