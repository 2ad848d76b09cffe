//! API Response types
//!
//! Envelopes used by every backend endpoint:
//! ```json
//! {
//!     "status": "success",
//!     "message": "Data retrieved",
//!     "data": { ... },
//!     "pagination": { ... }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::models::{Division, Employee};

/// Standard envelope around a payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub data: T,
}

/// Envelope for list endpoints (pagination sits beside `data`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedEnvelope<T> {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub data: T,
    pub pagination: ApiPagination,
}

/// Pagination metadata as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiPagination {
    /// Current page number (1-based)
    pub current_page: u32,
    /// Last page number
    pub last_page: u32,
    /// Items per page
    pub per_page: u32,
    /// Total number of items
    pub total: u64,
}

/// `data` of `GET /employees`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeesData {
    #[serde(default)]
    pub employees: Vec<Employee>,
}

/// `data` of `GET /divisions`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DivisionsData {
    #[serde(default)]
    pub divisions: Vec<Division>,
}

/// Body of a failed request; only `message` is relied upon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
