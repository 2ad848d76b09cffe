//! Data models
//!
//! Entities owned by the backend. The client never keeps a long-lived
//! mutable copy; every view re-reads them through the query cache.

pub mod division;
pub mod employee;
pub mod user;

// Re-exports
pub use division::*;
pub use employee::*;
pub use user::*;
