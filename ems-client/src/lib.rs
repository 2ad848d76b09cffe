//! EMS Client - front end for the employee-management backend
//!
//! Session handling, resource services, a shared query cache and the
//! controllers behind the employee list, employee form, profile and
//! dashboard screens.

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod history;
pub mod http;
pub mod pagination;
pub mod query;
pub mod services;
pub mod session;
pub mod storage;
pub mod theme;
pub mod views;

pub use cache::{CacheEvent, Mutation, MutationStatus, QueryClient, QueryConfig, QueryKey, QueryState};
pub use config::ClientConfig;
pub use context::EmsContext;
pub use error::{ClientError, ClientResult};
pub use history::{History, MemoryHistory};
pub use http::ApiClient;
pub use pagination::{PageItem, PaginationState};
pub use query::{ListQuery, ParamsPatch, QueryParams, SearchInput};
pub use services::{DivisionService, EmployeeInput, EmployeeService, ImageFile};
pub use session::{AuthOutcome, Session, SessionPhase, SessionState};
pub use storage::{FileStore, KeyValueStore, MemoryStore, Storage, StorageKey};
pub use theme::{ThemeContext, ThemeMode};

// Re-export shared types for convenience
pub use shared::{Division, Employee, ProfileUpdate, User};
