//! Screen controllers
//!
//! Each controller owns the state of one screen and talks to the backend
//! only through the services and the shared query cache.

pub mod dashboard;
pub mod employee_form;
pub mod employee_list;
pub mod profile_form;

pub use dashboard::{Dashboard, DashboardSummary};
pub use employee_form::{EmployeeForm, FormField, FormMode};
pub use employee_list::{EmployeeList, EmployeeListView, EmployeeRow};
pub use profile_form::ProfileForm;

use std::sync::Arc;
use std::time::Duration;

use shared::Division;

use crate::cache::{QueryClient, QueryKey, QueryOptions, QueryResult};
use crate::services::DivisionService;

/// Cache resource of every employee query
pub const EMPLOYEES: &str = "employees";
/// Cache resource of every division query
pub const DIVISIONS: &str = "divisions";

/// Divisions change rarely
pub const DIVISIONS_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// `divisions{scope=all}`
pub fn all_divisions_key() -> QueryKey {
    QueryKey::new(DIVISIONS).with("scope", "all")
}

/// Every division, shared by the list filter and the form select
pub async fn fetch_all_divisions(
    queries: &QueryClient,
    service: &DivisionService,
) -> QueryResult<Vec<Division>> {
    let service = service.clone();
    queries
        .fetch_with(
            all_divisions_key(),
            QueryOptions::stale_time(DIVISIONS_STALE_TIME),
            move || {
                let service = service.clone();
                async move { service.all().await }
            },
        )
        .await
}

/// Cached divisions, if loaded
pub fn cached_divisions(queries: &QueryClient) -> Option<Arc<Vec<Division>>> {
    queries.peek::<Vec<Division>>(&all_divisions_key()).data
}
