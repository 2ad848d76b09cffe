//! Employee list screen
//!
//! Filters live in the location (`page`, `search`, `division`); the search
//! box is debounced; rows come from the query cache keyed by the filters.

use std::sync::{Arc, Mutex, PoisonError};

use shared::Employee;
use shared::request::EmployeeQuery;

use super::{EMPLOYEES, cached_divisions, fetch_all_divisions};
use crate::cache::{Mutation, MutationStatus, QueryClient, QueryKey, QueryObserver, QueryResult};
use crate::history::History;
use crate::pagination::PaginationState;
use crate::query::{ListQuery, QueryParams, SearchInput};
use crate::services::{DivisionService, EmployeePage, EmployeeService};
use crate::{ClientError, ClientResult, Division};

const LOAD_FAILED: &str = "Failed to load employees";

/// `employees{division, page, search}`
pub fn employees_key(query: &ListQuery) -> QueryKey {
    QueryKey::new(EMPLOYEES)
        .with("page", query.page)
        .with("search", &query.search)
        .with("division", &query.division)
}

/// A numbered table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRow {
    pub number: u64,
    pub employee: Employee,
}

/// Everything the list screen renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeListView {
    pub query: ListQuery,
    /// Text in the search box (may be ahead of `query.search`)
    pub search_input: String,
    pub rows: Vec<EmployeeRow>,
    pub pagination: PaginationState,
    pub is_loading: bool,
    pub error: Option<String>,
    pub has_filters: bool,
    /// Employee awaiting delete confirmation
    pub delete_target: Option<Employee>,
    /// Confirm button disabled while the delete runs
    pub delete_pending: bool,
}

impl EmployeeListView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && !self.is_loading
    }
}

pub struct EmployeeList<H: History + ?Sized + 'static = dyn History> {
    params: QueryParams<H>,
    search: SearchInput<H>,
    queries: QueryClient,
    employees: EmployeeService,
    divisions: DivisionService,
    per_page: u32,
    delete: Mutation,
    delete_target: Mutex<Option<Employee>>,
    observer: Mutex<Option<(QueryKey, QueryObserver)>>,
}

impl<H: History + ?Sized + 'static> EmployeeList<H> {
    pub fn new(
        params: QueryParams<H>,
        search: SearchInput<H>,
        queries: QueryClient,
        employees: EmployeeService,
        divisions: DivisionService,
        per_page: u32,
    ) -> Self {
        let delete = Mutation::new("delete employee", queries.clone()).invalidates(EMPLOYEES);
        Self {
            params,
            search,
            queries,
            employees,
            divisions,
            per_page,
            delete,
            delete_target: Mutex::new(None),
            observer: Mutex::new(None),
        }
    }

    pub fn params(&self) -> &QueryParams<H> {
        &self.params
    }

    /// Key of the current filters
    pub fn current_key(&self) -> QueryKey {
        employees_key(&self.params.current())
    }

    /// Fetch the page for the current filters
    pub async fn load(&self) -> EmployeeListView {
        self.search.sync_from_query();
        let query = self.params.current();
        let key = employees_key(&query);
        self.observe(&key);

        let service = self.employees.clone();
        let request = EmployeeQuery::page(query.page, &query.search, &query.division, self.per_page);
        let result: QueryResult<EmployeePage> = self
            .queries
            .fetch(key.clone(), move || {
                let service = service.clone();
                let request = request.clone();
                async move { service.list(&request).await }
            })
            .await;

        if self.current_key() != key {
            // 过滤条件在请求期间变了: 结果留在缓存, 不上屏
            tracing::debug!(key = %key, "Filters changed while loading, result not shown");
            return self.snapshot();
        }
        if let Err(e) = &result {
            tracing::debug!(key = %key, error = %e, "Employee list failed to load");
        }
        self.snapshot()
    }

    /// View of the current filters from whatever is cached
    pub fn snapshot(&self) -> EmployeeListView {
        let query = self.params.current();
        let state = self.queries.peek::<EmployeePage>(&employees_key(&query));

        let pagination = state
            .data
            .as_ref()
            .map(|page| PaginationState::from(page.pagination))
            .unwrap_or(PaginationState {
                items_per_page: self.per_page,
                ..PaginationState::default()
            });
        let rows = state
            .data
            .as_ref()
            .map(|page| {
                page.employees
                    .iter()
                    .enumerate()
                    .map(|(i, employee)| EmployeeRow {
                        number: pagination.row_number(i),
                        employee: employee.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        EmployeeListView {
            has_filters: !query.search.is_empty() || !query.division.is_empty(),
            search_input: self.search.value(),
            rows,
            pagination,
            is_loading: state.is_loading,
            error: state.error.map(|e| e.user_message(LOAD_FAILED)),
            delete_target: self.delete_target(),
            delete_pending: self.delete.is_pending(),
            query,
        }
    }

    fn observe(&self, key: &QueryKey) {
        let mut observer = self.observer.lock().unwrap_or_else(PoisonError::into_inner);
        if observer.as_ref().is_some_and(|(k, _)| k == key) {
            return;
        }
        *observer = Some((key.clone(), self.queries.observe(key)));
    }

    // ========== Divisions ==========

    /// Options of the division filter
    pub async fn divisions(&self) -> ClientResult<Arc<Vec<Division>>> {
        Ok(fetch_all_divisions(&self.queries, &self.divisions).await?)
    }

    /// Name of the selected division for the filter chip
    pub fn division_name(&self, id: &str) -> Option<String> {
        cached_divisions(&self.queries)?
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.name.clone())
    }

    // ========== Filters ==========

    /// Keystroke in the search box
    pub fn type_search(&self, value: &str) {
        self.search.input(value);
    }

    pub fn change_page(&self, page: u32) {
        self.params.set_page(page);
    }

    pub fn change_division(&self, division: &str) {
        self.params.set_division(division);
    }

    pub fn clear_search(&self) {
        self.search.clear();
    }

    pub fn clear_division(&self) {
        self.params.set_division("");
    }

    pub fn reset_filters(&self) {
        self.search.clear();
        self.params.set_division("");
    }

    // ========== Delete ==========

    /// Open the confirmation for `employee`
    pub fn request_delete(&self, employee: Employee) {
        self.delete.reset();
        *self.lock_target() = Some(employee);
    }

    /// Close the confirmation without deleting
    pub fn cancel_delete(&self) {
        if self.delete.is_pending() {
            return;
        }
        *self.lock_target() = None;
    }

    pub fn delete_target(&self) -> Option<Employee> {
        self.lock_target().clone()
    }

    pub fn delete_status(&self) -> MutationStatus {
        self.delete.status()
    }

    /// Delete the confirmed employee and reload
    ///
    /// On failure the confirmation stays open with the error in
    /// [`delete_status`](Self::delete_status).
    pub async fn confirm_delete(&self) -> ClientResult<EmployeeListView> {
        let target = self
            .delete_target()
            .ok_or_else(|| ClientError::Validation("No employee selected".into()))?;

        self.delete.run(self.employees.delete(&target.id)).await?;
        *self.lock_target() = None;
        Ok(self.load().await)
    }

    fn lock_target(&self) -> std::sync::MutexGuard<'_, Option<Employee>> {
        self.delete_target.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_covers_every_filter() {
        let key = employees_key(&ListQuery {
            page: 2,
            search: "john".into(),
            division: String::new(),
        });
        assert_eq!(key.to_string(), "employees{division=, page=2, search=john}");
        assert_ne!(key, employees_key(&ListQuery::default()));
    }
}
