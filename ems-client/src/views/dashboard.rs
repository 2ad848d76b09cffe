//! Dashboard: headline counts and the most recent employees

use std::collections::BTreeSet;
use std::sync::Arc;

use shared::Employee;
use shared::request::{DIVISIONS_PAGE_SIZE, DivisionQuery, EmployeeQuery};

use super::{DIVISIONS, EMPLOYEES};
use crate::cache::{Mutation, QueryClient, QueryKey};
use crate::services::{DivisionPage, DivisionService, EmployeePage, EmployeeService};
use crate::ClientResult;

/// Employees shown on the dashboard
pub const RECENT_EMPLOYEES: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_employees: u64,
    pub total_divisions: u64,
    /// Distinct positions among `recent`
    pub position_count: usize,
    pub recent: Vec<Employee>,
}

pub struct Dashboard {
    queries: QueryClient,
    employees: EmployeeService,
    divisions: DivisionService,
    delete: Mutation,
}

impl Dashboard {
    pub fn new(queries: QueryClient, employees: EmployeeService, divisions: DivisionService) -> Self {
        Self {
            delete: Mutation::new("delete employee", queries.clone()).invalidates(EMPLOYEES),
            queries,
            employees,
            divisions,
        }
    }

    pub async fn load(&self) -> ClientResult<DashboardSummary> {
        let employees = self.employees.clone();
        let divisions = self.divisions.clone();

        let (recent, division_page) = tokio::join!(
            self.queries.fetch(
                QueryKey::new(EMPLOYEES).with("scope", "dashboard"),
                move || {
                    let employees = employees.clone();
                    async move { employees.list(&EmployeeQuery::first(RECENT_EMPLOYEES)).await }
                },
            ),
            self.queries.fetch(
                QueryKey::new(DIVISIONS).with("scope", "dashboard"),
                move || {
                    let divisions = divisions.clone();
                    async move {
                        let query = DivisionQuery {
                            per_page: Some(DIVISIONS_PAGE_SIZE),
                            ..DivisionQuery::default()
                        };
                        divisions.list(&query).await
                    }
                },
            ),
        );
        let recent: Arc<EmployeePage> = recent?;
        let division_page: Arc<DivisionPage> = division_page?;

        Ok(summarize(&recent, &division_page))
    }

    pub fn is_deleting(&self) -> bool {
        self.delete.is_pending()
    }

    /// Delete from the recent list; the summary reloads afterwards
    pub async fn delete(&self, id: &str) -> ClientResult<DashboardSummary> {
        self.delete.run(self.employees.delete(id)).await?;
        self.load().await
    }
}

fn summarize(recent: &EmployeePage, divisions: &DivisionPage) -> DashboardSummary {
    let positions: BTreeSet<&str> = recent.employees.iter().map(|e| e.position.as_str()).collect();
    DashboardSummary {
        total_employees: recent.pagination.total,
        total_divisions: divisions.pagination.total,
        position_count: positions.len(),
        recent: recent.employees.clone(),
    }
}
