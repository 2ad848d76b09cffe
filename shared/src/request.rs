//! Request types for the shared crate
//!
//! Query-string parameters of the list endpoints. Empty filters are left
//! out of the query string rather than sent blank.

use serde::Serialize;

/// Default page size of the employee list
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Page size used when walking every division page
pub const DIVISIONS_PAGE_SIZE: u32 = 50;

/// `GET /employees` query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Name search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub division_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

impl EmployeeQuery {
    /// Query for one list page; empty search/division are dropped
    pub fn page(page: u32, search: &str, division_id: &str, per_page: u32) -> Self {
        Self {
            page: Some(page),
            name: non_empty(search),
            division_id: non_empty(division_id),
            per_page: Some(per_page),
        }
    }

    /// Query for the first `per_page` employees, unfiltered
    pub fn first(per_page: u32) -> Self {
        Self {
            page: None,
            name: None,
            division_id: None,
            per_page: Some(per_page),
        }
    }
}

/// `GET /divisions` query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DivisionQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl DivisionQuery {
    pub fn page(page: u32, per_page: u32) -> Self {
        Self {
            name: None,
            per_page: Some(per_page),
            page: Some(page),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filters_are_omitted() {
        let query = EmployeeQuery::page(2, "", "", 10);
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value, serde_json::json!({"page": 2, "per_page": 10}));
    }

    #[test]
    fn filters_use_backend_names() {
        let query = EmployeeQuery::page(1, "john", "d-7", 10);
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["name"], "john");
        assert_eq!(value["division_id"], "d-7");
    }
}
