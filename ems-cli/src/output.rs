//! Plain-text rendering

use ems_client::views::{DashboardSummary, EmployeeListView};
use ems_client::{Division, Employee, PageItem, PaginationState, User};

pub fn user(user: &User) -> String {
    let mut out = format!("{} (@{})", user.name, user.username);
    if let Some(email) = &user.email {
        out.push_str(&format!("\n  email: {email}"));
    }
    if let Some(phone) = &user.phone {
        out.push_str(&format!("\n  phone: {phone}"));
    }
    out
}

pub fn employee(employee: &Employee) -> String {
    let phone = if employee.phone.is_empty() { "-" } else { &employee.phone };
    format!(
        "{} [{}]\n  division: {}\n  position: {}\n  phone:    {}\n  photo:    {}",
        employee.name,
        employee.id,
        employee.division.name,
        employee.position,
        phone,
        employee.avatar_url(),
    )
}

pub fn employee_list(view: &EmployeeListView) -> String {
    if view.rows.is_empty() {
        return if view.has_filters {
            "No employees match the current filters".into()
        } else {
            "No employees yet".into()
        };
    }

    let mut lines: Vec<String> = view
        .rows
        .iter()
        .map(|row| {
            format!(
                "{:>4}  {:<8} {:<24} {:<16} {}",
                row.number,
                row.employee.id,
                truncate(&row.employee.name, 24),
                truncate(&row.employee.division.name, 16),
                row.employee.position,
            )
        })
        .collect();
    lines.push(footer(&view.pagination));
    lines.join("\n")
}

/// "Showing 11 to 13 of 13 employees  [1] 2"
fn footer(pagination: &PaginationState) -> String {
    let (from, to) = pagination.item_range();
    let mut out = format!("Showing {from} to {to} of {} employees", pagination.total_items);
    if pagination.shows_pager() {
        let pages: Vec<String> = pagination
            .page_items()
            .into_iter()
            .map(|item| match item {
                PageItem::Page(p) if p == pagination.current_page => format!("[{p}]"),
                PageItem::Page(p) => p.to_string(),
                PageItem::Ellipsis => "...".into(),
            })
            .collect();
        out.push_str("  ");
        out.push_str(&pages.join(" "));
    }
    out
}

pub fn divisions(divisions: &[Division]) -> String {
    if divisions.is_empty() {
        return "No divisions".into();
    }
    divisions
        .iter()
        .map(|d| format!("{:<8} {}", d.id, d.name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn dashboard(summary: &DashboardSummary) -> String {
    let mut lines = vec![
        format!("Employees: {}", summary.total_employees),
        format!("Divisions: {}", summary.total_divisions),
        format!("Positions: {}", summary.position_count),
    ];
    if !summary.recent.is_empty() {
        lines.push("Recent:".into());
        lines.extend(
            summary
                .recent
                .iter()
                .map(|e| format!("  {} - {} ({})", e.name, e.position, e.division.name)),
        );
    }
    lines.join("\n")
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
