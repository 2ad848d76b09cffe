//! Pager state
//!
//! Client-side view of the server's pagination block, plus the numbered
//! pager with ellipses (at most five numeric slots).

use shared::ApiPagination;
use shared::request::DEFAULT_PER_PAGE;

/// Numeric slots shown before ellipses kick in
const MAX_VISIBLE_PAGES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total_items: 0,
            items_per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl From<ApiPagination> for PaginationState {
    fn from(p: ApiPagination) -> Self {
        Self {
            current_page: p.current_page.max(1),
            total_pages: p.last_page.max(1),
            total_items: p.total,
            items_per_page: p.per_page.max(1),
        }
    }
}

/// One pager slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

impl PaginationState {
    /// Single-page results hide the pager
    pub fn shows_pager(&self) -> bool {
        self.total_pages > 1
    }

    /// 1-based row number of the `index`-th row on this page
    pub fn row_number(&self, index: usize) -> u64 {
        u64::from(self.current_page - 1) * u64::from(self.items_per_page) + index as u64 + 1
    }

    /// First and last row number shown ("showing 11 - 13 of 13")
    pub fn item_range(&self) -> (u64, u64) {
        let start = self.row_number(0);
        let end = (u64::from(self.current_page) * u64::from(self.items_per_page)).min(self.total_items);
        (start, end)
    }

    pub fn page_items(&self) -> Vec<PageItem> {
        let current = self.current_page;
        let total = self.total_pages;
        if total <= MAX_VISIBLE_PAGES {
            return (1..=total).map(PageItem::Page).collect();
        }

        let mut items = vec![PageItem::Page(1)];
        if current > 3 {
            items.push(PageItem::Ellipsis);
        }
        let start = current.saturating_sub(1).max(2);
        let end = (current + 1).min(total - 1);
        items.extend((start..=end).map(PageItem::Page));
        if current + 2 < total {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Page(total));
        items
    }

    pub fn previous(&self) -> Option<u32> {
        (self.current_page > 1).then(|| self.current_page - 1)
    }

    pub fn next(&self) -> Option<u32> {
        (self.current_page < self.total_pages).then(|| self.current_page + 1)
    }
}
