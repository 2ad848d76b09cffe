//! Query-parameter state
//!
//! The location's query string is the single source of truth for the list
//! filters. Nothing is cached here: every read re-parses the current
//! location, every write is one `History::replace`.

use std::sync::Arc;

use reqwest::Url;

use crate::history::History;

/// Query keys owned by the list
pub const PAGE: &str = "page";
pub const SEARCH: &str = "search";
pub const DIVISION: &str = "division";

/// Snapshot of the list filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub search: String,
    pub division: String,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            search: String::new(),
            division: String::new(),
        }
    }
}

/// Several filter changes applied in one replace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamsPatch {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub division: Option<String>,
}

/// Reads and writes `page`, `search` and `division` on a history
pub struct QueryParams<H: History + ?Sized = dyn History> {
    history: Arc<H>,
}

impl<H: History + ?Sized> Clone for QueryParams<H> {
    fn clone(&self) -> Self {
        Self {
            history: self.history.clone(),
        }
    }
}

impl<H: History + ?Sized> std::fmt::Debug for QueryParams<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryParams")
            .field("location", &self.history.location().as_str())
            .finish()
    }
}

impl<H: History + ?Sized> QueryParams<H> {
    pub fn new(history: Arc<H>) -> Self {
        Self { history }
    }

    pub fn history(&self) -> &Arc<H> {
        &self.history
    }

    // ========== Reads ==========

    /// Current page, `1` when absent, unparsable or below 1
    pub fn page(&self) -> u32 {
        self.get(PAGE)
            .and_then(|raw| parse_leading_int(&raw))
            .filter(|page| *page >= 1)
            .map(|page| u32::try_from(page).unwrap_or(u32::MAX))
            .unwrap_or(1)
    }

    /// Committed search text
    pub fn search(&self) -> String {
        self.get(SEARCH).unwrap_or_default()
    }

    /// Selected division id
    pub fn division(&self) -> String {
        self.get(DIVISION).unwrap_or_default()
    }

    pub fn current(&self) -> ListQuery {
        ListQuery {
            page: self.page(),
            search: self.search(),
            division: self.division(),
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        self.history
            .location()
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    // ========== Writes ==========

    /// Page 1 is the default and is written as "no page"
    pub fn set_page(&self, page: u32) {
        self.update(|pairs| set_page(pairs, page));
    }

    /// Changing the search always returns to the first page
    pub fn set_search(&self, search: &str) {
        self.update(|pairs| {
            set_or_remove(pairs, SEARCH, search);
            remove(pairs, PAGE);
        });
    }

    /// Changing the division always returns to the first page
    pub fn set_division(&self, division: &str) {
        self.update(|pairs| {
            set_or_remove(pairs, DIVISION, division);
            remove(pairs, PAGE);
        });
    }

    /// Apply every `Some` field of `patch` at once
    pub fn set_params(&self, patch: ParamsPatch) {
        self.update(|pairs| {
            let filters_changed = patch.search.is_some() || patch.division.is_some();
            if let Some(search) = &patch.search {
                set_or_remove(pairs, SEARCH, search);
            }
            if let Some(division) = &patch.division {
                set_or_remove(pairs, DIVISION, division);
            }
            match patch.page {
                Some(page) => set_page(pairs, page),
                None if filters_changed => remove(pairs, PAGE),
                None => {}
            }
        });
    }

    fn update(&self, apply: impl FnOnce(&mut Vec<(String, String)>)) {
        let mut url = self.history.location();
        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        apply(&mut pairs);
        write_query(&mut url, &pairs);
        tracing::trace!(query = url.query().unwrap_or(""), "Query params replaced");
        self.history.replace(url);
    }
}

fn set_page(pairs: &mut Vec<(String, String)>, page: u32) {
    if page <= 1 {
        remove(pairs, PAGE);
    } else {
        set(pairs, PAGE, &page.to_string());
    }
}

fn set_or_remove(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
    if value.is_empty() {
        remove(pairs, key);
    } else {
        set(pairs, key, value);
    }
}

/// Overwrite in place, keeping the key's position
fn set(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
    let mut seen = false;
    pairs.retain_mut(|(k, v)| {
        if k != key {
            return true;
        }
        if seen {
            return false;
        }
        seen = true;
        *v = value.to_string();
        true
    });
    if !seen {
        pairs.push((key.to_string(), value.to_string()));
    }
}

fn remove(pairs: &mut Vec<(String, String)>, key: &str) {
    pairs.retain(|(k, _)| k != key);
}

fn write_query(url: &mut Url, pairs: &[(String, String)]) {
    if pairs.is_empty() {
        url.set_query(None);
        return;
    }
    url.set_query(None);
    url.query_pairs_mut().extend_pairs(pairs);
}

/// Integer prefix of `raw`: leading whitespace, an optional sign, digits.
///
/// Anything after the digits is ignored (`"2abc"` is 2). `None` when there
/// are no digits. Saturates instead of overflowing.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits: &str = &digits[..digits.bytes().take_while(u8::is_ascii_digit).count()];
    if digits.is_empty() {
        return None;
    }
    let value = digits.bytes().fold(0i64, |acc, d| {
        acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
    });
    Some(if negative { -value } else { value })
}
