// ── List-view filter, sort and pagination ──
//
// The mutable state behind one table: the active filter values, the
// per-column sort direction, and where in the result set the view is.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use vaultdesk_api::{ListQuery, Pagination};

/// Default rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Sort direction of one column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    None,
    Ascending,
    Descending,
}

impl SortOrder {
    /// The next state of the header-click cycle: none → asc → desc → none.
    pub fn next(self) -> Self {
        match self {
            Self::None => Self::Ascending,
            Self::Ascending => Self::Descending,
            Self::Descending => Self::None,
        }
    }

    /// `1`, `-1` or `0`.
    pub fn as_i8(self) -> i8 {
        match self {
            Self::None => 0,
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }

    pub fn from_i8(value: i8) -> Self {
        match value.signum() {
            1 => Self::Ascending,
            -1 => Self::Descending,
            _ => Self::None,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

/// Filter, sort and pagination state of one list view.
///
/// Built from the view's defaults; [`reset_filter`](Self::reset_filter)
/// restores those defaults rather than clearing to empty, so a view that
/// ships with `status=active` goes back to `status=active`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFilter {
    pub filter: BTreeMap<String, String>,
    /// Insertion-ordered; the order is the sort priority.
    pub sort: IndexMap<String, SortOrder>,
    pub pagination: Pagination,
    initial_filter: BTreeMap<String, String>,
    initial_sort: IndexMap<String, SortOrder>,
    default_page_size: u32,
}

impl Default for TableFilter {
    fn default() -> Self {
        Self::new(BTreeMap::new(), IndexMap::new())
    }
}

impl TableFilter {
    pub fn new(
        initial_filter: BTreeMap<String, String>,
        initial_sort: IndexMap<String, SortOrder>,
    ) -> Self {
        Self {
            filter: initial_filter.clone(),
            sort: initial_sort.clone(),
            pagination: Pagination {
                page: 1,
                page_count: 0,
                page_size: DEFAULT_PAGE_SIZE,
                total_document: 0,
            },
            initial_filter,
            initial_sort,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Declare sortable columns, all unsorted.
    pub fn with_sort_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            let key = key.into();
            self.initial_sort.entry(key.clone()).or_default();
            self.sort.entry(key).or_default();
        }
        self
    }

    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size;
        self.pagination.page_size = page_size;
        self
    }

    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    /// Restore every filter and sort key to its configured default.
    pub fn reset_filter(&mut self) {
        self.filter.clone_from(&self.initial_filter);
        for (key, order) in &mut self.sort {
            *order = self.initial_sort.get(key).copied().unwrap_or_default();
        }
    }

    pub fn sort_order(&self, key: &str) -> SortOrder {
        self.sort.get(key).copied().unwrap_or_default()
    }

    /// Advance `key` one step through none → asc → desc → none.
    pub fn toggle_sort(&mut self, key: &str) -> SortOrder {
        let order = self.sort.entry(key.to_owned()).or_default();
        *order = order.next();
        *order
    }

    /// API form of the sort: `name,-email`, unsorted columns skipped.
    pub fn sort_string(&self) -> String {
        self.sort
            .iter()
            .filter_map(|(key, order)| match order {
                SortOrder::None => None,
                SortOrder::Ascending => Some(key.clone()),
                SortOrder::Descending => Some(format!("-{key}")),
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Back to page 1, optionally with a new page size.
    pub fn reset_pagination(&mut self, page_size: Option<u32>) {
        self.pagination.page = 1;
        self.pagination.page_size = page_size.unwrap_or(self.default_page_size);
    }

    /// Take page counts from a list response.
    pub fn update_pagination(&mut self, pagination: &Pagination) {
        self.pagination = *pagination;
    }

    /// The request for the current state. Empty filter values are left
    /// out so an untouched field does not narrow the search.
    pub fn to_list_query(&self) -> ListQuery {
        let mut query = ListQuery::new()
            .page(self.pagination.page)
            .page_size(self.pagination.page_size);
        for (field, value) in self.filter.iter().filter(|(_, v)| !v.is_empty()) {
            query = query.search(field.clone(), value.clone());
        }
        let sort = self.sort_string();
        if !sort.is_empty() {
            query = query.sort(sort);
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn view() -> TableFilter {
        let filter = [("status".to_owned(), "active".to_owned())].into();
        let sort = [
            ("name".to_owned(), SortOrder::None),
            ("created_at".to_owned(), SortOrder::Descending),
        ]
        .into_iter()
        .collect();
        TableFilter::new(filter, sort)
    }

    #[test]
    fn toggle_cycles_through_three_states() {
        let mut table = view();
        let seen: Vec<i8> = (0..7).map(|_| table.toggle_sort("name").as_i8()).collect();
        assert_eq!(seen, vec![1, -1, 0, 1, -1, 0, 1]);
    }

    #[test]
    fn toggle_on_unknown_key_starts_ascending() {
        let mut table = TableFilter::default();
        assert_eq!(table.toggle_sort("email"), SortOrder::Ascending);
    }

    #[test]
    fn sort_string_keeps_insertion_order_and_skips_unsorted() {
        let mut table = view();
        assert_eq!(table.sort_string(), "-created_at");
        table.toggle_sort("name");
        assert_eq!(table.sort_string(), "name,-created_at");
    }

    #[test]
    fn reset_restores_configured_defaults() {
        let mut table = view();
        table.filter.insert("status".into(), "archived".into());
        table.filter.insert("name".into(), "acme".into());
        table.toggle_sort("name");
        table.toggle_sort("created_at");

        table.reset_filter();

        assert_eq!(table.filter.get("status").map(String::as_str), Some("active"));
        assert!(!table.filter.contains_key("name"));
        assert_eq!(table.sort_order("name"), SortOrder::None);
        assert_eq!(table.sort_order("created_at"), SortOrder::Descending);
    }

    #[test]
    fn reset_pagination_uses_default_size() {
        let mut table = view().with_default_page_size(25);
        table.pagination.page = 4;
        table.pagination.page_size = 100;
        table.reset_pagination(None);
        assert_eq!((table.pagination.page, table.pagination.page_size), (1, 25));
        table.reset_pagination(Some(50));
        assert_eq!(table.pagination.page_size, 50);
    }

    #[test]
    fn list_query_drops_empty_filters() {
        let mut table = view();
        table.filter.insert("name".into(), String::new());
        let query = table.to_list_query();
        assert_eq!(query.search.len(), 1);
        assert_eq!(query.sort.as_deref(), Some("-created_at"));
        assert_eq!(query.page, Some(1));
    }
}
