// ── URL ⇄ list-view state ──
//
// Keeps a list view's filter, sort, pagination and column visibility in
// the URL query string so a view can be bookmarked, shared and restored.
//
// URL contract:
//   search.<field>=<value>   filter value for <field>
//   sort=name,-created_at    `-` marks descending
//   page=<n>                 1-based, omitted when 1
//   page-size=<n>
//   columns=code,name        visible selectable columns

use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use tracing::debug;
use url::Url;
use vaultdesk_api::query::flatten;

use crate::table::{SortOrder, TableFilter, TableSetting};

const SEARCH_PREFIX: &str = "search.";

/// Everything a list view mirrors into its URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryContext {
    pub table: TableFilter,
    pub setting: Option<TableSetting>,
}

impl QueryContext {
    pub fn new(table: TableFilter) -> Self {
        Self {
            table,
            setting: None,
        }
    }

    pub fn with_setting(mut self, setting: TableSetting) -> Self {
        self.setting = Some(setting);
        self
    }

    /// Decode URL query pairs into this context.
    ///
    /// Keys the context does not know are ignored. Sort keys missing from
    /// `sort` keep their current direction.
    pub fn apply<K, V>(&mut self, query: &[(K, V)])
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in query {
            let (key, value) = (key.as_ref(), value.as_ref());

            if let Some(field) = key.strip_prefix(SEARCH_PREFIX) {
                let field = field.trim();
                if !field.is_empty() {
                    self.table.filter.insert(field.to_owned(), value.to_owned());
                }
                continue;
            }

            match key {
                "sort" => {
                    for entry in value.split(',').map(str::trim) {
                        let (order, field) = match entry.strip_prefix('-') {
                            Some(field) => (SortOrder::Descending, field),
                            None => (
                                SortOrder::Ascending,
                                entry.strip_prefix('+').unwrap_or(entry),
                            ),
                        };
                        if !field.is_empty() {
                            self.table.sort.insert(field.to_owned(), order);
                        }
                    }
                }
                "page" => {
                    self.table.pagination.page = parse_positive(value).unwrap_or(1);
                }
                "page-size" => {
                    let size = parse_positive(value).unwrap_or(self.table.default_page_size());
                    self.table.pagination.page_size = size;
                    if let Some(setting) = self.setting.as_mut() {
                        setting.select_page_size(size);
                    }
                }
                "columns" => {
                    if let Some(setting) = self.setting.as_mut() {
                        let visible: Vec<&str> = value.split(',').map(str::trim).collect();
                        setting.show_only(&visible);
                    }
                }
                _ => {}
            }
        }
    }

    /// The nested parameter object for [`QueryParams::update`].
    pub fn to_params(&self) -> Value {
        let search: Map<String, Value> = self
            .table
            .filter
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        let mut params = json!({
            "search": search,
            "sort": self.table.sort_string(),
            "page": self.table.pagination.page,
            "page-size": self.table.pagination.page_size,
        });
        if let (Some(setting), Value::Object(map)) = (&self.setting, &mut params) {
            map.insert("columns".into(), Value::String(setting.visible_columns()));
        }
        params
    }

    /// Encoded query pairs with defaults (`page=1`, empty values) dropped.
    pub fn to_query(&self) -> Vec<(String, String)> {
        flatten(&self.to_params())
            .into_iter()
            .filter(|(k, v)| keep_param(k, v))
            .collect()
    }
}

/// `parseInt`-style: leading digits only, and zero or negative is unset.
fn parse_positive(value: &str) -> Option<u32> {
    let digits: String = value
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse::<u32>().ok().filter(|n| *n > 0)
}

fn keep_param(key: &str, value: &str) -> bool {
    !value.is_empty() && !(key == "page" && value == "1")
}

// ── Navigation ───────────────────────────────────────────────────────

/// Where a view's URL lives: a browser router, a terminal session, a test.
pub trait Navigator {
    /// Query pairs of the current location.
    fn current_query(&self) -> Vec<(String, String)>;

    /// Navigate to the current path with a new query string.
    fn push(&mut self, query: Vec<(String, String)>);
}

/// In-memory navigation history over absolute URLs.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Url>,
}

impl History {
    pub fn new(start: Url) -> Self {
        Self {
            entries: vec![start],
        }
    }

    pub fn current(&self) -> &Url {
        // `entries` starts non-empty and `back` never pops the last one.
        &self.entries[self.entries.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Step back one entry. Returns `false` at the start of history.
    pub fn back(&mut self) -> bool {
        if self.entries.len() > 1 {
            self.entries.pop();
            true
        } else {
            false
        }
    }
}

impl Navigator for History {
    fn current_query(&self) -> Vec<(String, String)> {
        self.current()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn push(&mut self, query: Vec<(String, String)>) {
        let mut next = self.current().clone();
        if query.is_empty() {
            next.set_query(None);
        } else {
            next.query_pairs_mut().clear().extend_pairs(query);
        }
        debug!(url = %next, "navigating");
        self.entries.push(next);
    }
}

/// Reads and writes a view's state through a [`Navigator`].
#[derive(Debug, Clone)]
pub struct QueryParams<N: Navigator> {
    navigator: N,
}

impl<N: Navigator> QueryParams<N> {
    pub fn new(navigator: N) -> Self {
        Self { navigator }
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn into_inner(self) -> N {
        self.navigator
    }

    /// Load the current location into `ctx`.
    pub fn apply(&self, ctx: &mut QueryContext) {
        ctx.apply(&self.navigator.current_query());
    }

    /// Flatten `params`, merge them over the current query (unrelated keys
    /// survive), drop empty values and `page=1`, and navigate.
    ///
    /// Returns the pushed query.
    pub fn update(&mut self, params: &Value) -> Vec<(String, String)> {
        let mut merged: IndexMap<String, String> =
            self.navigator.current_query().into_iter().collect();
        for (key, value) in flatten(params) {
            merged.insert(key, value);
        }
        let query: Vec<(String, String)> = merged
            .into_iter()
            .filter(|(k, v)| keep_param(k, v))
            .collect();
        self.navigator.push(query.clone());
        query
    }

    /// Write `ctx` into the URL.
    pub fn sync(&mut self, ctx: &QueryContext) -> Vec<(String, String)> {
        self.update(&ctx.to_params())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::table::Column;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn bank_view() -> QueryContext {
        let table = TableFilter::default().with_sort_keys(["name", "created_at"]);
        let setting = TableSetting::new(
            [
                ("code".to_owned(), Column::mandatory("Code")),
                ("name".to_owned(), Column::new("Name")),
                ("branch".to_owned(), Column::new("Branch")),
            ]
            .into_iter()
            .collect(),
        );
        QueryContext::new(table).with_setting(setting)
    }

    fn history(query: &str) -> History {
        History::new(Url::parse(&format!("https://bo.example.test/master/banks{query}")).expect("url"))
    }

    #[test]
    fn decodes_search_sort_and_pagination() {
        let mut ctx = bank_view();
        let params = QueryParams::new(history(
            "?search.name=Acme&sort=-created_at&page=2&page-size=25",
        ));
        params.apply(&mut ctx);

        let expected: BTreeMap<String, String> = [("name".to_owned(), "Acme".to_owned())].into();
        assert_eq!(ctx.table.filter, expected);
        assert_eq!(ctx.table.sort_order("created_at"), SortOrder::Descending);
        assert_eq!(ctx.table.sort_order("name"), SortOrder::None);
        assert_eq!(ctx.table.pagination.page, 2);
        assert_eq!(ctx.table.pagination.page_size, 25);
        assert_eq!(ctx.setting.as_ref().map(|s| s.page_size), Some(25));
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let mut ctx = bank_view();
        ctx.apply(&pairs(&[("page", "abc"), ("page-size", "0")]));
        assert_eq!(ctx.table.pagination.page, 1);
        assert_eq!(ctx.table.pagination.page_size, 10);

        ctx.apply(&pairs(&[("page", "3x"), ("page-size", "-5")]));
        assert_eq!(ctx.table.pagination.page, 3);
        assert_eq!(ctx.table.pagination.page_size, 10);
    }

    #[test]
    fn invalid_page_size_uses_the_table_default() {
        let mut ctx = QueryContext::new(TableFilter::default().with_default_page_size(100_000));
        ctx.apply(&pairs(&[("page-size", "none")]));
        assert_eq!(ctx.table.pagination.page_size, 100_000);
    }

    #[test]
    fn unknown_page_size_selects_first_option() {
        let mut ctx = bank_view();
        ctx.apply(&pairs(&[("page-size", "33")]));
        assert_eq!(ctx.table.pagination.page_size, 33);
        assert_eq!(ctx.setting.as_ref().map(|s| s.page_size), Some(10));
    }

    #[test]
    fn unmentioned_sort_keys_keep_their_direction() {
        let mut ctx = bank_view();
        ctx.table.toggle_sort("name");
        ctx.apply(&pairs(&[("sort", "-created_at")]));
        assert_eq!(ctx.table.sort_order("name"), SortOrder::Ascending);
        assert_eq!(ctx.table.sort_order("created_at"), SortOrder::Descending);
    }

    #[test]
    fn columns_never_touch_mandatory_ones() {
        let mut ctx = bank_view();
        ctx.apply(&pairs(&[("columns", "branch")]));
        let setting = ctx.setting.as_ref().expect("setting");
        assert!(setting.columns["code"].visible);
        assert!(!setting.columns["name"].visible);
        assert!(setting.columns["branch"].visible);

        // Excluding the mandatory column explicitly changes nothing either.
        ctx.apply(&pairs(&[("columns", "name")]));
        assert!(ctx.setting.as_ref().expect("setting").columns["code"].visible);
    }

    #[test]
    fn update_merges_and_drops_defaults() {
        let mut params = QueryParams::new(history("?tab=archived&search.name=old"));
        let pushed = params.update(&json!({
            "search": { "name": "", "code": "BCA" },
            "page": 1,
            "page-size": 25,
        }));

        assert_eq!(
            pushed,
            pairs(&[("tab", "archived"), ("page-size", "25"), ("search.code", "BCA")])
        );
        assert_eq!(params.navigator().len(), 2);
        assert_eq!(
            params.navigator().current().query(),
            Some("tab=archived&page-size=25&search.code=BCA")
        );
    }

    #[test]
    fn round_trip_restores_state() {
        let mut ctx = bank_view();
        ctx.table.filter.insert("name".into(), "Acme".into());
        ctx.table.filter.insert("code".into(), String::new());
        ctx.table.toggle_sort("name");
        ctx.table.toggle_sort("created_at");
        ctx.table.toggle_sort("created_at");
        ctx.table.pagination.page = 3;
        ctx.table.pagination.page_size = 50;
        if let Some(setting) = ctx.setting.as_mut() {
            setting.select_page_size(50);
            setting.set_visible("branch", false);
        }

        let mut params = QueryParams::new(history(""));
        params.sync(&ctx);

        let mut restored = bank_view();
        params.apply(&mut restored);

        // The empty filter is dropped on encode; everything else survives.
        ctx.table.filter.remove("code");
        assert_eq!(restored, ctx);
    }

    #[test]
    fn first_page_is_left_out_of_the_url() {
        let ctx = bank_view();
        let query = ctx.to_query();
        assert!(query.iter().all(|(k, _)| k != "page"));
        assert!(query.contains(&("page-size".to_owned(), "10".to_owned())));
    }
}
