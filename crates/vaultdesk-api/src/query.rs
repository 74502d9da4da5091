// Query-string encoding
//
// Nested parameter objects are flattened with dot notation
// (`search.name=Acme`), matching what the back office parses.
// List endpoints share one parameter set with per-endpoint defaults.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::error::Error;

/// Flatten a JSON object into `(dotted.key, value)` pairs.
///
/// Nested objects recurse with `.` separators, arrays repeat the key,
/// `null` is skipped, and scalars are stringified. A non-object value
/// yields no pairs.
pub fn flatten(value: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    if let Value::Object(map) = value {
        for (key, nested) in map {
            flatten_into(key, nested, &mut out);
        }
    }
    out
}

fn flatten_into(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(&format!("{prefix}.{key}"), nested, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten_into(prefix, item, out);
            }
        }
        Value::String(s) => out.push((prefix.to_owned(), s.clone())),
        Value::Bool(b) => out.push((prefix.to_owned(), b.to_string())),
        Value::Number(n) => out.push((prefix.to_owned(), n.to_string())),
    }
}

/// Serialize any parameter struct and flatten it.
pub fn to_pairs<T: Serialize + ?Sized>(params: &T) -> Result<Vec<(String, String)>, Error> {
    let value = serde_json::to_value(params).map_err(|e| Error::Encoding(e.to_string()))?;
    Ok(flatten(&value))
}

/// Append encoded pairs to a URL's query string.
pub fn append_pairs(url: &mut Url, pairs: &[(String, String)]) {
    if pairs.is_empty() {
        return;
    }
    url.query_pairs_mut()
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
}

// ── List parameters ─────────────────────────────────────────────────

/// Fallbacks a list endpoint applies to unset parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListDefaults {
    pub page_size: u32,
    pub sort: &'static str,
}

impl ListDefaults {
    /// Most list endpoints: ten per page, newest first.
    pub const STANDARD: Self = Self {
        page_size: 10,
        sort: "-_id",
    };

    /// Reference data fetched in one go (e.g. permissions).
    pub const EXHAUSTIVE: Self = Self {
        page_size: 100_000,
        sort: "_id",
    };
}

impl Default for ListDefaults {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Parameters for a list request.
///
/// `search` becomes `search.<field>=<value>`, `filter` becomes
/// `filter.<field>=<value>`, `extra` keys are sent as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search: BTreeMap<String, String>,
    pub filter: BTreeMap<String, String>,
    pub extra: BTreeMap<String, String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort: Option<String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.search.insert(field.into(), value.into());
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter.insert(field.into(), value.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Encode with the endpoint's defaults filled in.
    ///
    /// Zero page numbers and sizes count as unset, as does an empty sort.
    pub fn to_pairs(&self, defaults: ListDefaults) -> Vec<(String, String)> {
        let mut root = Map::new();
        if !self.search.is_empty() {
            root.insert("search".into(), string_map(&self.search));
        }
        if !self.filter.is_empty() {
            root.insert("filter".into(), string_map(&self.filter));
        }
        for (key, value) in &self.extra {
            root.insert(key.clone(), Value::String(value.clone()));
        }

        let page = self.page.filter(|p| *p > 0).unwrap_or(1);
        let page_size = self
            .page_size
            .filter(|s| *s > 0)
            .unwrap_or(defaults.page_size);
        let sort = self
            .sort
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.sort);

        root.insert("page".into(), Value::from(page));
        root.insert("page_size".into(), Value::from(page_size));
        root.insert("sort".into(), Value::from(sort));

        flatten(&Value::Object(root))
    }
}

fn string_map(map: &BTreeMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}
