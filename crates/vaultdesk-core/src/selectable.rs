// ── Typeahead option sources ──
//
// A `Selectable` backs one select box: it loads an initial option list,
// re-searches as the user types (debounced), and publishes the options
// through a `watch` channel. Each instance owns its own search slot, so
// two select boxes over the same collection never cancel each other.

use std::sync::Arc;

use futures_core::Stream;
use futures_util::StreamExt;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;
use vaultdesk_api::{ApiClient, ListQuery, Page, Resource, SearchSlot};

use crate::debounce::Debounce;
use crate::error::CoreError;

/// Options fetched per search.
pub const OPTION_PAGE_SIZE: u32 = 100;

/// One entry of a select box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    /// The record the option was built from.
    pub record: Value,
}

/// Snapshot published to subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectableState {
    pub options: Arc<Vec<SelectOption>>,
    pub loading: bool,
}

type Mapper = fn(&Value) -> Option<SelectOption>;

/// Label from `name`, value from `_id`.
pub fn name_option(record: &Value) -> Option<SelectOption> {
    Some(SelectOption {
        label: record.get("name")?.as_str()?.to_owned(),
        value: record.get("_id")?.as_str()?.to_owned(),
        record: record.clone(),
    })
}

/// Label from `transaction_number`, value from `_id`.
pub fn transaction_option(record: &Value) -> Option<SelectOption> {
    Some(SelectOption {
        label: record.get("transaction_number")?.as_str()?.to_owned(),
        value: record.get("_id")?.as_str()?.to_owned(),
        record: record.clone(),
    })
}

pub struct Selectable {
    client: Arc<ApiClient>,
    resource: Resource,
    /// Fixed search terms sent with every query, e.g. `status=active`.
    base_search: Vec<(String, String)>,
    mapper: Mapper,
    debounce: Debounce,
    slot: SearchSlot,
    state: watch::Sender<SelectableState>,
}

impl std::fmt::Debug for Selectable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selectable")
            .field("resource", &self.resource)
            .field("base_search", &self.base_search)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Selectable {
    pub fn new(client: Arc<ApiClient>, resource: Resource) -> Self {
        let (state, _) = watch::channel(SelectableState::default());
        Self {
            client,
            resource,
            base_search: Vec::new(),
            mapper: name_option,
            debounce: Debounce::default(),
            slot: SearchSlot::new(),
            state,
        }
    }

    /// Active stocks, labelled by transaction number.
    pub fn stocks(client: Arc<ApiClient>) -> Self {
        Self::new(client, Resource::Stocks)
            .with_search("status", "active")
            .with_mapper(transaction_option)
    }

    pub fn with_search(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.base_search.push((field.into(), value.into()));
        self
    }

    pub fn with_mapper(mut self, mapper: Mapper) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn with_debounce(mut self, debounce: Debounce) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<SelectableState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SelectableState {
        self.state.borrow().clone()
    }

    fn query(&self, text: Option<&str>) -> ListQuery {
        let mut query = ListQuery::new().page(1).page_size(OPTION_PAGE_SIZE);
        if let Some(text) = text.filter(|t| !t.is_empty()) {
            query = query.search("all", text);
        }
        for (field, value) in &self.base_search {
            query = query.search(field.clone(), value.clone());
        }
        query
    }

    /// Initial option list, before anything is typed.
    pub async fn load(&self) -> Result<(), CoreError> {
        self.fetch(None).await
    }

    /// Replace the options with matches for `text`.
    ///
    /// A call superseded by a newer one returns `Ok` without touching the
    /// published state; the newer call owns it.
    pub async fn search(&self, text: &str) -> Result<(), CoreError> {
        self.fetch(Some(text)).await
    }

    async fn fetch(&self, text: Option<&str>) -> Result<(), CoreError> {
        let query = self.query(text);
        self.state.send_modify(|s| s.loading = true);

        let result = self
            .slot
            .run(self.client.list::<Value>(self.resource, &query))
            .await;

        match result {
            Ok(page) => {
                self.publish(&page);
                Ok(())
            }
            Err(vaultdesk_api::Error::Cancelled) => {
                debug!(resource = %self.resource, "option search superseded");
                Ok(())
            }
            Err(e) => {
                self.state.send_modify(|s| s.loading = false);
                Err(e.into())
            }
        }
    }

    fn publish(&self, page: &Page<Value>) {
        let options: Vec<SelectOption> = page.data.iter().filter_map(self.mapper).collect();
        debug!(resource = %self.resource, count = options.len(), "options loaded");
        self.state.send_replace(SelectableState {
            options: Arc::new(options),
            loading: false,
        });
    }

    /// Drive searches from a stream of typed text until it ends.
    ///
    /// Input is debounced; a search still in flight when the next value
    /// settles is cancelled. Errors are logged and the last good options
    /// stay published.
    pub async fn follow<S>(&self, input: S)
    where
        S: Stream<Item = String>,
    {
        self.debounce
            .apply(input)
            .for_each_concurrent(None, move |text| async move {
                if let Err(e) = self.search(&text).await {
                    debug!(error = %e, "option search failed");
                }
            })
            .await;
    }
}
