//! Session facade and list-view plumbing between `vaultdesk-api` and its
//! consumers.
//!
//! - **[`Backoffice`]** owns the connection lifecycle and maps every API
//!   error into [`CoreError`].
//! - **[`TableFilter`]** / **[`TableSetting`]** hold the filter, sort,
//!   pagination and column state of one list view; **[`QueryParams`]**
//!   keeps that state and the URL query string in step.
//! - **[`Debounce`]** and **[`Selectable`]** turn typed input into
//!   latest-wins searches.
//! - **[`guard`]** decides route access from the cached identity.

pub mod backoffice;
pub mod config;
pub mod debounce;
pub mod error;
pub mod format;
pub mod guard;
pub mod password;
pub mod query_params;
pub mod selectable;
pub mod table;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backoffice::{Backoffice, ConnectionState};
pub use config::{AuthCredentials, BackofficeConfig, TlsVerification};
pub use debounce::Debounce;
pub use error::CoreError;
pub use guard::{Navigation, RouteMeta, entity_link};
pub use query_params::{History, Navigator, QueryContext, QueryParams};
pub use selectable::{SelectOption, Selectable, SelectableState};
pub use table::{Column, SortOrder, TableFilter, TableSetting};

// API types consumers need alongside the facade.
pub use vaultdesk_api::{
    DeleteResult, ErrorReport, Identity, InsertResult, ListQuery, Page, Pagination, Resource,
    Role, UpdateResult, models,
};
