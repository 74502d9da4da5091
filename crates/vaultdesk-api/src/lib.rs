//! Async client for the vaultdesk back-office REST API.
//!
//! - **[`ApiClient`]** sends every request through one pipeline: base-URL
//!   joining, the `client-user-agent` context header, cookie sessions, and
//!   transparent recovery from an expired session.
//! - **[`SessionCoordinator`]** caches the signed-in [`Identity`] and runs
//!   at most one refresh call at a time; requests that hit a 401 while a
//!   refresh is running queue behind it and replay once it succeeds.
//! - **[`ErrorReport`]** normalizes any [`Error`] into the
//!   `{message, lists, errors}` shape the UI renders.
//! - **[`SearchSlot`]** gives each consumer latest-wins cancellation.
//! - **[`query`]** encodes nested parameters in dot notation
//!   (`search.name=foo&page=1`).

pub mod audit;
pub mod auth;
pub mod client;
pub mod context;
pub mod error;
pub mod models;
pub mod query;
pub mod report;
pub mod resource;
pub mod search;
pub mod session;
pub mod transport;

pub use auth::EmailExists;
pub use client::ApiClient;
pub use context::{BrowserInfo, ClientContext, DeviceInfo, OsInfo};
pub use error::{ApiErrorBody, Error};
pub use query::{ListDefaults, ListQuery};
pub use report::ErrorReport;
pub use resource::{DeleteResult, InsertResult, Page, Pagination, Resource, UpdateResult};
pub use search::SearchSlot;
pub use session::{Identity, Role, SessionCoordinator};
pub use transport::{TlsMode, TransportConfig};
