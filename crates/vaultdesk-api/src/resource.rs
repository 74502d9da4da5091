// Resource endpoints
//
// Every master-data and instrument collection exposes the same REST
// shape under its base path, so one set of generic methods covers them
// all. Instrument sub-actions (extend, withdrawal, coupons, ...) go
// through `action`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::client::ApiClient;
use crate::error::Error;
use crate::query::{ListDefaults, ListQuery};

/// A REST collection of the back office.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Resource {
    Banks,
    Brokers,
    Issuers,
    Owners,
    Users,
    Roles,
    Permissions,
    Examples,
    Deposits,
    Savings,
    Insurances,
    Bonds,
    DividendStocks,
    PaymentStocks,
    Stocks,
}

impl Resource {
    /// Base path of the collection.
    pub fn path(self) -> &'static str {
        match self {
            Self::Banks => "/v1/master/banks",
            Self::Brokers => "/v1/master/brokers",
            Self::Issuers => "/v1/master/issuers",
            Self::Owners => "/v1/master/owners",
            Self::Users => "/v1/master/users",
            Self::Roles => "/v1/master/roles",
            Self::Permissions => "/v1/master/permissions",
            Self::Examples => "/v1/master/examples",
            Self::Deposits => "/v1/deposits",
            Self::Savings => "/v1/savings",
            Self::Insurances => "/v1/insurances",
            Self::Bonds => "/v1/bonds",
            Self::DividendStocks => "/v1/dividend-stocks",
            Self::PaymentStocks => "/v1/payment-stocks",
            Self::Stocks => "/v1/stocks",
        }
    }

    /// Whether the collection lives under master data.
    pub fn is_master(self) -> bool {
        self.path().starts_with("/v1/master/")
    }

    /// Defaults applied to unset list parameters.
    pub fn list_defaults(self) -> ListDefaults {
        match self {
            Self::Permissions => ListDefaults::EXHAUSTIVE,
            _ => ListDefaults::STANDARD,
        }
    }

    /// Permission name for an access kind, e.g. `banks:read`.
    pub fn permission(self, access: &str) -> String {
        format!("{self}:{access}")
    }
}

// ── Response shapes ─────────────────────────────────────────────────

/// Pagination block of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub total_document: u64,
}

fn first_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: first_page(),
            page_count: 0,
            page_size: default_page_size(),
            total_document: 0,
        }
    }
}

/// A page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Response of a create or draft call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertResult {
    pub inserted_id: String,
}

/// Response of an update-style call (update, archive, restore, actions).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    #[serde(default)]
    pub matched_count: u64,
    #[serde(default)]
    pub modified_count: u64,
}

/// Response of a (soft) delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    #[serde(default)]
    pub deleted_count: u64,
}

// ── Endpoints ───────────────────────────────────────────────────────

impl ApiClient {
    /// `GET {path}` with search/pagination/sort parameters.
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: Resource,
        query: &ListQuery,
    ) -> Result<Page<T>, Error> {
        let params = query.to_pairs(resource.list_defaults());
        self.get(self.api_url(resource.path())?, &params).await
    }

    /// `GET {path}/{collection}` for derived lists such as
    /// `banks/accounts`, `bonds/issuers` or `savings/cashbacks`.
    pub async fn list_nested<T: DeserializeOwned>(
        &self,
        resource: Resource,
        collection: &str,
        query: &ListQuery,
    ) -> Result<Page<T>, Error> {
        let params = query.to_pairs(resource.list_defaults());
        self.get(self.entity_url(resource.path(), &[collection])?, &params)
            .await
    }

    /// `GET {path}/{id}`.
    pub async fn find<T: DeserializeOwned>(&self, resource: Resource, id: &str) -> Result<T, Error> {
        self.get(self.entity_url(resource.path(), &[id])?, &[]).await
    }

    /// `POST {path}`.
    pub async fn create(
        &self,
        resource: Resource,
        body: &(impl Serialize + ?Sized),
    ) -> Result<InsertResult, Error> {
        self.post(self.api_url(resource.path())?, body).await
    }

    /// `POST {path}/draft`: save an incomplete record.
    pub async fn draft(
        &self,
        resource: Resource,
        body: &(impl Serialize + ?Sized),
    ) -> Result<InsertResult, Error> {
        self.post(self.entity_url(resource.path(), &["draft"])?, body)
            .await
    }

    /// `PATCH {path}/{id}`.
    pub async fn update(
        &self,
        resource: Resource,
        id: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<UpdateResult, Error> {
        self.patch(self.entity_url(resource.path(), &[id])?, body)
            .await
    }

    /// `PATCH {path}/{id}/draft`.
    pub async fn update_draft(
        &self,
        resource: Resource,
        id: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<UpdateResult, Error> {
        self.patch(self.entity_url(resource.path(), &[id, "draft"])?, body)
            .await
    }

    /// `POST {path}/{id}/archive`: soft-delete, reversible by `restore`.
    pub async fn archive(
        &self,
        resource: Resource,
        id: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<UpdateResult, Error> {
        self.action(resource, id, "archive", body).await
    }

    /// `POST {path}/{id}/restore`.
    pub async fn restore(
        &self,
        resource: Resource,
        id: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<UpdateResult, Error> {
        self.action(resource, id, "restore", body).await
    }

    /// `DELETE {path}/{id}` with an optional reason in the body.
    pub async fn delete_record(
        &self,
        resource: Resource,
        id: &str,
        reason: Option<&str>,
    ) -> Result<DeleteResult, Error> {
        self.delete(
            self.entity_url(resource.path(), &[id])?,
            &json!({ "delete_reason": reason }),
        )
        .await
    }

    /// `POST {path}/{id}/{action}` for record sub-actions such as
    /// `extend`, `withdrawal`, `receive-interest` or `create-coupon`.
    pub async fn action<T: DeserializeOwned>(
        &self,
        resource: Resource,
        id: &str,
        action: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<T, Error> {
        self.post(self.entity_url(resource.path(), &[id, action])?, body)
            .await
    }
}
