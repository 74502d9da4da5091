// ── Backoffice abstraction ──
//
// Connection lifecycle for one back office: sign-in, sign-out, and the
// record, audit and counter operations routed through a shared
// `ApiClient`, with every error mapped into `CoreError`.

use std::sync::Arc;

use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use vaultdesk_api::models::{AuditLog, Counter, FieldHistory, FieldSummary};
use vaultdesk_api::{
    ApiClient, DeleteResult, Identity, InsertResult, ListQuery, Page, Resource, UpdateResult,
};

use crate::config::{AuthCredentials, BackofficeConfig};
use crate::error::CoreError;
use crate::guard::{self, Navigation, RouteMeta};
use crate::selectable::Selectable;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Backoffice ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable; clones share one client, one cookie jar and one
/// session coordinator.
#[derive(Clone)]
pub struct Backoffice {
    inner: Arc<BackofficeInner>,
}

struct BackofficeInner {
    config: BackofficeConfig,
    client: Arc<ApiClient>,
    connection_state: watch::Sender<ConnectionState>,
}

impl std::fmt::Debug for Backoffice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backoffice")
            .field("url", &self.inner.config.url.as_str())
            .field("state", &*self.inner.connection_state.borrow())
            .finish_non_exhaustive()
    }
}

impl Backoffice {
    /// Build the client for `config`. Does NOT sign in; call
    /// [`connect()`](Self::connect) for that.
    pub fn new(config: BackofficeConfig) -> Result<Self, CoreError> {
        let client = ApiClient::new(config.url.clone(), &config.transport())?;
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        Ok(Self {
            inner: Arc::new(BackofficeInner {
                config,
                client: Arc::new(client),
                connection_state,
            }),
        })
    }

    pub fn config(&self) -> &BackofficeConfig {
        &self.inner.config
    }

    /// The shared API client, for operations without a wrapper here.
    pub fn client(&self) -> &Arc<ApiClient> {
        &self.inner.client
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Sign in with the configured credentials.
    ///
    /// Anonymous configs try to pick up an existing session cookie and
    /// connect either way.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner.connection_state.send_replace(ConnectionState::Connecting);

        let result = match &self.inner.config.auth {
            AuthCredentials::Credentials {
                username,
                password,
                remember_me,
            } => self
                .inner
                .client
                .signin(username, password, *remember_me)
                .await
                .map(|identity| debug!(user = ?identity.username, "signed in")),
            AuthCredentials::Anonymous => {
                if let Err(e) = self.inner.client.reauthenticate().await {
                    debug!(error = %e, "no existing session");
                }
                Ok(())
            }
        };

        match result {
            Ok(()) => {
                self.inner.connection_state.send_replace(ConnectionState::Connected);
                info!(url = %self.inner.config.url, "connected to back office");
                Ok(())
            }
            Err(e) => {
                self.inner.connection_state.send_replace(ConnectionState::Failed);
                Err(e.into())
            }
        }
    }

    /// Sign out if signed in. Sign-out failures are logged, never returned.
    pub async fn disconnect(&self) {
        if self.inner.client.session().is_authenticated() {
            if let Err(e) = self.inner.client.signout().await {
                warn!(error = %e, "signout failed (non-fatal)");
            }
        }
        self.inner.connection_state.send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// One-shot: connect, run closure, disconnect.
    pub async fn oneshot<F, Fut, T>(config: BackofficeConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Backoffice) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let backoffice = Backoffice::new(config)?;
        backoffice.connect().await?;
        let result = f(backoffice.clone()).await;
        backoffice.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    pub fn identity(&self) -> Option<Arc<Identity>> {
        self.inner.client.session().identity()
    }

    /// Current identity from the server (`GET /v1/auth/me`).
    pub async fn me(&self) -> Result<Identity, CoreError> {
        Ok(self.inner.client.reauthenticate().await?)
    }

    /// Rotate the session credential explicitly.
    pub async fn refresh(&self) -> Result<Identity, CoreError> {
        Ok(self.inner.client.refresh().await?)
    }

    /// Email a password-reset code. Needs no session.
    pub async fn request_password(&self, email: &str) -> Result<UpdateResult, CoreError> {
        Ok(self.inner.client.request_password(email).await?)
    }

    /// Set a new password with an emailed reset code. Needs no session.
    pub async fn reset_password(
        &self,
        code: &str,
        password: &SecretString,
    ) -> Result<UpdateResult, CoreError> {
        Ok(self.inner.client.reset_password(code, password).await?)
    }

    /// Resolve a navigation against the current session.
    pub async fn guard(&self, full_path: &str, meta: &RouteMeta) -> Navigation {
        guard::guard(&self.inner.client, full_path, meta).await
    }

    /// A select-box option source over `resource`.
    pub fn selectable(&self, resource: Resource) -> Selectable {
        Selectable::new(Arc::clone(&self.inner.client), resource)
    }

    // ── Records ──────────────────────────────────────────────────

    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: Resource,
        query: &ListQuery,
    ) -> Result<Page<T>, CoreError> {
        Ok(self.inner.client.list(resource, query).await?)
    }

    pub async fn list_nested<T: DeserializeOwned>(
        &self,
        resource: Resource,
        collection: &str,
        query: &ListQuery,
    ) -> Result<Page<T>, CoreError> {
        Ok(self.inner.client.list_nested(resource, collection, query).await?)
    }

    pub async fn find<T: DeserializeOwned>(&self, resource: Resource, id: &str) -> Result<T, CoreError> {
        Ok(self.inner.client.find(resource, id).await?)
    }

    pub async fn create(
        &self,
        resource: Resource,
        body: &(impl Serialize + ?Sized),
    ) -> Result<InsertResult, CoreError> {
        Ok(self.inner.client.create(resource, body).await?)
    }

    pub async fn draft(
        &self,
        resource: Resource,
        body: &(impl Serialize + ?Sized),
    ) -> Result<InsertResult, CoreError> {
        Ok(self.inner.client.draft(resource, body).await?)
    }

    pub async fn update(
        &self,
        resource: Resource,
        id: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<UpdateResult, CoreError> {
        Ok(self.inner.client.update(resource, id, body).await?)
    }

    pub async fn update_draft(
        &self,
        resource: Resource,
        id: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<UpdateResult, CoreError> {
        Ok(self.inner.client.update_draft(resource, id, body).await?)
    }

    pub async fn archive(
        &self,
        resource: Resource,
        id: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<UpdateResult, CoreError> {
        Ok(self.inner.client.archive(resource, id, body).await?)
    }

    pub async fn restore(
        &self,
        resource: Resource,
        id: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<UpdateResult, CoreError> {
        Ok(self.inner.client.restore(resource, id, body).await?)
    }

    pub async fn delete(
        &self,
        resource: Resource,
        id: &str,
        reason: Option<&str>,
    ) -> Result<DeleteResult, CoreError> {
        Ok(self.inner.client.delete_record(resource, id, reason).await?)
    }

    /// Named instrument action, e.g. `withdraw` or `redeem`.
    pub async fn action<T: DeserializeOwned>(
        &self,
        resource: Resource,
        id: &str,
        action: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<T, CoreError> {
        Ok(self.inner.client.action(resource, id, action, body).await?)
    }

    // ── Audit & counters ─────────────────────────────────────────

    pub async fn audit_logs(
        &self,
        query: &ListQuery,
        group_by_operation_id: bool,
    ) -> Result<Page<AuditLog>, CoreError> {
        Ok(self.inner.client.audit_logs(query, group_by_operation_id).await?)
    }

    pub async fn field_histories(
        &self,
        entity_id: &str,
        query: &ListQuery,
    ) -> Result<Page<FieldHistory>, CoreError> {
        Ok(self.inner.client.field_histories(entity_id, query).await?)
    }

    pub async fn fields_summary(
        &self,
        entity_id: &str,
        query: &ListQuery,
    ) -> Result<Page<FieldSummary>, CoreError> {
        Ok(self.inner.client.fields_summary(entity_id, query).await?)
    }

    pub async fn counter(&self, name: &str) -> Result<Counter, CoreError> {
        Ok(self.inner.client.counter(name).await?)
    }
}
