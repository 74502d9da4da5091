// Session coordination
//
// Holds the cached identity of the signed-in user and serializes token
// refreshes: however many requests hit a 401 at once, a single refresh
// call runs and every waiter is released by its outcome. The session
// credential itself lives in the cookie jar, never in this struct.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::Error;

/// Role attached to an [`Identity`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

/// The signed-in user as reported by the auth endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Identity {
    pub fn has_role(&self, name: &str) -> bool {
        self.role
            .as_ref()
            .and_then(|r| r.name.as_deref())
            .is_some_and(|n| n == name)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.role
            .as_ref()
            .is_some_and(|r| r.permissions.contains(permission))
    }

    /// All of `permissions` granted. An empty list is always satisfied.
    pub fn has_permissions<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        permissions.iter().all(|p| self.has_permission(p.as_ref()))
    }
}

/// Outcome broadcast to every waiter of a refresh cycle.
type RefreshOutcome = Result<(), String>;

#[derive(Default)]
struct RefreshState {
    in_progress: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Result of trying to enter a refresh cycle.
enum RefreshTicket<'a> {
    /// This caller performs the refresh call.
    Leader(RefreshGuard<'a>),
    /// A cycle is already running; wait for its outcome.
    Follower(oneshot::Receiver<RefreshOutcome>),
}

/// Releases the waiters of a cycle exactly once.
///
/// If the leader's future is dropped before it reports an outcome, the
/// guard fails the cycle so no waiter stays suspended.
struct RefreshGuard<'a> {
    session: &'a SessionCoordinator,
    outcome: Option<RefreshOutcome>,
}

impl RefreshGuard<'_> {
    fn finish(mut self, outcome: RefreshOutcome) {
        self.outcome = Some(outcome);
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        let outcome = self
            .outcome
            .take()
            .unwrap_or_else(|| Err("refresh abandoned".into()));
        self.session.drain(&outcome);
    }
}

/// Process-wide owner of the authenticated identity and the refresh cycle.
///
/// Construct one per application and share it via `Arc`; the API client
/// and every consumer read the same instance. Only the client's auth
/// calls and the refresh cycle write the identity.
#[derive(Default)]
pub struct SessionCoordinator {
    identity: ArcSwapOption<Identity>,
    refresh: Mutex<RefreshState>,
    cycles: AtomicU64,
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("identity", &self.identity.load_full())
            .field("refreshing", &self.is_refreshing())
            .field("cycles", &self.refresh_cycles())
            .finish()
    }
}

impl SessionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A coordinator seeded with an identity restored from elsewhere.
    pub fn with_identity(identity: Identity) -> Self {
        let session = Self::default();
        session.store(identity);
        session
    }

    // ── Identity cache ───────────────────────────────────────────────

    /// The cached identity, if signed in.
    pub fn identity(&self) -> Option<Arc<Identity>> {
        self.identity.load_full()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.load().is_some()
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.identity().is_some_and(|i| i.has_role(name))
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.identity().is_some_and(|i| i.has_permission(permission))
    }

    /// All of `permissions` granted. Anonymous sessions satisfy only
    /// the empty list.
    pub fn has_permissions<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        match self.identity() {
            Some(identity) => identity.has_permissions(permissions),
            None => permissions.is_empty(),
        }
    }

    pub(crate) fn store(&self, identity: Identity) {
        debug!(username = ?identity.username, "identity cached");
        self.identity.store(Some(Arc::new(identity)));
    }

    pub(crate) fn clear(&self) {
        if self.identity.swap(None).is_some() {
            debug!("identity cleared");
        }
    }

    // ── Refresh cycle ────────────────────────────────────────────────

    /// Whether a refresh call is currently outstanding.
    pub fn is_refreshing(&self) -> bool {
        self.refresh_state().in_progress
    }

    /// Number of refresh cycles started since construction.
    pub fn refresh_cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Every critical section leaves the state consistent, so a poisoned
    /// lock is still safe to use.
    fn refresh_state(&self) -> MutexGuard<'_, RefreshState> {
        self.refresh.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check-and-set the in-progress flag without suspending.
    fn enter(&self) -> RefreshTicket<'_> {
        let mut state = self.refresh_state();
        if state.in_progress {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            debug!(queued = state.waiters.len(), "refresh in progress; request queued");
            RefreshTicket::Follower(rx)
        } else {
            state.in_progress = true;
            self.cycles.fetch_add(1, Ordering::Relaxed);
            RefreshTicket::Leader(RefreshGuard {
                session: self,
                outcome: None,
            })
        }
    }

    /// Close the current cycle and release every waiter with `outcome`.
    fn drain(&self, outcome: &RefreshOutcome) {
        let waiters = {
            let mut state = self.refresh_state();
            state.in_progress = false;
            std::mem::take(&mut state.waiters)
        };
        debug!(
            released = waiters.len(),
            success = outcome.is_ok(),
            "refresh cycle finished"
        );
        for waiter in waiters {
            // A waiter that gave up has dropped its receiver; nothing to do.
            let _ = waiter.send(outcome.clone());
        }
    }

    /// Join the running refresh cycle, or lead a new one with `refresh`.
    ///
    /// Returns once the cycle's single refresh call has completed. On
    /// success the returned identity is cached before any waiter resumes;
    /// on failure the identity is cleared and every participant receives
    /// [`Error::RefreshFailed`]. `refresh` is only invoked by the leader.
    pub async fn recover<F, Fut>(&self, refresh: F) -> Result<(), Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Identity, Error>>,
    {
        match self.enter() {
            RefreshTicket::Follower(rx) => match rx.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(message)) => Err(Error::RefreshFailed { message }),
                Err(_) => Err(Error::RefreshFailed {
                    message: "refresh abandoned".into(),
                }),
            },
            RefreshTicket::Leader(guard) => {
                debug!("starting session refresh");
                match refresh().await {
                    Ok(identity) => {
                        self.store(identity);
                        guard.finish(Ok(()));
                        Ok(())
                    }
                    Err(err) => {
                        warn!(error = %err, "session refresh failed; signing out");
                        self.clear();
                        let message = err.to_string();
                        guard.finish(Err(message.clone()));
                        Err(Error::RefreshFailed { message })
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use futures::future::join_all;

    use super::*;

    fn analyst() -> Identity {
        Identity {
            id: Some("u1".into()),
            username: Some("analyst".into()),
            name: Some("Analyst".into()),
            email: None,
            role: Some(Role {
                id: Some("r1".into()),
                name: Some("viewer".into()),
                permissions: ["bonds:read".to_owned()].into_iter().collect(),
            }),
        }
    }

    #[test]
    fn permission_checks() {
        let session = SessionCoordinator::with_identity(analyst());
        assert!(session.is_authenticated());
        assert!(session.has_role("viewer"));
        assert!(!session.has_role("admin"));
        assert!(session.has_permission("bonds:read"));
        assert!(session.has_permissions(&["bonds:read"]));
        assert!(!session.has_permissions(&["bonds:module", "bonds:create"]));
        assert!(session.has_permissions::<&str>(&[]));
    }

    #[test]
    fn anonymous_has_no_permissions() {
        let session = SessionCoordinator::new();
        assert!(!session.is_authenticated());
        assert!(!session.has_permission("bonds:read"));
        assert!(!session.has_permissions(&["bonds:read"]));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_recoveries_share_one_refresh() {
        let session = SessionCoordinator::new();
        let calls = AtomicUsize::new(0);

        let results = join_all((0..5).map(|_| {
            session.recover(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(analyst())
            })
        }))
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(Result::is_ok));
        assert_eq!(session.refresh_cycles(), 1);
        assert!(!session.is_refreshing());
        assert!(session.has_permission("bonds:read"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_rejects_everyone_and_clears_identity() {
        let session = SessionCoordinator::with_identity(analyst());
        let calls = AtomicUsize::new(0);

        let results = join_all((0..4).map(|_| {
            session.recover(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err::<Identity, _>(Error::Unauthorized)
            })
        }))
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(
            results
                .iter()
                .all(|r| matches!(r, Err(Error::RefreshFailed { .. })))
        );
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn refresh_survives_a_poisoned_lock() {
        let session = SessionCoordinator::new();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _state = session.refresh.lock().expect("refresh lock");
            panic!("holder panicked");
        }));
        assert!(session.refresh.is_poisoned());

        assert!(!session.is_refreshing());
        session.recover(|| async { Ok(analyst()) }).await.expect("recover");
        assert!(session.is_authenticated());
        assert!(!session.is_refreshing());
    }

    #[tokio::test]
    async fn cycles_restart_after_completion() {
        let session = SessionCoordinator::new();
        session.recover(|| async { Ok(analyst()) }).await.expect("first");
        session.recover(|| async { Ok(analyst()) }).await.expect("second");
        assert_eq!(session.refresh_cycles(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_leader_releases_waiters() {
        let session = Arc::new(SessionCoordinator::new());

        let leader = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                session
                    .recover(|| async {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        Ok(Identity::default())
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        assert!(session.is_refreshing());

        let follower = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.recover(|| async { Ok(Identity::default()) }).await })
        };
        tokio::task::yield_now().await;

        leader.abort();
        let outcome = follower.await.expect("follower task");
        assert!(matches!(outcome, Err(Error::RefreshFailed { .. })));
        assert!(!session.is_refreshing());
    }
}
