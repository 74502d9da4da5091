// Cancellable search
//
// A `SearchSlot` belongs to one search box, table or option list. Each
// new call through the slot cancels the one before it, so a slow stale
// response can never overwrite a newer one.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::Error;

/// Latest-wins cancellation scope for a single consumer.
///
/// Slots are never shared between consumers: two tables each own one,
/// and searching in one leaves the other's request alone.
#[derive(Debug, Default)]
pub struct SearchSlot {
    current: Mutex<Option<CancellationToken>>,
    issued: AtomicU64,
}

impl SearchSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls started through this slot.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    /// Cancel the in-flight call, if any, without starting a new one.
    pub fn cancel(&self) {
        if let Some(token) = self.current().take() {
            token.cancel();
        }
    }

    fn current(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install a fresh token, cancelling the previous holder.
    fn supersede(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = self.current().replace(token.clone());
        if let Some(previous) = previous {
            trace!("superseding in-flight search");
            previous.cancel();
        }
        self.issued.fetch_add(1, Ordering::Relaxed);
        token
    }

    /// Run `request` as the slot's current call.
    ///
    /// If another call starts on this slot before `request` resolves,
    /// `request` is dropped unfinished and this returns
    /// [`Error::Cancelled`].
    pub async fn run<T, F>(&self, request: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        let token = self.supersede();
        tokio::select! {
            biased;
            () = token.cancelled() => Err(Error::Cancelled),
            result = request => result,
        }
    }
}
