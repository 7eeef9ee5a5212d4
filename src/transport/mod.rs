pub mod rest;

use crate::core::error::FetchError;
use crate::core::models::ResourceKey;
use async_trait::async_trait;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub use rest::RestFetcher;

/// The data-fetch collaborator: given the current resource key, perform
/// one request and settle with the decoded value or a classified error.
#[async_trait]
pub trait Fetcher: Send + Sync {
    type Output: Clone + Send + Sync + 'static;

    async fn issue(&self, key: &ResourceKey) -> Result<Self::Output, FetchError>;
}

/// Cancellation registry for outstanding fetches. Every fetch issued
/// through [`CancelRegistry::issue`] races the current token; once
/// `cancel_all` returns, no previously issued fetch can resolve on its
/// success path, it settles as [`FetchError::Canceled`] instead. The
/// token is rotated on each `cancel_all` so later fetches start clean.
#[derive(Clone, Default)]
pub struct CancelRegistry {
    current: Arc<Mutex<CancellationToken>>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel_all(&self) {
        let mut current = self.lock_current();
        current.cancel();
        *current = CancellationToken::new();
    }

    pub async fn issue<T, F>(&self, fetch: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        let token = self.lock_current().clone();
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(FetchError::Canceled),
            outcome = fetch => outcome,
        }
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        // The critical section never panics, so a poisoned lock still
        // holds a usable token.
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issue_passes_through_settled_outcome() {
        let registry = CancelRegistry::new();

        let ok = registry.issue(async { Ok::<_, FetchError>(7) }).await;
        assert_eq!(ok, Ok(7));

        let err = registry
            .issue(async { Err::<i32, _>(FetchError::failed("boom")) })
            .await;
        assert_eq!(err, Err(FetchError::failed("boom")));
    }

    #[tokio::test]
    async fn test_cancel_all_settles_pending_fetch_as_canceled() {
        let registry = CancelRegistry::new();

        let pending = registry.clone();
        let task = tokio::spawn(async move {
            pending
                .issue(std::future::pending::<Result<i32, FetchError>>())
                .await
        });

        tokio::task::yield_now().await;
        registry.cancel_all();

        let outcome = task.await.unwrap();
        assert_eq!(outcome, Err(FetchError::Canceled));
    }

    #[tokio::test]
    async fn test_cancel_all_suppresses_success_that_becomes_ready_later() {
        let registry = CancelRegistry::new();
        let (gate_tx, gate_rx) = tokio::sync::oneshot::channel::<()>();

        let issued = registry.clone();
        let task = tokio::spawn(async move {
            issued
                .issue(async move {
                    let _ = gate_rx.await;
                    Ok::<_, FetchError>(1)
                })
                .await
        });

        // Let the fetch capture its token and park on the gate, then cancel
        // before releasing the result. The canceled branch must win.
        tokio::task::yield_now().await;
        registry.cancel_all();
        let _ = gate_tx.send(());

        let outcome = task.await.unwrap();
        assert_eq!(outcome, Err(FetchError::Canceled));
    }

    #[tokio::test]
    async fn test_token_rotates_after_cancel_all() {
        let registry = CancelRegistry::new();
        registry.cancel_all();

        let outcome = registry.issue(async { Ok::<_, FetchError>(42) }).await;
        assert_eq!(outcome, Ok(42));
    }
}
