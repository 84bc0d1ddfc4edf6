//! Cancellation scope tied to a page's lifetime.
//!
//! Every fetch a page issues runs inside its [`ViewScope`]. Once the scope
//! is cancelled (explicitly, on Ctrl-C, or by dropping it) pending fetches
//! resolve to [`ApiError::Cancelled`] and never reach their continuation.

use crate::api::ApiError;
use futures::future::{AbortHandle, Abortable};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Default)]
struct ScopeInner {
    cancelled: AtomicBool,
    handles: Mutex<Vec<AbortHandle>>,
}

impl ScopeInner {
    fn cancel(&self, name: &str) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let handles = std::mem::take(
            &mut *self
                .handles
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        debug!("Cancelling {} pending fetch(es) in {}", handles.len(), name);
        for handle in handles {
            handle.abort();
        }
    }
}

/// Owns the abort handles of one page's fetches.
pub struct ViewScope {
    name: String,
    inner: Arc<ScopeInner>,
}

/// Cloneable handle that can only cancel a scope.
#[derive(Clone)]
pub struct Canceller {
    name: String,
    inner: Arc<ScopeInner>,
}

impl Canceller {
    pub fn cancel(&self) {
        self.inner.cancel(&self.name);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }
}

impl ViewScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(ScopeInner::default()),
        }
    }

    pub fn canceller(&self) -> Canceller {
        Canceller {
            name: self.name.clone(),
            inner: self.inner.clone(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.inner.cancel(&self.name);
    }

    /// Run `fut` so that cancelling the scope aborts it.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let (handle, registration) = AbortHandle::new_pair();
        {
            let mut handles = self
                .inner
                .handles
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            handles.retain(|h| !h.is_aborted());
            handles.push(handle.clone());
        }

        // Checked after registering so a concurrent cancel cannot slip between.
        if self.is_cancelled() {
            handle.abort();
        }

        match Abortable::new(fut, registration).await {
            Ok(result) => result,
            Err(_aborted) => Err(ApiError::Cancelled),
        }
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.cancel();
    }
}
