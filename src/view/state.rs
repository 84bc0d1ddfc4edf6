//! Page load lifecycle.
//!
//! Every dashboard page moves `Loading → Ready` or `Loading → Error` exactly
//! once. There is no way back to `Loading` and no automatic retry.

use crate::api::ApiError;
use crate::view::scope::{Canceller, ViewScope};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, warn};

/// Error shown in a page's banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageError {
    pub message: String,
    /// The backend rejected the session; the user must sign in again.
    pub session_expired: bool,
}

impl PageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_expired: false,
        }
    }
}

impl From<&ApiError> for PageError {
    fn from(err: &ApiError) -> Self {
        Self {
            session_expired: err.is_auth(),
            ..Self::new(err.to_string())
        }
    }
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Attempted to leave a settled state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("page is already {0}; a settled page cannot change state")]
pub struct TransitionError(&'static str);

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Ready(T),
    Error(PageError),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        LoadState::Loading
    }
}

impl<T> LoadState<T> {
    pub fn label(&self) -> &'static str {
        match self {
            LoadState::Loading => "loading",
            LoadState::Ready(_) => "ready",
            LoadState::Error(_) => "error",
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&PageError> {
        match self {
            LoadState::Error(err) => Some(err),
            _ => None,
        }
    }

    /// `Loading → Ready`.
    pub fn resolve(&mut self, value: T) -> Result<(), TransitionError> {
        self.ensure_loading()?;
        *self = LoadState::Ready(value);
        Ok(())
    }

    /// `Loading → Error`.
    pub fn fail(&mut self, error: PageError) -> Result<(), TransitionError> {
        self.ensure_loading()?;
        *self = LoadState::Error(error);
        Ok(())
    }

    fn ensure_loading(&self) -> Result<(), TransitionError> {
        if self.is_loading() {
            Ok(())
        } else {
            Err(TransitionError(self.label()))
        }
    }
}

/// A dashboard page: its load state plus the scope its fetches run in.
pub struct Page<T> {
    name: &'static str,
    state: LoadState<T>,
    scope: ViewScope,
}

impl<T> Page<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: LoadState::Loading,
            scope: ViewScope::new(name),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> &LoadState<T> {
        &self.state
    }

    pub fn into_state(self) -> LoadState<T> {
        let Page { state, .. } = self;
        state
    }

    /// Handle that cancels this page's in-flight fetches.
    pub fn canceller(&self) -> Canceller {
        self.scope.canceller()
    }

    /// Run the page's loader and settle the state with its outcome.
    ///
    /// A cancelled load leaves the state untouched.
    pub async fn load<F>(&mut self, loader: F) -> &LoadState<T>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let outcome = self.scope.run(loader).await;

        let transition = match outcome {
            Ok(value) => self.state.resolve(value),
            Err(ApiError::Cancelled) => {
                debug!("{} load cancelled; state left as {}", self.name, self.state.label());
                Ok(())
            }
            Err(err) => {
                warn!("{} failed to load: {}", self.name, err);
                self.state.fail(PageError::from(&err))
            }
        };

        if let Err(err) = transition {
            warn!("{}: {}", self.name, err);
        }

        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_to_ready() {
        let mut state: LoadState<u32> = LoadState::default();
        assert!(state.is_loading());
        state.resolve(3).unwrap();
        assert_eq!(state.ready(), Some(&3));
        assert_eq!(state.label(), "ready");
    }

    #[test]
    fn test_error_is_terminal() {
        let mut state: LoadState<u32> = LoadState::Loading;
        state.fail(PageError::new("boom")).unwrap();

        assert_eq!(state.resolve(1), Err(TransitionError("error")));
        assert!(state.fail(PageError::new("again")).is_err());
        assert_eq!(state.error().map(|e| e.message.as_str()), Some("boom"));
    }

    #[test]
    fn test_ready_cannot_fail() {
        let mut state: LoadState<u32> = LoadState::Loading;
        state.resolve(1).unwrap();
        assert!(state.fail(PageError::new("late")).is_err());
        assert_eq!(state.ready(), Some(&1));
    }

    #[test]
    fn test_page_error_from_api() {
        let err = PageError::from(&ApiError::Unauthorized { status: 403 });
        assert!(err.session_expired);

        let err = PageError::from(&ApiError::Timeout(5));
        assert!(!err.session_expired);
    }

    #[tokio::test]
    async fn test_page_load_ready() {
        let mut page: Page<Vec<u32>> = Page::new("students");
        let state = page.load(async { Ok(vec![1, 2]) }).await;
        assert_eq!(state.ready(), Some(&vec![1, 2]));
    }

    #[tokio::test]
    async fn test_page_load_error() {
        let mut page: Page<u32> = Page::new("faculty");
        page.load(async { Err(ApiError::Status { status: 500, body: String::new() }) })
            .await;

        let err = page.state().error().cloned().unwrap();
        assert!(err.message.contains("500"));
        assert!(!err.session_expired);
    }

    #[tokio::test]
    async fn test_cancelled_page_stays_loading() {
        let mut page: Page<u32> = Page::new("admin-home");
        page.canceller().cancel();

        let state = page.load(async { Ok(7) }).await;

        assert!(state.is_loading());
    }

    #[tokio::test]
    async fn test_second_load_does_not_overwrite() {
        let mut page: Page<u32> = Page::new("pending");
        page.load(async { Ok(1) }).await;
        page.load(async { Ok(2) }).await;

        assert_eq!(page.into_state(), LoadState::Ready(1));
    }
}
