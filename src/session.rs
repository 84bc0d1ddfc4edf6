//! Session context shared by every API call.
//!
//! A [`Session`] is created once at startup (from a token flag, the
//! environment, or a successful login) and handed to the API client. It is
//! torn down on logout or when the backend rejects the token.

use crate::models::{LoginResponse, Role, UserId};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Display fields kept alongside the token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionProfile {
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub role: Option<Role>,
    pub profile_pic: Option<String>,
}

#[derive(Default)]
struct SessionState {
    token: Option<String>,
    profile: SessionProfile,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownReason {
    Logout,
    /// The backend answered 401 or 403.
    Rejected(u16),
}

impl fmt::Display for TeardownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeardownReason::Logout => write!(f, "logout"),
            TeardownReason::Rejected(status) => write!(f, "rejected with HTTP {}", status),
        }
    }
}

/// Cloneable handle to the current session.
#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Session")
            .field("active", &state.token.is_some())
            .field("profile", &state.profile)
            .finish()
    }
}

impl Session {
    /// A session with no token. Every authenticated call fails fast.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Start a session from an existing bearer token.
    pub fn with_token(token: impl Into<String>, user_id: Option<UserId>) -> Self {
        let session = Self::default();
        {
            let mut state = session.lock();
            state.token = Some(token.into());
            state.profile.user_id = user_id;
        }
        session
    }

    /// Start a session from a login response.
    pub fn from_login(login: &LoginResponse) -> Self {
        let session = Self::with_token(login.token.clone(), Some(login.user_id));
        {
            let mut state = session.lock();
            state.profile.username = Some(login.username.clone());
            state.profile.role = login.role;
        }
        info!("Signed in as {}", login.username);
        session
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // A poisoned lock only means a panic elsewhere; the state itself is plain data.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current bearer token, if the session is active.
    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    pub fn is_active(&self) -> bool {
        self.lock().token.is_some()
    }

    pub fn profile(&self) -> SessionProfile {
        self.lock().profile.clone()
    }

    /// Cache display fields fetched after sign-in.
    pub fn update_profile(&self, username: Option<String>, profile_pic: Option<String>) {
        let mut state = self.lock();
        if username.is_some() {
            state.profile.username = username;
        }
        if profile_pic.is_some() {
            state.profile.profile_pic = profile_pic;
        }
    }

    /// Drop the token and every cached display field.
    pub fn clear(&self, reason: TeardownReason) {
        let mut state = self.lock();
        if state.token.is_some() {
            debug!("Clearing session: {}", reason);
        }
        *state = SessionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_session() {
        let session = Session::anonymous();
        assert!(!session.is_active());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_from_login() {
        let session = Session::from_login(&LoginResponse {
            token: "abc".to_string(),
            user_id: 42,
            username: "prof".to_string(),
            role: Some(Role::Faculty),
        });

        assert_eq!(session.token().as_deref(), Some("abc"));
        let profile = session.profile();
        assert_eq!(profile.user_id, Some(42));
        assert_eq!(profile.username.as_deref(), Some("prof"));
        assert_eq!(profile.role, Some(Role::Faculty));
    }

    #[test]
    fn test_clear_is_shared_across_clones() {
        let session = Session::with_token("abc", Some(1));
        let handle = session.clone();
        handle.update_profile(Some("ada".to_string()), Some("/uploads/a.png".to_string()));

        handle.clear(TeardownReason::Rejected(403));

        assert!(!session.is_active());
        assert_eq!(session.profile(), SessionProfile::default());
    }

    #[test]
    fn test_update_profile_keeps_existing_fields() {
        let session = Session::with_token("abc", Some(1));
        session.update_profile(Some("ada".to_string()), None);
        session.update_profile(None, Some("pic.png".to_string()));

        let profile = session.profile();
        assert_eq!(profile.username.as_deref(), Some("ada"));
        assert_eq!(profile.profile_pic.as_deref(), Some("pic.png"));
    }
}
