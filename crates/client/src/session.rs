//! Session store: the authenticated identity and its bearer token.
//!
//! The session is the only writer of the `Authorization` header. The gateway
//! reads the token through [`TokenSource`] and reports server-side expiry
//! through [`GatewayObserver`], both implemented here.

use std::sync::Arc;

use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use shopwire_core::{Email, Role};

use crate::error::{ClientError, Result, clear_sentry_user, set_sentry_user};
use crate::remote::types::{Address, User};
use crate::remote::{Gateway, GatewayObserver, Service, TokenSource};
use crate::snapshot::{AUTH_TOKEN_KEY, CURRENT_USER_KEY, SnapshotStore};

/// Message returned when an operation needs a signed-in user.
pub const LOGIN_REQUIRED: &str = "Please login first";

/// An authenticated user together with their bearer token.
///
/// A `Session` always holds both; "no session" is `None` at the store level.
#[derive(Debug, Clone)]
pub struct Session {
    /// Bearer token (redacted in `Debug`).
    pub token: SecretString,
    /// The signed-in user.
    pub user: User,
}

impl Session {
    /// Whether the user has the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Holds the current session and keeps the durable snapshot in step with it.
pub struct SessionStore {
    current: RwLock<Option<Arc<Session>>>,
    snapshot: Arc<dyn SnapshotStore>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("current", &*self.current.read())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create an empty store backed by `snapshot`. Call [`SessionStore::restore`] to resume.
    #[must_use]
    pub fn new(snapshot: Arc<dyn SnapshotStore>) -> Self {
        Self {
            current: RwLock::new(None),
            snapshot,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The active session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Session>> {
        self.current.read().clone()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.current.read().as_ref().map(|s| s.user.clone())
    }

    /// Whether a session is active.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    /// Whether the signed-in user is an admin. `false` when signed out.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.current.read().as_ref().is_some_and(|s| s.is_admin())
    }

    /// The user's default address, falling back to their first one.
    #[must_use]
    pub fn default_address(&self) -> Option<Address> {
        self.current
            .read()
            .as_ref()
            .and_then(|s| s.user.default_address().cloned())
    }

    /// The active session, or `Validation("Please login first")`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` when no session is active.
    pub fn require(&self) -> Result<Arc<Session>> {
        self.current()
            .ok_or_else(|| ClientError::validation(LOGIN_REQUIRED))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Resume the session recorded in the durable snapshot.
    ///
    /// Returns `None`, leaving the store signed out, if either entry is
    /// missing or the stored user cannot be decoded.
    pub fn restore(&self) -> Option<Arc<Session>> {
        let read = |key: &str| match self.snapshot.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read session snapshot");
                None
            }
        };

        let token = read(AUTH_TOKEN_KEY).filter(|t| !t.is_empty())?;
        let user_json = read(CURRENT_USER_KEY)?;
        let user: User = match serde_json::from_str(&user_json) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Stored user is malformed, staying signed out");
                return None;
            }
        };

        let session = Arc::new(Session {
            token: SecretString::from(token),
            user,
        });
        *self.current.write() = Some(Arc::clone(&session));
        set_sentry_user(&session.user.id, Some(&session.user.email));
        debug!(user_id = %session.user.id, "Session restored");

        Some(session)
    }

    /// Sign in with email and password.
    ///
    /// On success the session is established and persisted. On failure the
    /// store is left as it was and nothing is written to the snapshot.
    ///
    /// # Errors
    ///
    /// - `Validation` if the email is malformed or the password is empty
    /// - `Application` with the server's message if the credentials are rejected
    /// - `Transport` on network failure or a response without token or user
    #[instrument(skip(self, gateway, password))]
    pub async fn login(&self, gateway: &Gateway, email: &str, password: &str) -> Result<Arc<Session>> {
        let email = Email::parse(email)?;
        if password.is_empty() {
            return Err(ClientError::validation("Password is required"));
        }

        let url = gateway.url(Service::Auth, &["login"]);
        let credentials = Credentials {
            email: email.as_str(),
            password,
        };
        let envelope = gateway
            .post::<User, _>(url, &credentials)
            .await
            .map_err(|e| match e {
                // Wrong credentials come back as 401; that is a message for the
                // user, not an expired session.
                ClientError::Unauthorized(message) => ClientError::Application(message),
                other => other,
            })?;

        let token = envelope
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::Transport("missing token in login response".to_string()))?;
        let user = envelope.into_data()?;

        let session = Arc::new(Session {
            token: SecretString::from(token),
            user,
        });
        self.persist(&session);
        *self.current.write() = Some(Arc::clone(&session));

        set_sentry_user(&session.user.id, Some(&session.user.email));
        info!(user_id = %session.user.id, role = %session.user.role, "Logged in");

        Ok(session)
    }

    /// Sign out: drop the in-memory session and the durable snapshot.
    ///
    /// Idempotent; snapshot failures are logged and ignored.
    pub fn logout(&self) {
        let previous = self.current.write().take();

        for key in [AUTH_TOKEN_KEY, CURRENT_USER_KEY] {
            if let Err(e) = self.snapshot.remove(key) {
                error!(key, error = %e, "Failed to clear session snapshot");
            }
        }
        clear_sentry_user();

        if let Some(session) = previous {
            info!(user_id = %session.user.id, "Logged out");
        }
    }

    /// Apply `change` to the signed-in user and persist the result.
    ///
    /// Does nothing when signed out.
    pub(crate) fn update_user(&self, change: impl FnOnce(&mut User)) -> Option<User> {
        let updated = {
            let mut current = self.current.write();
            let session = current.as_mut()?;
            let mut next = (**session).clone();
            change(&mut next.user);
            let next = Arc::new(next);
            *session = Arc::clone(&next);
            next
        };
        self.persist(&updated);
        Some(updated.user.clone())
    }

    fn persist(&self, session: &Session) {
        let user_json = match serde_json::to_string(&session.user) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Failed to encode user for session snapshot");
                return;
            }
        };

        let written = self.snapshot.set_many(&[
            (AUTH_TOKEN_KEY, session.token.expose_secret()),
            (CURRENT_USER_KEY, &user_json),
        ]);
        if let Err(e) = written {
            error!(error = %e, "Failed to write session snapshot");
            // A token must never be restored next to another user's identity.
            for key in [AUTH_TOKEN_KEY, CURRENT_USER_KEY] {
                if let Err(e) = self.snapshot.remove(key) {
                    error!(key, error = %e, "Failed to clear session snapshot");
                }
            }
        }
    }
}

impl TokenSource for SessionStore {
    fn bearer_token(&self) -> Option<SecretString> {
        self.current.read().as_ref().map(|s| s.token.clone())
    }
}

impl GatewayObserver for SessionStore {
    fn on_unauthorized(&self) {
        if self.is_authenticated() {
            warn!("Session expired, signing out");
        }
        self.logout();
    }
}
