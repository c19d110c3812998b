//! Unified error handling with Sentry integration.
//!
//! Every storefront operation returns `Result<T, ClientError>`. None of the
//! variants is fatal: callers show [`ClientError::notice`] as a transient
//! message and stay interactive. Nothing is retried automatically.

use thiserror::Error;

use shopwire_core::EmailError;

/// Error returned by every storefront operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Network failure or a response that could not be decoded.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server rejected the session (HTTP 401). The session has already been torn down.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other failure reported by a remote service.
    #[error("{0}")]
    Application(String),

    /// Rejected locally before any request was sent.
    #[error("{0}")]
    Validation(String),
}

impl ClientError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Text to show the user as a transient notice.
    #[must_use]
    pub fn notice(&self) -> &str {
        match self {
            Self::Transport(_) => "Network error",
            Self::Unauthorized(_) => "Session expired",
            Self::Application(message) | Self::Validation(message) => message,
        }
    }

    /// Whether the request never left the client.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<EmailError> for ClientError {
    fn from(err: EmailError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Set the Sentry user context.
///
/// Call this after a successful login or restore to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout or session expiry.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "65f0c1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
