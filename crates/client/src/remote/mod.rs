//! Remote gateway for the storefront REST services.
//!
//! # Architecture
//!
//! - One `reqwest` client shared by every call (connection pooling, timeout)
//! - JSON in, JSON out; every response is the shared [`Envelope`]
//! - The bearer token is read through a [`TokenSource`] on each call; the
//!   gateway never stores credentials itself
//! - A failed call with HTTP 401 notifies every subscribed
//!   [`GatewayObserver`] before the error is returned, so session teardown
//!   has happened by the time the caller sees [`ClientError::Unauthorized`]
//!
//! # Example
//!
//! ```rust,ignore
//! let gateway = Gateway::new(&config, session.clone())?;
//! gateway.subscribe(session.clone());
//!
//! let url = gateway.url(Service::Cart, &["count"]);
//! let envelope = gateway.get::<serde_json::Value>(url).await?;
//! ```

pub mod types;

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{ClientConfig, ServiceEndpoints};
use crate::error::{ClientError, Result};

pub use types::Envelope;

/// Message used when a failing response carries none.
const DEFAULT_FAILURE_MESSAGE: &str = "Request failed";

/// The remote service a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Auth,
    Products,
    Cart,
    Wishlist,
    Orders,
}

/// Supplies the bearer token for outgoing requests.
///
/// Implemented by the session store; the gateway only ever reads it.
pub trait TokenSource: Send + Sync {
    /// Current bearer token, if a session is active.
    fn bearer_token(&self) -> Option<SecretString>;
}

/// Receives gateway-level events.
pub trait GatewayObserver: Send + Sync {
    /// Called synchronously when a service rejects the session with HTTP 401.
    fn on_unauthorized(&self);
}

/// Uniform request wrapper for the storefront services.
///
/// Cheap to clone; clones share the HTTP client and observer list.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    client: reqwest::Client,
    endpoints: ServiceEndpoints,
    tokens: Arc<dyn TokenSource>,
    observers: RwLock<Vec<Arc<dyn GatewayObserver>>>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("endpoints", &self.inner.endpoints)
            .field("observers", &self.inner.observers.read().len())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Create a gateway for the configured services.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("shopwire/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(GatewayInner {
                client,
                endpoints: config.endpoints.clone(),
                tokens,
                observers: RwLock::new(Vec::new()),
            }),
        })
    }

    /// Register an observer for gateway events.
    pub fn subscribe(&self, observer: Arc<dyn GatewayObserver>) {
        self.inner.observers.write().push(observer);
    }

    /// Build a URL below a service's base, percent-encoding each segment.
    #[must_use]
    pub fn url(&self, service: Service, segments: &[&str]) -> Url {
        let endpoints = &self.inner.endpoints;
        let mut url = match service {
            Service::Auth => endpoints.auth.clone(),
            Service::Products => endpoints.products.clone(),
            Service::Cart => endpoints.cart.clone(),
            Service::Wishlist => endpoints.wishlist.clone(),
            Service::Orders => endpoints.orders.clone(),
        };
        if !segments.is_empty()
            && let Ok(mut path) = url.path_segments_mut()
        {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `GET` a URL.
    ///
    /// # Errors
    ///
    /// See [`Gateway::request`].
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<Envelope<T>> {
        self.request::<T, ()>(Method::GET, url, None).await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Gateway::request`].
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<Envelope<T>> {
        self.request(Method::POST, url, Some(body)).await
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Gateway::request`].
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<Envelope<T>> {
        self.request(Method::PUT, url, Some(body)).await
    }

    /// `DELETE` a URL.
    ///
    /// # Errors
    ///
    /// See [`Gateway::request`].
    pub async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<Envelope<T>> {
        self.request::<T, ()>(Method::DELETE, url, None).await
    }

    /// Send a request and decode the response envelope.
    ///
    /// # Errors
    ///
    /// - `Transport` on network failure or an undecodable body
    /// - `Unauthorized` on a failing HTTP 401 response (observers have run)
    /// - `Application` on any other failing response
    #[instrument(skip(self, body), fields(method = %method, path = %url.path()))]
    pub async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Envelope<T>> {
        let mut builder = self
            .inner
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(token) = self.inner.tokens.bearer_token() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Request failed to reach service");
            ClientError::Transport(e.to_string())
        })?;
        let status = response.status();
        let text = response.text().await?;

        let raw: Envelope<serde_json::Value> = serde_json::from_str(&text).map_err(|e| {
            warn!(
                status = %status,
                error = %e,
                body = %text.chars().take(200).collect::<String>(),
                "Service returned a non-JSON response"
            );
            ClientError::Transport(format!("invalid response: {e}"))
        })?;

        if !raw.success {
            let message = raw
                .message
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());

            if status == StatusCode::UNAUTHORIZED {
                warn!(message = %message, "Service rejected the session");
                self.notify_unauthorized();
                return Err(ClientError::Unauthorized(message));
            }

            debug!(status = %status, message = %message, "Service reported failure");
            return Err(ClientError::Application(message));
        }

        debug!(status = %status, "Request succeeded");

        let data = raw
            .data
            .filter(|v| !v.is_null())
            .map(|mut v| {
                types::prefer_document_ids(&mut v);
                serde_json::from_value::<T>(v)
            })
            .transpose()
            .map_err(|e| {
                warn!(error = %e, "Response data did not match the expected shape");
                ClientError::Transport(format!("unexpected response data: {e}"))
            })?;

        Ok(Envelope {
            success: true,
            data,
            message: raw.message,
            token: raw.token,
            count: raw.count,
        })
    }

    fn notify_unauthorized(&self) {
        // Observers may call back into code that touches the gateway; never
        // hold the lock while they run.
        let observers = self.inner.observers.read().clone();
        for observer in observers {
            observer.on_unauthorized();
        }
    }
}

impl<T> Envelope<T> {
    /// Take the payload of a successful response.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the service sent no data.
    pub fn into_data(self) -> Result<T> {
        self.data
            .ok_or_else(|| ClientError::Transport("missing data in response".to_string()))
    }
}
