//! Storefront context shared by every front end.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::account::Account;
use crate::admin::Admin;
use crate::catalog::Catalog;
use crate::checkout::Checkout;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::mirror::{Cart, Mirror, Wishlist};
use crate::orders::Orders;
use crate::remote::Gateway;
use crate::session::{Session, SessionStore};
use crate::snapshot::{FileSnapshotStore, SnapshotStore};

/// Owns the gateway, the session, the catalog cache and the mirrors.
///
/// This struct is cheaply cloneable via `Arc`. The gateway's unauthorized
/// event is wired to both the session and the mirrors, so a 401 from any
/// service signs the shopper out and empties their cart and wishlist.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: ClientConfig,
    gateway: Gateway,
    session: Arc<SessionStore>,
    catalog: Catalog,
    mirror: Arc<Mirror>,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("gateway", &self.inner.gateway)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Create a storefront whose session snapshot lives under `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let snapshot = Arc::new(FileSnapshotStore::new(config.snapshot_path()));
        Self::with_snapshot_store(config, snapshot)
    }

    /// Create a storefront over any snapshot store.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the HTTP client cannot be built.
    pub fn with_snapshot_store(config: ClientConfig, snapshot: Arc<dyn SnapshotStore>) -> Result<Self> {
        let session = Arc::new(SessionStore::new(snapshot));
        let mirror = Arc::new(Mirror::new());

        let gateway = Gateway::new(&config, session.clone())?;
        gateway.subscribe(session.clone());
        gateway.subscribe(mirror.clone());

        let catalog = Catalog::new(gateway.clone(), config.catalog_ttl);

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                gateway,
                session,
                catalog,
                mirror,
            }),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.inner.gateway
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn mirror(&self) -> &Mirror {
        &self.inner.mirror
    }

    #[must_use]
    pub fn cart(&self) -> Cart<'_> {
        Cart::new(
            &self.inner.gateway,
            &self.inner.session,
            &self.inner.catalog,
            &self.inner.mirror,
        )
    }

    #[must_use]
    pub fn wishlist(&self) -> Wishlist<'_> {
        Wishlist::new(
            &self.inner.gateway,
            &self.inner.session,
            &self.inner.catalog,
            &self.inner.mirror,
        )
    }

    #[must_use]
    pub fn checkout(&self) -> Checkout<'_> {
        Checkout::new(
            &self.inner.gateway,
            &self.inner.session,
            &self.inner.catalog,
            &self.inner.mirror,
        )
    }

    #[must_use]
    pub fn orders(&self) -> Orders<'_> {
        Orders::new(&self.inner.gateway, &self.inner.session)
    }

    #[must_use]
    pub fn account(&self) -> Account<'_> {
        Account::new(&self.inner.gateway, &self.inner.session)
    }

    #[must_use]
    pub fn admin(&self) -> Admin<'_> {
        Admin::new(&self.inner.gateway, &self.inner.session, &self.inner.catalog)
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Resume the stored session, if any, and load the shopper's data.
    pub async fn start(&self) -> Option<Arc<Session>> {
        let session = self.inner.session.restore()?;
        self.load_user_data().await;
        // The server may have rejected the stored token while loading.
        self.inner.session.current().map(|_| session)
    }

    /// Sign in, then load the shopper's cart, wishlist and badges.
    ///
    /// # Errors
    ///
    /// See [`SessionStore::login`].
    pub async fn login(&self, email: &str, password: &str) -> Result<Arc<Session>> {
        let session = self
            .inner
            .session
            .login(&self.inner.gateway, email, password)
            .await?;
        self.load_user_data().await;
        Ok(session)
    }

    /// Sign out and empty the mirrors.
    pub fn logout(&self) {
        self.inner.session.logout();
        self.inner.mirror.reset();
    }

    /// Load cart, wishlist and both badges. Failures are logged, not returned.
    pub async fn load_user_data(&self) {
        let cart = self.cart();
        let wishlist = self.wishlist();

        let steps = [
            ("cart", cart.load().await.map(|_| ())),
            ("wishlist", wishlist.load().await.map(|_| ())),
            ("cart badge", cart.refresh_count().await.map(|_| ())),
            ("wishlist badge", wishlist.refresh_count().await.map(|_| ())),
        ];

        let mut failed = false;
        for (what, outcome) in steps {
            match outcome {
                Ok(()) => {}
                Err(ClientError::Validation(_)) => {
                    debug!(what, "Skipped, no session");
                }
                Err(e) => {
                    failed = true;
                    warn!(what, error = %e, "Failed to load user data");
                }
            }
        }

        if !failed {
            let badges = self.inner.mirror.badges();
            info!(cart = badges.cart, wishlist = badges.wishlist, "User data loaded");
        }
    }
}
