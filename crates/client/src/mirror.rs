//! Cart and wishlist mirrors.
//!
//! A mirror is the latest snapshot the server returned. Every mutation is one
//! round trip whose successful response replaces the mirror wholesale; a
//! failure leaves it untouched. Readers get `Arc` snapshots and never observe
//! a half-applied update.
//!
//! Badge counters never touch the mirrors. The wishlist badge is the item
//! count of the wishlist snapshot just stored. The cart badge comes from the
//! cart service's count query, which every successful cart change re-runs.

use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use shopwire_core::ProductId;

use crate::catalog::Catalog;
use crate::error::{ClientError, Result, add_breadcrumb};
use crate::remote::types::{CartSnapshot, MovedToCart, Product, WishlistSnapshot};
use crate::remote::{Gateway, GatewayObserver, Service};
use crate::session::SessionStore;

/// Badge counters shown next to the cart and wishlist links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Badges {
    pub cart: u64,
    pub wishlist: u64,
}

#[derive(Debug, Default)]
struct MirrorState {
    cart: Option<Arc<CartSnapshot>>,
    wishlist: Option<Arc<WishlistSnapshot>>,
    badges: Badges,
}

/// Local copies of the server's cart and wishlist.
#[derive(Debug, Default)]
pub struct Mirror {
    state: RwLock<MirrorState>,
}

impl Mirror {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest cart snapshot, if one has been loaded.
    #[must_use]
    pub fn cart(&self) -> Option<Arc<CartSnapshot>> {
        self.state.read().cart.clone()
    }

    /// Latest wishlist snapshot, if one has been loaded.
    #[must_use]
    pub fn wishlist(&self) -> Option<Arc<WishlistSnapshot>> {
        self.state.read().wishlist.clone()
    }

    /// Cart and wishlist read under one lock.
    #[must_use]
    pub fn both(&self) -> (Option<Arc<CartSnapshot>>, Option<Arc<WishlistSnapshot>>) {
        let state = self.state.read();
        (state.cart.clone(), state.wishlist.clone())
    }

    #[must_use]
    pub fn badges(&self) -> Badges {
        self.state.read().badges
    }

    fn replace_cart(&self, cart: CartSnapshot) -> Arc<CartSnapshot> {
        let cart = Arc::new(cart);
        self.state.write().cart = Some(Arc::clone(&cart));
        cart
    }

    fn replace_wishlist(&self, wishlist: WishlistSnapshot) -> Arc<WishlistSnapshot> {
        let wishlist = Arc::new(wishlist);
        let mut state = self.state.write();
        state.badges.wishlist = wishlist.items.len() as u64;
        state.wishlist = Some(Arc::clone(&wishlist));
        wishlist
    }

    fn replace_both(&self, moved: MovedToCart) -> (Arc<CartSnapshot>, Arc<WishlistSnapshot>) {
        let cart = Arc::new(moved.cart);
        let wishlist = Arc::new(moved.wishlist);
        let mut state = self.state.write();
        state.badges.wishlist = wishlist.items.len() as u64;
        state.cart = Some(Arc::clone(&cart));
        state.wishlist = Some(Arc::clone(&wishlist));
        (cart, wishlist)
    }

    /// Empty both mirrors and zero the badges.
    pub fn reset(&self) {
        *self.state.write() = MirrorState::default();
        debug!("Cart and wishlist mirrors reset");
    }
}

impl GatewayObserver for Mirror {
    fn on_unauthorized(&self) {
        self.reset();
    }
}

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddToCart<'a> {
    product_id: &'a ProductId,
    sku: &'a ProductId,
    name: &'a str,
    quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    unit_price: Decimal,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddToWishlist<'a> {
    product_id: &'a ProductId,
    sku: &'a ProductId,
    name: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    unit_price: Decimal,
}

#[derive(Serialize)]
struct Quantity {
    quantity: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DiscountCode {
    discount_code: String,
}

#[derive(Serialize)]
struct SavedCartName<'a> {
    name: &'a str,
}

async fn catalog_product(catalog: &Catalog, id: &ProductId) -> Result<Product> {
    catalog
        .product(id)
        .await?
        .ok_or_else(|| ClientError::validation("Product not found"))
}

// =============================================================================
// Cart
// =============================================================================

/// Cart operations bound to the shopper's session.
pub struct Cart<'a> {
    gateway: &'a Gateway,
    session: &'a SessionStore,
    catalog: &'a Catalog,
    mirror: &'a Mirror,
}

impl<'a> Cart<'a> {
    #[must_use]
    pub const fn new(
        gateway: &'a Gateway,
        session: &'a SessionStore,
        catalog: &'a Catalog,
        mirror: &'a Mirror,
    ) -> Self {
        Self {
            gateway,
            session,
            catalog,
            mirror,
        }
    }

    /// Fetch the cart and replace the mirror.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out, otherwise gateway errors.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Arc<CartSnapshot>> {
        self.session.require()?;
        let cart = self
            .gateway
            .get::<CartSnapshot>(self.gateway.url(Service::Cart, &[]))
            .await?
            .data
            .unwrap_or_default();
        Ok(self.mirror.replace_cart(cart))
    }

    /// Add `quantity` units of a catalog product.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out, for a zero quantity, or when the
    /// product is not in the catalog.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId, quantity: u32) -> Result<Arc<CartSnapshot>> {
        self.session.require()?;
        if quantity < 1 {
            return Err(ClientError::validation("Quantity must be at least 1"));
        }
        let product = catalog_product(self.catalog, product_id).await?;

        let body = AddToCart {
            product_id: &product.id,
            sku: &product.id,
            name: &product.name,
            quantity,
            unit_price: product.unit_price,
        };
        let cart = self
            .gateway
            .post::<CartSnapshot, _>(self.gateway.url(Service::Cart, &["add"]), &body)
            .await?
            .into_data()?;

        add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[("product_id", product_id.as_str())]),
        );
        info!(quantity, "Added to cart");
        let cart = self.mirror.replace_cart(cart);
        self.sync_badge().await;
        Ok(cart)
    }

    /// Set a line's quantity. Anything below 1 removes the line.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out, otherwise gateway errors.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Arc<CartSnapshot>> {
        if quantity < 1 {
            return self.remove(product_id).await;
        }
        self.session.require()?;

        let cart = self
            .gateway
            .put::<CartSnapshot, _>(
                self.gateway.url(Service::Cart, &["update", product_id.as_str()]),
                &Quantity { quantity },
            )
            .await?
            .into_data()?;
        let cart = self.mirror.replace_cart(cart);
        self.sync_badge().await;
        Ok(cart)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out, otherwise gateway errors.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<Arc<CartSnapshot>> {
        self.session.require()?;
        let cart = self
            .gateway
            .delete::<CartSnapshot>(
                self.gateway.url(Service::Cart, &["remove", product_id.as_str()]),
            )
            .await?
            .into_data()?;

        add_breadcrumb(
            "cart",
            "Removed from cart",
            Some(&[("product_id", product_id.as_str())]),
        );
        let cart = self.mirror.replace_cart(cart);
        self.sync_badge().await;
        Ok(cart)
    }

    /// Apply a discount code (trimmed and upper-cased).
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty code, otherwise the server's reason.
    #[instrument(skip(self))]
    pub async fn apply_discount(&self, code: &str) -> Result<Arc<CartSnapshot>> {
        self.session.require()?;
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(ClientError::validation("Please enter a discount code"));
        }

        let cart = self
            .gateway
            .post::<CartSnapshot, _>(
                self.gateway.url(Service::Cart, &["apply-discount"]),
                &DiscountCode {
                    discount_code: code.clone(),
                },
            )
            .await?
            .into_data()?;

        add_breadcrumb("cart", "Discount applied", Some(&[("code", code.as_str())]));
        Ok(self.mirror.replace_cart(cart))
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out, otherwise gateway errors.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<Arc<CartSnapshot>> {
        self.session.require()?;
        let cart = self
            .gateway
            .delete::<CartSnapshot>(self.gateway.url(Service::Cart, &["clear"]))
            .await?
            .data
            .unwrap_or_default();
        let cart = self.mirror.replace_cart(cart);
        self.sync_badge().await;
        Ok(cart)
    }

    /// Save the cart under a name for later. The mirror is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty name, otherwise gateway errors.
    #[instrument(skip(self))]
    pub async fn save(&self, name: &str) -> Result<()> {
        self.session.require()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::validation("Please enter a name for the cart"));
        }

        self.gateway
            .post::<serde_json::Value, _>(
                self.gateway.url(Service::Cart, &["save"]),
                &SavedCartName { name },
            )
            .await?;
        info!("Cart saved");
        Ok(())
    }

    /// Refresh the cart badge from `GET /count`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out, otherwise gateway errors.
    pub async fn refresh_count(&self) -> Result<u64> {
        self.session.require()?;
        let count = self
            .gateway
            .get::<serde_json::Value>(self.gateway.url(Service::Cart, &["count"]))
            .await?
            .count
            .unwrap_or_default();
        self.mirror.state.write().badges.cart = count;
        Ok(count)
    }

    /// Re-run the count query after a change. A failure keeps the old badge.
    async fn sync_badge(&self) {
        if let Err(e) = self.refresh_count().await {
            warn!(error = %e, "Failed to refresh cart badge");
        }
    }
}

// =============================================================================
// Wishlist
// =============================================================================

/// Wishlist operations bound to the shopper's session.
pub struct Wishlist<'a> {
    gateway: &'a Gateway,
    session: &'a SessionStore,
    catalog: &'a Catalog,
    mirror: &'a Mirror,
}

impl<'a> Wishlist<'a> {
    #[must_use]
    pub const fn new(
        gateway: &'a Gateway,
        session: &'a SessionStore,
        catalog: &'a Catalog,
        mirror: &'a Mirror,
    ) -> Self {
        Self {
            gateway,
            session,
            catalog,
            mirror,
        }
    }

    /// Fetch the wishlist and replace the mirror.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out, otherwise gateway errors.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Arc<WishlistSnapshot>> {
        self.session.require()?;
        let wishlist = self.fetch().await?;
        Ok(self.mirror.replace_wishlist(wishlist))
    }

    /// Save a catalog product.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out or the product is not in the catalog.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId) -> Result<Arc<WishlistSnapshot>> {
        self.session.require()?;
        let product = catalog_product(self.catalog, product_id).await?;

        let body = AddToWishlist {
            product_id: &product.id,
            sku: &product.id,
            name: &product.name,
            unit_price: product.unit_price,
        };
        let wishlist = self
            .gateway
            .post::<WishlistSnapshot, _>(self.gateway.url(Service::Wishlist, &["add"]), &body)
            .await?
            .into_data()?;

        add_breadcrumb(
            "wishlist",
            "Added to wishlist",
            Some(&[("product_id", product_id.as_str())]),
        );
        Ok(self.mirror.replace_wishlist(wishlist))
    }

    /// Remove a saved product.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out, otherwise gateway errors.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<Arc<WishlistSnapshot>> {
        self.session.require()?;
        let wishlist = self
            .gateway
            .delete::<WishlistSnapshot>(
                self.gateway
                    .url(Service::Wishlist, &["remove", product_id.as_str()]),
            )
            .await?
            .data
            .unwrap_or_default();
        Ok(self.mirror.replace_wishlist(wishlist))
    }

    /// Move a saved product into the cart in one server call.
    ///
    /// Both mirrors and the wishlist badge are replaced together from the
    /// single response; the cart badge is re-queried afterwards.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out or for a zero quantity.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn move_to_cart(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(Arc<CartSnapshot>, Arc<WishlistSnapshot>)> {
        self.session.require()?;
        if quantity < 1 {
            return Err(ClientError::validation("Quantity must be at least 1"));
        }

        let moved = self
            .gateway
            .post::<MovedToCart, _>(
                self.gateway
                    .url(Service::Wishlist, &["move-to-cart", product_id.as_str()]),
                &Quantity { quantity },
            )
            .await?
            .into_data()?;

        add_breadcrumb(
            "wishlist",
            "Moved to cart",
            Some(&[("product_id", product_id.as_str())]),
        );
        let replaced = self.mirror.replace_both(moved);
        Cart::new(self.gateway, self.session, self.catalog, self.mirror)
            .sync_badge()
            .await;
        Ok(replaced)
    }

    /// Refresh the wishlist badge. The mirror is not touched.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out, otherwise gateway errors.
    pub async fn refresh_count(&self) -> Result<u64> {
        self.session.require()?;
        let count = self.fetch().await?.items.len() as u64;
        self.mirror.state.write().badges.wishlist = count;
        Ok(count)
    }

    async fn fetch(&self) -> Result<WishlistSnapshot> {
        Ok(self
            .gateway
            .get::<WishlistSnapshot>(self.gateway.url(Service::Wishlist, &[]))
            .await?
            .data
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::{ClientConfig, ServiceEndpoints};
    use crate::snapshot::{AUTH_TOKEN_KEY, CURRENT_USER_KEY, MemorySnapshotStore, SnapshotStore};

    use super::*;

    struct Fixture {
        session: Arc<SessionStore>,
        gateway: Gateway,
        catalog: Catalog,
        mirror: Arc<Mirror>,
    }

    impl Fixture {
        fn cart(&self) -> Cart<'_> {
            Cart::new(&self.gateway, &self.session, &self.catalog, &self.mirror)
        }

        fn wishlist(&self) -> Wishlist<'_> {
            Wishlist::new(&self.gateway, &self.session, &self.catalog, &self.mirror)
        }
    }

    fn fixture(server: &MockServer) -> Fixture {
        let snapshot = Arc::new(MemorySnapshotStore::new());
        snapshot.set(AUTH_TOKEN_KEY, "tok").unwrap();
        snapshot
            .set(
                CURRENT_USER_KEY,
                &json!({"id": "u1", "firstName": "Maria", "lastName": "Santos",
                        "email": "maria@example.ph"})
                .to_string(),
            )
            .unwrap();
        let session = Arc::new(SessionStore::new(snapshot));
        session.restore().unwrap();

        let endpoints = ServiceEndpoints::under(&server.uri()).unwrap();
        let config = ClientConfig::with_endpoints(endpoints, "unused");
        let gateway = Gateway::new(&config, session.clone()).unwrap();
        let mirror = Arc::new(Mirror::new());
        gateway.subscribe(session.clone());
        gateway.subscribe(mirror.clone());
        let catalog = Catalog::new(gateway.clone(), config.catalog_ttl);

        Fixture {
            session,
            gateway,
            catalog,
            mirror,
        }
    }

    fn cart_json(quantity: u32) -> serde_json::Value {
        json!({
            "items": [{"productId": "p1", "name": "Sandal", "quantity": quantity,
                       "unitPrice": 700, "totalPrice": 700 * quantity}],
            "totalAmount": 700 * quantity,
            "discount": 0,
            "finalAmount": 700 * quantity
        })
    }

    async fn mount_catalog(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"_id": "p1", "name": "Sandal", "quantity": 3, "unitPrice": 700,
                          "active": true}]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_add_sends_catalog_fields_and_replaces_mirror() {
        let server = MockServer::start().await;
        mount_catalog(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/cart/add"))
            .and(body_json(json!({
                "productId": "p1", "sku": "p1", "name": "Sandal",
                "quantity": 2, "unitPrice": 700.0
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "data": cart_json(2)})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server);
        let cart = fx.cart().add(&ProductId::new("p1"), 2).await.unwrap();

        assert_eq!(cart.line(&ProductId::new("p1")).unwrap().quantity, 2);
        assert_eq!(fx.mirror.cart().unwrap(), cart);
    }

    #[tokio::test]
    async fn test_failure_leaves_mirror_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "data": cart_json(1)})),
            )
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/cart/update/p1"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "message": "Insufficient stock"
            })))
            .mount(&server)
            .await;

        let fx = fixture(&server);
        let before = fx.cart().load().await.unwrap();
        let err = fx
            .cart()
            .update_quantity(&ProductId::new("p1"), 50)
            .await
            .unwrap_err();

        assert_eq!(err.notice(), "Insufficient stock");
        assert!(Arc::ptr_eq(&fx.mirror.cart().unwrap(), &before));
    }

    #[tokio::test]
    async fn test_zero_quantity_removes_line() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/cart/remove/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"items": [], "totalAmount": 0, "discount": 0, "finalAmount": 0}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server);
        let cart = fx
            .cart()
            .update_quantity(&ProductId::new("p1"), 0)
            .await
            .unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_discount_code_is_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart/apply-discount"))
            .and(body_json(json!({"discountCode": "SAVE10"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "data": cart_json(1)})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server);
        fx.cart().apply_discount("  save10 ").await.unwrap();

        let err = fx.cart().apply_discount("   ").await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_save_requires_name_and_keeps_mirror() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart/save"))
            .and(body_json(json!({"name": "Birthday"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server);
        assert!(fx.cart().save(" ").await.unwrap_err().is_validation());
        fx.cart().save("Birthday").await.unwrap();
        assert!(fx.mirror.cart().is_none());
    }

    #[tokio::test]
    async fn test_move_to_cart_replaces_both() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/wishlist/move-to-cart/p1"))
            .and(body_json(json!({"quantity": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"wishlist": {"items": []}, "cart": cart_json(1)}
            })))
            .mount(&server)
            .await;

        let fx = fixture(&server);
        let (cart, wishlist) = fx
            .wishlist()
            .move_to_cart(&ProductId::new("p1"), 1)
            .await
            .unwrap();

        let (mirrored_cart, mirrored_wishlist) = fx.mirror.both();
        assert!(Arc::ptr_eq(&mirrored_cart.unwrap(), &cart));
        assert!(Arc::ptr_eq(&mirrored_wishlist.unwrap(), &wishlist));
        assert!(!wishlist.contains(&ProductId::new("p1")));
        assert_eq!(cart.line(&ProductId::new("p1")).unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_move_to_cart_updates_both_badges() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/wishlist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"items": [{"productId": "p1", "name": "Sandal", "unitPrice": 700}]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cart/count"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "count": 0})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cart/count"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "count": 1})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/wishlist/move-to-cart/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"wishlist": {"items": []}, "cart": cart_json(1)}
            })))
            .mount(&server)
            .await;

        let fx = fixture(&server);
        fx.wishlist().load().await.unwrap();
        fx.cart().refresh_count().await.unwrap();
        assert_eq!(fx.mirror.badges(), Badges { cart: 0, wishlist: 1 });

        fx.wishlist()
            .move_to_cart(&ProductId::new("p1"), 1)
            .await
            .unwrap();

        assert_eq!(fx.mirror.badges(), Badges { cart: 1, wishlist: 0 });
    }

    #[tokio::test]
    async fn test_cart_changes_refresh_cart_badge() {
        let server = MockServer::start().await;
        mount_catalog(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/cart/add"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "data": cart_json(2)})),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/cart/clear"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"items": [], "totalAmount": 0, "discount": 0, "finalAmount": 0}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cart/count"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "count": 2})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cart/count"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "count": 0})),
            )
            .mount(&server)
            .await;

        let fx = fixture(&server);
        fx.cart().add(&ProductId::new("p1"), 2).await.unwrap();
        assert_eq!(fx.mirror.badges().cart, 2);

        fx.cart().clear().await.unwrap();
        assert_eq!(fx.mirror.badges().cart, 0);
    }

    #[tokio::test]
    async fn test_failed_badge_refresh_keeps_the_change() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/cart/remove/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"items": [], "totalAmount": 0, "discount": 0, "finalAmount": 0}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cart/count"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "success": false,
                "message": "count unavailable"
            })))
            .mount(&server)
            .await;

        let fx = fixture(&server);
        let cart = fx.cart().remove(&ProductId::new("p1")).await.unwrap();

        assert!(cart.is_empty());
        assert!(fx.mirror.cart().unwrap().is_empty());
        assert!(fx.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_counts_update_badges_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart/count"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "count": 3})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/wishlist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"items": [
                    {"productId": "p1", "name": "Sandal", "unitPrice": 700},
                    {"productId": "p2", "name": "Tote", "unitPrice": 450}
                ]}
            })))
            .mount(&server)
            .await;

        let fx = fixture(&server);
        fx.cart().refresh_count().await.unwrap();
        fx.wishlist().refresh_count().await.unwrap();

        assert_eq!(fx.mirror.badges(), Badges { cart: 3, wishlist: 2 });
        assert!(fx.mirror.wishlist().is_none());
        assert!(fx.mirror.cart().is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_resets_mirror() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "data": cart_json(1)})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/cart/count"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "success": false,
                "message": "jwt expired"
            })))
            .mount(&server)
            .await;

        let fx = fixture(&server);
        fx.cart().load().await.unwrap();

        let err = fx.cart().refresh_count().await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized(_)));
        assert!(fx.mirror.cart().is_none());
        assert_eq!(fx.mirror.badges(), Badges::default());
        assert!(!fx.session.is_authenticated());

        let err = fx.cart().load().await.unwrap_err();
        assert_eq!(err.notice(), "Please login first");
    }
}
