//! Admin operations: dashboard, order fulfilment, products and users.
//!
//! Every operation checks the session's role first and returns
//! `Validation("Access denied")` without contacting any service when the
//! signed-in user is not an admin.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};

use shopwire_core::{OrderId, OrderStatus, ProductId, Role, UserId};

use crate::catalog::Catalog;
use crate::error::{ClientError, Result};
use crate::remote::types::{Order, Product, ProductInput, StatusUpdate, User};
use crate::remote::{Gateway, Service};
use crate::session::SessionStore;

/// Message returned to non-admin callers.
pub const ACCESS_DENIED: &str = "Access denied";

/// Figures for the admin dashboard.
///
/// Each figure is `None` when its source request failed; the others are
/// still reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_orders: Option<usize>,
    pub pending_orders: Option<usize>,
    /// Sum of all order totals.
    pub revenue: Option<Decimal>,
    pub total_products: Option<usize>,
    pub total_users: Option<usize>,
}

#[derive(Serialize)]
struct RoleChange {
    role: Role,
}

/// Admin service bound to an admin session.
pub struct Admin<'a> {
    gateway: &'a Gateway,
    session: &'a SessionStore,
    catalog: &'a Catalog,
}

impl<'a> Admin<'a> {
    #[must_use]
    pub const fn new(gateway: &'a Gateway, session: &'a SessionStore, catalog: &'a Catalog) -> Self {
        Self {
            gateway,
            session,
            catalog,
        }
    }

    fn ensure_admin(&self) -> Result<()> {
        if self.session.is_admin() {
            Ok(())
        } else {
            Err(ClientError::validation(ACCESS_DENIED))
        }
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Fetch orders, products and users concurrently and summarise them.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for non-admins. Failures of the individual
    /// sources are logged and leave their figures empty.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardSummary> {
        self.ensure_admin()?;

        let mut products_url = self.gateway.url(Service::Products, &[]);
        products_url
            .query_pairs_mut()
            .append_pair("limit", "0");

        let (orders, products, users) = tokio::join!(
            self.gateway
                .get::<Vec<Order>>(self.gateway.url(Service::Orders, &["all"])),
            self.gateway.get::<Vec<Product>>(products_url),
            self.gateway
                .get::<Vec<User>>(self.gateway.url(Service::Auth, &["users"])),
        );

        let mut summary = DashboardSummary::default();

        match orders {
            Ok(envelope) => {
                let orders = envelope.data.unwrap_or_default();
                summary.total_orders = Some(orders.len());
                summary.pending_orders = Some(
                    orders
                        .iter()
                        .filter(|o| o.status == OrderStatus::Pending)
                        .count(),
                );
                summary.revenue = Some(orders.iter().map(|o| o.total_amount).sum());
            }
            Err(e) => warn!(error = %e, "Dashboard orders unavailable"),
        }
        match products {
            Ok(envelope) => summary.total_products = Some(envelope.data.unwrap_or_default().len()),
            Err(e) => warn!(error = %e, "Dashboard products unavailable"),
        }
        match users {
            Ok(envelope) => summary.total_users = Some(envelope.data.unwrap_or_default().len()),
            Err(e) => warn!(error = %e, "Dashboard users unavailable"),
        }

        Ok(summary)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// All shoppers' orders, optionally only those in one status.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for non-admins, otherwise gateway errors.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>> {
        self.ensure_admin()?;
        let mut url = self.gateway.url(Service::Orders, &["all"]);
        if let Some(status) = status {
            url.query_pairs_mut().append_pair("status", status.as_str());
        }
        Ok(self
            .gateway
            .get::<Vec<Order>>(url)
            .await?
            .data
            .unwrap_or_default())
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for non-admins, otherwise gateway errors.
    #[instrument(skip(self, update), fields(order_id = %id, status = %update.status))]
    pub async fn update_order_status(&self, id: &OrderId, update: &StatusUpdate) -> Result<Order> {
        self.ensure_admin()?;
        let order = self
            .gateway
            .put::<Order, _>(
                self.gateway.url(Service::Orders, &[id.as_str(), "status"]),
                update,
            )
            .await?
            .into_data()?;
        info!("Order status updated");
        Ok(order)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Create a product and invalidate the catalog.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for non-admins or a blank name.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product> {
        self.ensure_admin()?;
        validate_product(input)?;

        let product = self
            .gateway
            .post::<Product, _>(self.gateway.url(Service::Products, &[]), input)
            .await?
            .into_data()?;
        self.catalog.invalidate().await;
        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Replace a product's fields and invalidate the catalog.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for non-admins or a blank name.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update_product(&self, id: &ProductId, input: &ProductInput) -> Result<Product> {
        self.ensure_admin()?;
        validate_product(input)?;

        let product = self
            .gateway
            .put::<Product, _>(self.gateway.url(Service::Products, &[id.as_str()]), input)
            .await?
            .into_data()?;
        self.catalog.invalidate().await;
        info!("Product updated");
        Ok(product)
    }

    /// Delete a product and invalidate the catalog.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for non-admins, otherwise gateway errors.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<()> {
        self.ensure_admin()?;
        self.gateway
            .delete::<serde_json::Value>(self.gateway.url(Service::Products, &[id.as_str()]))
            .await?;
        self.catalog.invalidate().await;
        info!("Product deleted");
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Every registered user.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for non-admins, otherwise gateway errors.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.ensure_admin()?;
        Ok(self
            .gateway
            .get::<Vec<User>>(self.gateway.url(Service::Auth, &["users"]))
            .await?
            .data
            .unwrap_or_default())
    }

    /// Assign a role.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for non-admins, otherwise gateway errors.
    #[instrument(skip(self), fields(user_id = %id, role = %role))]
    pub async fn set_user_role(&self, id: &UserId, role: Role) -> Result<()> {
        self.ensure_admin()?;
        self.gateway
            .put::<serde_json::Value, _>(
                self.gateway.url(Service::Auth, &["users", id.as_str(), "role"]),
                &RoleChange { role },
            )
            .await?;
        info!("User role changed");
        Ok(())
    }

    /// Flip a user between admin and customer. Returns the new role.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for non-admins, otherwise gateway errors.
    pub async fn toggle_user_role(&self, user: &User) -> Result<Role> {
        let role = user.role.toggled();
        self.set_user_role(&user.id, role).await?;
        Ok(role)
    }

    /// Delete a user account.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for non-admins, otherwise gateway errors.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete_user(&self, id: &UserId) -> Result<()> {
        self.ensure_admin()?;
        self.gateway
            .delete::<serde_json::Value>(self.gateway.url(Service::Auth, &["users", id.as_str()]))
            .await?;
        info!("User deleted");
        Ok(())
    }
}

fn validate_product(input: &ProductInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(ClientError::validation("Product name is required"));
    }
    if input.unit_price.is_sign_negative() {
        return Err(ClientError::validation("Price cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::{ClientConfig, ServiceEndpoints};
    use crate::snapshot::{AUTH_TOKEN_KEY, CURRENT_USER_KEY, MemorySnapshotStore, SnapshotStore};

    use super::*;

    struct Fixture {
        session: Arc<SessionStore>,
        gateway: Gateway,
        catalog: Catalog,
    }

    impl Fixture {
        fn admin(&self) -> Admin<'_> {
            Admin::new(&self.gateway, &self.session, &self.catalog)
        }
    }

    fn fixture(server: &MockServer, role: &str) -> Fixture {
        let snapshot = Arc::new(MemorySnapshotStore::new());
        snapshot.set(AUTH_TOKEN_KEY, "tok").unwrap();
        snapshot
            .set(
                CURRENT_USER_KEY,
                &json!({"id": "u1", "firstName": "Jo", "lastName": "Cruz",
                        "email": "jo@example.ph", "role": role})
                .to_string(),
            )
            .unwrap();
        let session = Arc::new(SessionStore::new(snapshot));
        session.restore().unwrap();

        let endpoints = ServiceEndpoints::under(&server.uri()).unwrap();
        let config = ClientConfig::with_endpoints(endpoints, "unused");
        let gateway = Gateway::new(&config, session.clone()).unwrap();
        let catalog = Catalog::new(gateway.clone(), config.catalog_ttl);
        Fixture {
            session,
            gateway,
            catalog,
        }
    }

    fn product_input() -> ProductInput {
        ProductInput {
            name: "Sandal".to_string(),
            description: "Leather sandal".to_string(),
            category: "Footwear".to_string(),
            quantity: 5,
            unit_price: Decimal::from(700),
            image_url: String::new(),
            active: true,
        }
    }

    #[tokio::test]
    async fn test_customer_is_denied_without_request() {
        let server = MockServer::start().await;
        let fx = fixture(&server, "customer");

        assert_eq!(
            fx.admin().dashboard().await.unwrap_err(),
            ClientError::validation(ACCESS_DENIED)
        );
        assert!(fx.admin().list_users().await.unwrap_err().is_validation());
        assert!(
            fx.admin()
                .delete_product(&ProductId::new("p1"))
                .await
                .unwrap_err()
                .is_validation()
        );
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_reports_what_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orders/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [
                    {"_id": "o1", "orderNumber": "ORD-1", "status": "pending", "totalAmount": 1070.5},
                    {"_id": "o2", "orderNumber": "ORD-2", "status": "delivered", "totalAmount": 250}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .and(query_param("limit", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"_id": "p1", "name": "Sandal"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/auth/users"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "success": false,
                "message": "boom"
            })))
            .mount(&server)
            .await;

        let fx = fixture(&server, "admin");
        let summary = fx.admin().dashboard().await.unwrap();

        assert_eq!(summary.total_orders, Some(2));
        assert_eq!(summary.pending_orders, Some(1));
        assert_eq!(summary.revenue, Some(Decimal::new(13_205, 1)));
        assert_eq!(summary.total_products, Some(1));
        assert_eq!(summary.total_users, None);
    }

    #[tokio::test]
    async fn test_list_orders_with_status_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orders/all"))
            .and(query_param("status", "processing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server, "admin");
        let orders = fx
            .admin()
            .list_orders(Some(OrderStatus::Processing))
            .await
            .unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_update_order_status_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/orders/o1/status"))
            .and(body_json(json!({
                "status": "shipped",
                "trackingNumber": "LBC-123",
                "note": "Left the warehouse"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"_id": "o1", "orderNumber": "ORD-1", "status": "shipped",
                         "totalAmount": 1070, "trackingNumber": "LBC-123"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server, "admin");
        let order = fx
            .admin()
            .update_order_status(
                &OrderId::new("o1"),
                &StatusUpdate {
                    status: OrderStatus::Shipped,
                    tracking_number: "LBC-123".to_string(),
                    note: "Left the warehouse".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(order.tracking_number.as_deref(), Some("LBC-123"));
    }

    #[tokio::test]
    async fn test_product_mutation_invalidates_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": []
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/products"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": {"_id": "p9", "name": "Sandal", "quantity": 5, "unitPrice": 700,
                         "active": true}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server, "admin");
        fx.catalog.load().await.unwrap();
        assert!(fx.catalog.cached().await.is_some());

        let product = fx.admin().create_product(&product_input()).await.unwrap();
        assert_eq!(product.id.as_str(), "p9");
        assert!(fx.catalog.cached().await.is_none());
    }

    #[tokio::test]
    async fn test_toggle_role() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/auth/users/u2/role"))
            .and(body_json(json!({"role": "admin"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let fx = fixture(&server, "admin");
        let user: User = serde_json::from_value(json!({
            "_id": "u2", "firstName": "Ana", "lastName": "Reyes",
            "email": "ana@example.ph", "role": "customer"
        }))
        .unwrap();

        assert_eq!(fx.admin().toggle_user_role(&user).await.unwrap(), Role::Admin);
    }
}
