//! The shopper's order history.

use tracing::instrument;

use shopwire_core::{OrderId, OrderStatus};

use crate::error::Result;
use crate::remote::types::Order;
use crate::remote::{Gateway, Service};
use crate::session::SessionStore;

/// Order history bound to the shopper's session.
pub struct Orders<'a> {
    gateway: &'a Gateway,
    session: &'a SessionStore,
}

impl<'a> Orders<'a> {
    #[must_use]
    pub const fn new(gateway: &'a Gateway, session: &'a SessionStore) -> Self {
        Self { gateway, session }
    }

    /// The shopper's orders, optionally only those in one status.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out, otherwise gateway errors.
    #[instrument(skip(self))]
    pub async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>> {
        self.session.require()?;
        let url = match status {
            Some(status) => self
                .gateway
                .url(Service::Orders, &["status", status.as_str()]),
            None => self.gateway.url(Service::Orders, &[]),
        };
        Ok(self
            .gateway
            .get::<Vec<Order>>(url)
            .await?
            .data
            .unwrap_or_default())
    }

    /// One order by id.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out, otherwise gateway errors.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get(&self, id: &OrderId) -> Result<Order> {
        self.session.require()?;
        self.gateway
            .get::<Order>(self.gateway.url(Service::Orders, &[id.as_str()]))
            .await?
            .into_data()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::{ClientConfig, ServiceEndpoints};
    use crate::error::ClientError;
    use crate::snapshot::{AUTH_TOKEN_KEY, CURRENT_USER_KEY, MemorySnapshotStore, SnapshotStore};

    use super::*;

    fn signed_in(server: &MockServer) -> (Arc<SessionStore>, Gateway) {
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
        (session, gateway)
    }

    #[tokio::test]
    async fn test_list_by_status_and_unknown_status_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orders/status/shipped"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [
                    {"_id": "o1", "orderNumber": "ORD-1", "status": "shipped",
                     "totalAmount": 1070, "paymentMethod": "cod",
                     "createdAt": "2026-03-01T08:30:00Z"},
                    {"_id": "o2", "orderNumber": "ORD-2", "status": "on_hold",
                     "totalAmount": 50, "paymentMethod": "gcash"}
                ]
            })))
            .mount(&server)
            .await;

        let (session, gateway) = signed_in(&server);
        let orders = Orders::new(&gateway, &session)
            .list(Some(OrderStatus::Shipped))
            .await
            .unwrap();

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].status, OrderStatus::Shipped);
        assert!(orders[0].created_at.is_some());
        assert_eq!(orders[1].status, OrderStatus::Unknown);
    }

    #[tokio::test]
    async fn test_get_surfaces_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orders/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "message": "Order not found"
            })))
            .mount(&server)
            .await;

        let (session, gateway) = signed_in(&server);
        let err = Orders::new(&gateway, &session)
            .get(&OrderId::new("missing"))
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::Application("Order not found".to_string()));
    }
}
