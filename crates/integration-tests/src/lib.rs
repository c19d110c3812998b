//! Integration tests for Shopwire.
//!
//! Every test runs a real [`Storefront`] against `wiremock` servers standing
//! in for the auth, products, cart/wishlist and orders services, with the
//! session snapshot in a temporary directory.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopwire-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_lifecycle` - Login, restore across restarts, logout and 401 teardown
//! - `shopping_flow` - Catalog views, cart and wishlist mirrors, checkout
//! - `admin_flow` - Role gating and catalog invalidation

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::path::Path;

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shopwire_client::{ClientConfig, ServiceEndpoints, Storefront};

/// A storefront wired to a mock server and a private data directory.
pub struct TestContext {
    pub server: MockServer,
    pub storefront: Storefront,
    pub data_dir: TempDir,
}

impl TestContext {
    /// Start a mock server and a signed-out storefront.
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let data_dir = tempfile::tempdir().unwrap();
        let storefront = storefront_for(&server, data_dir.path());
        Self {
            server,
            storefront,
            data_dir,
        }
    }

    /// A second storefront over the same server and data directory, as after
    /// a restart of the client.
    #[must_use]
    pub fn restart(&self) -> Storefront {
        storefront_for(&self.server, self.data_dir.path())
    }

    /// Path of the durable session snapshot.
    #[must_use]
    pub fn snapshot_path(&self) -> std::path::PathBuf {
        self.storefront.config().snapshot_path()
    }

    /// Mount a successful login for `role`, returning token `tok-<role>`.
    pub async fn mount_login(&self, role: &str) {
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "token": format!("tok-{role}"),
                "data": user(role)
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount empty cart, wishlist and count responses used after login.
    pub async fn mount_empty_user_data(&self) {
        ok(&self.server, "GET", "/api/cart", json!({"items": [], "totalAmount": 0, "discount": 0, "finalAmount": 0})).await;
        ok(&self.server, "GET", "/api/wishlist", json!({"items": []})).await;
        Mock::given(method("GET"))
            .and(path("/api/cart/count"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "count": 0})),
            )
            .mount(&self.server)
            .await;
    }

    /// Mount the catalog fixture.
    pub async fn mount_catalog(&self) {
        ok(&self.server, "GET", "/api/products", catalog()).await;
    }

    /// Sign in as `role` with empty cart and wishlist.
    pub async fn login_as(&self, role: &str) {
        self.mount_login(role).await;
        self.mount_empty_user_data().await;
        self.storefront
            .login("maria@example.ph", "secret")
            .await
            .unwrap();
    }
}

fn storefront_for(server: &MockServer, data_dir: &Path) -> Storefront {
    let endpoints = ServiceEndpoints::under(&server.uri()).unwrap();
    Storefront::new(ClientConfig::with_endpoints(endpoints, data_dir)).unwrap()
}

/// Mount a `{success: true, data}` response.
pub async fn ok(server: &MockServer, verb: &str, route: &str, data: Value) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": data})),
        )
        .mount(server)
        .await;
}

/// A user document as the auth service returns it.
#[must_use]
pub fn user(role: &str) -> Value {
    json!({
        "_id": "u1",
        "firstName": "Maria",
        "lastName": "Santos",
        "email": "maria@example.ph",
        "phone": "09171234567",
        "role": role,
        "addresses": [{
            "_id": "a1", "label": "Home", "street": "2 Roxas Blvd", "city": "Manila",
            "state": "NCR", "zipCode": "1000", "country": "Philippines", "isDefault": true
        }]
    })
}

/// Four products over three categories with distinct prices.
#[must_use]
pub fn catalog() -> Value {
    json!([
        {"_id": "p1", "name": "Trail Runner", "description": "Grippy outsole",
         "category": "Footwear", "quantity": 4, "unitPrice": 2500, "active": true},
        {"_id": "p2", "name": "linen shirt", "description": "Breathable",
         "category": "Apparel", "quantity": 0, "unitPrice": 900, "active": true},
        {"_id": "p3", "name": "Canvas Tote", "description": "Carries a laptop",
         "category": "Bags", "quantity": 12, "unitPrice": 450},
        {"_id": "p4", "name": "Sandal", "description": "Leather straps",
         "category": "Footwear", "quantity": 3, "unitPrice": 700, "active": true}
    ])
}

/// A cart document with one line.
#[must_use]
pub fn cart_with(product_id: &str, name: &str, quantity: u32, unit_price: u32, discount: u32) -> Value {
    let total = quantity * unit_price;
    json!({
        "items": [{"productId": product_id, "name": name, "quantity": quantity,
                   "unitPrice": unit_price, "totalPrice": total}],
        "totalAmount": total,
        "discount": discount,
        "finalAmount": total - discount
    })
}
