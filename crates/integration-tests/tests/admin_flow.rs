//! Role gating and catalog invalidation for administrators.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use shopwire_client::ClientError;
use shopwire_client::admin::ACCESS_DENIED;
use shopwire_client::remote::types::{ProductInput, User};
use shopwire_core::{OrderStatus, ProductId, Role, UserId};
use shopwire_integration_tests::{TestContext, catalog, ok, user};

fn boots() -> ProductInput {
    ProductInput {
        name: "Hiking Boot".to_string(),
        description: "Waterproof".to_string(),
        category: "Footwear".to_string(),
        quantity: 6,
        unit_price: Decimal::from(3200),
        image_url: String::new(),
        active: true,
    }
}

#[tokio::test]
async fn test_customer_is_denied_without_any_request() {
    let ctx = TestContext::new().await;
    ctx.login_as("customer").await;

    for route in ["/api/orders/all", "/api/auth/users", "/api/products"] {
        Mock::given(path(route))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&ctx.server)
            .await;
    }

    let admin = ctx.storefront.admin();
    let denied = ClientError::validation(ACCESS_DENIED);
    assert_eq!(admin.dashboard().await.unwrap_err(), denied);
    assert_eq!(admin.list_orders(None).await.unwrap_err(), denied);
    assert_eq!(admin.list_users().await.unwrap_err(), denied);
    assert_eq!(admin.create_product(&boots()).await.unwrap_err(), denied);
    assert_eq!(
        admin
            .set_user_role(&UserId::from("u2"), Role::Admin)
            .await
            .unwrap_err(),
        denied
    );
}

#[tokio::test]
async fn test_signed_out_is_denied() {
    let ctx = TestContext::new().await;
    let err = ctx.storefront.admin().list_users().await.unwrap_err();
    assert_eq!(err.notice(), ACCESS_DENIED);
}

#[tokio::test]
async fn test_product_mutation_invalidates_catalog() {
    let ctx = TestContext::new().await;
    ctx.login_as("admin").await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": catalog()
        })))
        .expect(2)
        .mount(&ctx.server)
        .await;
    ok(
        &ctx.server,
        "POST",
        "/api/products",
        json!({"_id": "p5", "name": "Hiking Boot", "category": "Footwear",
               "quantity": 6, "unitPrice": 3200, "active": true}),
    )
    .await;

    let catalog = ctx.storefront.catalog();
    catalog.ensure_loaded().await.unwrap();
    catalog.ensure_loaded().await.unwrap();
    assert!(catalog.cached().await.is_some());

    let created = ctx.storefront.admin().create_product(&boots()).await.unwrap();
    assert_eq!(created.id, ProductId::from("p5"));
    assert!(catalog.cached().await.is_none());

    catalog.ensure_loaded().await.unwrap();
}

#[tokio::test]
async fn test_negative_price_is_rejected() {
    let ctx = TestContext::new().await;
    ctx.login_as("admin").await;

    let input = ProductInput {
        unit_price: Decimal::from(-1),
        ..boots()
    };
    let err = ctx.storefront.admin().create_product(&input).await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_dashboard_summarises_sources() {
    let ctx = TestContext::new().await;
    ctx.login_as("admin").await;
    ctx.mount_catalog().await;

    ok(
        &ctx.server,
        "GET",
        "/api/orders/all",
        json!([
            {"_id": "o1", "orderNumber": "ORD-1", "status": "pending", "totalAmount": 1070},
            {"_id": "o2", "orderNumber": "ORD-2", "status": "delivered", "totalAmount": 500.5}
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/users"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "message": "Database unavailable"
        })))
        .mount(&ctx.server)
        .await;

    let summary = ctx.storefront.admin().dashboard().await.unwrap();

    assert_eq!(summary.total_orders, Some(2));
    assert_eq!(summary.pending_orders, Some(1));
    assert_eq!(summary.revenue, Some(Decimal::new(15705, 1)));
    assert_eq!(summary.total_products, Some(4));
    assert_eq!(summary.total_users, None);
}

#[tokio::test]
async fn test_toggle_role_flips_between_customer_and_admin() {
    let ctx = TestContext::new().await;
    ctx.login_as("admin").await;

    Mock::given(method("PUT"))
        .and(path("/api/auth/users/u1/role"))
        .and(body_json(json!({"role": "admin"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let customer: User = serde_json::from_value(user("customer")).unwrap();
    let role = ctx.storefront.admin().toggle_user_role(&customer).await.unwrap();
    assert_eq!(role, Role::Admin);
}

#[tokio::test]
async fn test_order_status_filter_is_sent_as_query() {
    let ctx = TestContext::new().await;
    ctx.login_as("admin").await;

    Mock::given(method("GET"))
        .and(path("/api/orders/all"))
        .and(wiremock::matchers::query_param("status", "shipped"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{"_id": "o3", "orderNumber": "ORD-3", "status": "shipped"}]
        })))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let orders = ctx
        .storefront
        .admin()
        .list_orders(Some(OrderStatus::Shipped))
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders.first().unwrap().status, OrderStatus::Shipped);
}
