//! Wire types for the storefront REST services.
//!
//! These mirror the JSON the services exchange (camelCase keys, document ids
//! that may arrive as `_id` or `id`). Money fields are decoded from and
//! encoded to JSON numbers as [`Decimal`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopwire_core::{AddressId, OrderId, OrderStatus, ProductId, Role, UserId};

// =============================================================================
// Envelope
// =============================================================================

/// Response envelope shared by every service.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Whether the service considers the call successful.
    pub success: bool,
    /// Payload, when the endpoint returns one.
    pub data: Option<T>,
    /// Human-readable message, mostly present on failures.
    #[serde(default)]
    pub message: Option<String>,
    /// Bearer token (login only).
    #[serde(default)]
    pub token: Option<String>,
    /// Item count (cart count only).
    #[serde(default)]
    pub count: Option<u64>,
}

/// Drop `id` from every object that also carries `_id`.
///
/// Services that serialise virtuals send both keys; the document id wins so
/// `#[serde(alias = "_id")]` never sees the field twice.
pub(crate) fn prefer_document_ids(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            if map.contains_key("_id") {
                map.remove("id");
            }
            map.values_mut().for_each(prefer_document_ids);
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(prefer_document_ids),
        _ => {}
    }
}

// =============================================================================
// Users & Addresses
// =============================================================================

/// An authenticated account as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub addresses: Vec<Address>,
}

impl User {
    /// First and last name joined for display.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// The address flagged as default, falling back to the first one.
    #[must_use]
    pub fn default_address(&self) -> Option<&Address> {
        self.addresses
            .iter()
            .find(|a| a.is_default)
            .or_else(|| self.addresses.first())
    }
}

/// A saved address in the user's address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(alias = "_id")]
    pub id: AddressId,
    #[serde(default)]
    pub label: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Body of `POST /addresses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub label: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub is_default: bool,
}

/// Body of `POST /register`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("phone", &self.phone)
            .finish()
    }
}

/// Body of `PUT /profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

// =============================================================================
// Products
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub active: bool,
}

impl Product {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// Body of product create (`POST /`) and edit (`PUT /:id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub category: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub image_url: String,
    pub active: bool,
}

// =============================================================================
// Cart & Wishlist
// =============================================================================

/// One line of a cart or an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

/// The server's view of the shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub final_amount: Decimal,
}

impl CartSnapshot {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Amount due: `finalAmount` when the server set one, else `totalAmount`.
    #[must_use]
    pub fn payable(&self) -> Decimal {
        if self.final_amount.is_zero() {
            self.total_amount
        } else {
            self.final_amount
        }
    }

    /// Line for a product, if present.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|i| &i.product_id == product_id)
    }
}

/// One saved wishlist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

/// The server's view of the shopper's wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistSnapshot {
    #[serde(default)]
    pub items: Vec<WishlistItem>,
}

impl WishlistSnapshot {
    /// Whether a product is saved.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|i| &i.product_id == product_id)
    }
}

/// Payload of `POST /move-to-cart/:productId`.
#[derive(Debug, Clone, Deserialize)]
pub struct MovedToCart {
    pub wishlist: WishlistSnapshot,
    pub cart: CartSnapshot,
}

// =============================================================================
// Orders
// =============================================================================

/// Shipping (and billing) address captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub country: String,
}

impl ShippingAddress {
    /// Country used when the shopper leaves it blank.
    pub const DEFAULT_COUNTRY: &'static str = "Philippines";
}

impl Default for ShippingAddress {
    fn default() -> Self {
        Self {
            street: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: Self::DEFAULT_COUNTRY.to_string(),
        }
    }
}

impl From<&Address> for ShippingAddress {
    fn from(address: &Address) -> Self {
        Self {
            street: address.street.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            zip_code: address.zip_code.clone(),
            country: if address.country.trim().is_empty() {
                Self::DEFAULT_COUNTRY.to_string()
            } else {
                address.country.clone()
            },
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub order_number: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of order creation (`POST /`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub billing_address: ShippingAddress,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    pub payment_method: String,
}

/// Body of `PUT /:id/status` (admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: OrderStatus,
    pub tracking_number: String,
    pub note: String,
}
