//! Checkout: advisory totals and order placement.
//!
//! Totals are computed locally with the shared formula from `shopwire-core`.
//! The orders service recomputes them; its figure on the created order is the
//! one that counts, and any difference is reported back to the caller.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use shopwire_core::CheckoutTotals;

use crate::catalog::Catalog;
use crate::error::{ClientError, Result, add_breadcrumb};
use crate::mirror::{Cart, Mirror};
use crate::remote::types::{CartSnapshot, Order, OrderRequest, ShippingAddress};
use crate::remote::{Gateway, Service};
use crate::session::SessionStore;

/// Advisory totals for a cart snapshot.
#[must_use]
pub fn totals_for(cart: &CartSnapshot) -> CheckoutTotals {
    CheckoutTotals::compute(cart.total_amount, cart.discount)
}

/// What the checkout page shows before the order is placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPreview {
    pub cart: Arc<CartSnapshot>,
    pub totals: CheckoutTotals,
    /// Prefilled from the user's default address.
    pub address: ShippingAddress,
}

/// A created order together with what the client expected it to cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order: Order,
    pub totals: CheckoutTotals,
    /// `order.total_amount - totals.total`, when they differ.
    pub mismatch: Option<Decimal>,
}

/// Checkout bound to the shopper's session and cart mirror.
pub struct Checkout<'a> {
    gateway: &'a Gateway,
    session: &'a SessionStore,
    catalog: &'a Catalog,
    mirror: &'a Mirror,
}

impl<'a> Checkout<'a> {
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

    /// Totals for the mirrored cart and the prefilled shipping address.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when signed out.
    pub fn preview(&self) -> Result<CheckoutPreview> {
        self.session.require()?;
        let cart = self.mirror.cart().unwrap_or_default();
        let address = self
            .session
            .default_address()
            .map(|a| ShippingAddress::from(&a))
            .unwrap_or_default();

        Ok(CheckoutPreview {
            totals: totals_for(&cart),
            cart,
            address,
        })
    }

    /// Place an order for the mirrored cart.
    ///
    /// Everything is validated before any request is sent. On success the
    /// cart mirror and badge are reloaded; a failed reload is logged and does
    /// not fail the order.
    ///
    /// # Errors
    ///
    /// - `Validation` when signed out, for a blank street, city, state or zip
    ///   code, an empty cart, or an empty payment method
    /// - otherwise whatever the orders service reports
    #[instrument(skip(self, address), fields(payment_method = %payment_method))]
    pub async fn place_order(
        &self,
        address: &ShippingAddress,
        payment_method: &str,
    ) -> Result<PlacedOrder> {
        self.session.require()?;

        let required = [
            &address.street,
            &address.city,
            &address.state,
            &address.zip_code,
        ];
        if required.iter().any(|f| f.trim().is_empty()) {
            return Err(ClientError::validation(
                "Please fill in all shipping address fields",
            ));
        }

        let cart = self
            .mirror
            .cart()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ClientError::validation("Your cart is empty"))?;

        let payment_method = payment_method.trim();
        if payment_method.is_empty() {
            return Err(ClientError::validation("Please select a payment method"));
        }

        let mut shipping = address.clone();
        if shipping.country.trim().is_empty() {
            shipping.country = ShippingAddress::DEFAULT_COUNTRY.to_string();
        }

        let totals = totals_for(&cart);
        let request = OrderRequest {
            items: cart.items.clone(),
            billing_address: shipping.clone(),
            shipping_address: shipping,
            subtotal: totals.subtotal,
            tax: totals.tax,
            shipping_fee: totals.shipping_fee,
            discount: totals.discount,
            payment_method: payment_method.to_string(),
        };

        let order = self
            .gateway
            .post::<Order, _>(self.gateway.url(Service::Orders, &[]), &request)
            .await?
            .into_data()?;

        add_breadcrumb(
            "checkout",
            "Order placed",
            Some(&[("order_number", order.order_number.as_str())]),
        );
        info!(order_id = %order.id, order_number = %order.order_number, "Order placed");

        let mismatch = totals.mismatch(order.total_amount);
        if let Some(delta) = mismatch {
            warn!(
                order_id = %order.id,
                advisory = %totals.total,
                charged = %order.total_amount,
                delta = %delta,
                "Order total differs from checkout estimate"
            );
        }

        let cart_ops = Cart::new(self.gateway, self.session, self.catalog, self.mirror);
        if let Err(e) = cart_ops.load().await {
            warn!(error = %e, "Failed to reload cart after order");
        }
        if let Err(e) = cart_ops.refresh_count().await {
            warn!(error = %e, "Failed to refresh cart badge after order");
        }

        Ok(PlacedOrder {
            order,
            totals,
            mismatch,
        })
    }
}
