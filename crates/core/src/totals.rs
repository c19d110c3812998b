//! Checkout totals.
//!
//! The orders service repeats this computation when an order is created.
//! Keep the constants here in step with it: the client total is advisory and
//! a difference is reported to the shopper before they rely on it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Value-added tax rate applied to the cart subtotal (12%).
pub const TAX_RATE: Decimal = Decimal::from_parts(12, 0, 0, false, 2);

/// Flat shipping fee added to every order.
pub const SHIPPING_FEE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Derived figures shown on the checkout summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_fee: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl CheckoutTotals {
    /// Compute totals for a cart subtotal and the discount already applied to it.
    ///
    /// `total = subtotal + subtotal * 12% + 50 - discount`
    ///
    /// ```
    /// use rust_decimal::Decimal;
    /// use shopwire_core::CheckoutTotals;
    ///
    /// let totals = CheckoutTotals::compute(Decimal::from(1000), Decimal::from(100));
    /// assert_eq!(totals.tax, Decimal::from(120));
    /// assert_eq!(totals.total, Decimal::from(1070));
    /// ```
    #[must_use]
    pub fn compute(subtotal: Decimal, discount: Decimal) -> Self {
        let tax = subtotal * TAX_RATE;
        Self {
            subtotal,
            tax,
            shipping_fee: SHIPPING_FEE,
            discount,
            total: subtotal + tax + SHIPPING_FEE - discount,
        }
    }

    /// Difference between an authoritative total and this advisory one.
    ///
    /// Returns `None` when they agree to the centavo.
    #[must_use]
    pub fn mismatch(&self, authoritative: Decimal) -> Option<Decimal> {
        let delta = (authoritative - self.total).round_dp(2);
        (!delta.is_zero()).then_some(delta)
    }
}
