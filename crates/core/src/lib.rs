//! Shopwire Core - Shared types library.
//!
//! This crate provides the types and pure functions shared by every Shopwire
//! component:
//! - `client` - Remote gateway, session, catalog and cart/wishlist mirrors
//! - `cli` - Command-line storefront front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no caches. This keeps the checkout formula in one place so every
//! consumer computes totals the same way the orders service does.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, money, roles and statuses
//! - [`totals`] - Checkout totals (tax, shipping, discount)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod totals;
pub mod types;

pub use totals::CheckoutTotals;
pub use types::*;
