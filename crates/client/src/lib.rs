//! Shopwire storefront client.
//!
//! Keeps a local copy of server-authoritative storefront state in step with
//! four REST services (auth, products, cart/wishlist, orders):
//!
//! - [`remote`] - Uniform request wrapper: bearer auth, JSON envelope, 401 detection
//! - [`session`] - Signed-in identity and its durable snapshot
//! - [`catalog`] - Product list cache with pure filter/search/sort views
//! - [`mirror`] - Cart and wishlist mirrors, replaced wholesale after every call
//! - [`checkout`] - Advisory totals and order placement
//! - [`orders`], [`account`], [`admin`] - The remaining service operations
//! - [`timers`] - Replaceable fixed-interval tasks for the home page
//! - [`state`] - The [`Storefront`] context that owns and wires all of the above
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! let storefront = Storefront::new(config)?;
//! storefront.start().await;
//!
//! let products = storefront.catalog().ensure_loaded().await?;
//! storefront.cart().add(&products.products()[0].id, 1).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod admin;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod mirror;
pub mod orders;
pub mod remote;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod timers;

pub use config::{ClientConfig, ConfigError, ServiceEndpoints};
pub use error::{ClientError, Result};
pub use state::Storefront;
