//! Command implementations, one module per area.

pub mod admin;
pub mod orders;
pub mod profile;
pub mod session;
pub mod shop;
