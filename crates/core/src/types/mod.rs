//! Core types for RocketShoes.
//!
//! This module provides type-safe wrappers for catalog and cart concepts.

pub mod cart;
pub mod id;
pub mod product;

pub use cart::{Cart, CartIntegrityError, LineItem};
pub use id::*;
pub use product::{Product, StockRecord};
