//! RocketShoes Core - Shared cart types.
//!
//! This crate provides the types shared by every RocketShoes component:
//! - `storefront` - Cart service and JSON API
//! - `cli` - Terminal cart client
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O,
//! no storage, no HTTP clients. Every [`Cart`] mutation works on an owned
//! value, which lets callers validate and persist a new snapshot before
//! anyone observes it.
//!
//! # Modules
//!
//! - [`types`] - Product ids, catalog records, line items and carts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
