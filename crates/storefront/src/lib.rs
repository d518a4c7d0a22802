//! RocketShoes storefront library.
//!
//! The cart store and everything around it: catalog and stock lookups,
//! persistent storage, shopper notifications and the JSON cart API. The
//! `rocketshoes-storefront` binary and `rs-cli` are thin shells over this
//! crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod routes;
pub mod state;
pub mod storage;
