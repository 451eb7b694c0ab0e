//! Atelier Core - Shared types library.
//!
//! This crate provides the value types shared by the storefront services and
//! their tests:
//! - type-safe record identifiers
//! - non-negative decimal prices
//! - order status and catalog sort keys
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no gateway access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs and prices, plus status/sort enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
