//! Atelier Storefront library.
//!
//! Catalog, cart, order and wishlist services over a hosted record gateway
//! (a generic CRUD API over named tables). Construct a [`Storefront`] from
//! configuration, or build individual services over any [`RecordGateway`].
//!
//! # Modules
//!
//! - [`gateway`] - Record gateway contract plus HTTP and in-memory implementations
//! - [`mapper`] - Conversions between gateway records and domain models
//! - [`query`] - Listing criteria and client-side refinement
//! - [`services`] - Products, cart, orders, payments, wishlist
//! - [`state`] - The [`Storefront`] bundle

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod gateway;
pub mod mapper;
pub mod models;
pub mod query;
pub mod services;
pub mod state;

pub use error::{Result, ServiceError};
pub use gateway::RecordGateway;
pub use state::Storefront;
