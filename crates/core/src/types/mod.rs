//! Core types for the Atelier storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod sort;
pub mod status;

pub use id::*;
pub use price::{Price, saturating_total, saturating_units};
pub use sort::SortKey;
pub use status::*;
