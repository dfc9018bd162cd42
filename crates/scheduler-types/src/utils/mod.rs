//! Utility functions for common conversions and formatting.
//!
//! This module provides helpers for hex prefix handling, canonical hex
//! rendering of quantities and human-readable number formatting.

pub mod formatting;
pub mod helpers;

pub use formatting::{format_with_commas, to_hex_quantity, without_0x_prefix};
pub use helpers::current_timestamp;
