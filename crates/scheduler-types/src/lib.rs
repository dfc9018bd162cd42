//! Common types module for the transaction scheduler.
//!
//! This module defines the core data types and the pure validation routines
//! used throughout the scheduler: release conditions, user-typed quantities,
//! address classification, raw transaction payloads and the JSON-RPC shapes
//! exchanged with the remote scheduler and the signing node.

/// Address validation and checksum derivation.
pub mod address;
/// JSON-RPC envelope types and scheduling outcomes.
pub mod api;
/// Release condition types (time or block).
pub mod condition;
/// Raw transaction and data payload validation.
pub mod payload;
/// User-typed numeric quantities.
pub mod quantity;
/// Registry trait for pluggable implementations.
pub mod registry;
/// Canonical transaction and signer response types.
pub mod transaction;
/// Utility functions for hex strings and display formatting.
pub mod utils;
/// Configuration validation types for implementation tables.
pub mod validation;

// Re-export all types for convenient access
pub use address::{account_label, classify_address, to_checksum_address, AddressCheck, AddressWarning};
pub use api::*;
pub use condition::{BlockCondition, Condition, TimeCondition};
pub use payload::{is_valid_data, is_valid_raw_tx, PayloadError, RawTransaction};
pub use quantity::{EtherUnit, Quantity};
pub use registry::ImplementationRegistry;
pub use transaction::{CanonicalTransaction, SignedTransaction};
pub use utils::{current_timestamp, format_with_commas, to_hex_quantity, without_0x_prefix};
pub use validation::*;

/// Re-exports of the primitive Ethereum types used across the workspace.
pub use alloy_primitives::{Address, U256};
