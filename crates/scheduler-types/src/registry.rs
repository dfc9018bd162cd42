//! Registry trait for pluggable implementations.
//!
//! Wallets, signers and scheduling transports are selected by name from the
//! configuration file. Each implementation module exposes a `Registry` type
//! that ties that name to the factory building it.

/// Ties a configuration name to an implementation factory.
pub trait ImplementationRegistry {
	/// Name under which the implementation appears in configuration, for
	/// example `"node"` in `[account.implementations.node]`.
	const NAME: &'static str;

	/// Factory function type of the owning interface.
	type Factory;

	/// Returns the factory for this implementation.
	fn factory() -> Self::Factory;
}
