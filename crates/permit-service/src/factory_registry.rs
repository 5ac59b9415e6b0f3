//! Registry of the implementations compiled into the binary.

use permit_account::WalletFactory;
use permit_core::PermitFactories;
use permit_token::{implementations::evm::alloy::create_token_reader, TokenFactory};
use std::collections::HashMap;

/// Collects every wallet backend plus the Alloy token reader.
pub fn build_factories() -> PermitFactories<WalletFactory, TokenFactory> {
	let mut wallet_factories = HashMap::new();
	for (name, factory) in permit_account::get_all_implementations() {
		tracing::debug!(implementation = name, "Registered wallet");
		wallet_factories.insert(name.to_string(), factory);
	}

	PermitFactories {
		wallet_factories,
		token_factory: create_token_reader,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_all_wallets_registered() {
		let factories = build_factories();

		assert!(factories.wallet_factories.contains_key("local"));
		assert!(factories.wallet_factories.contains_key("rpc"));
	}
}
