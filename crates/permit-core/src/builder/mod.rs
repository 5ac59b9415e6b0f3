//! Builds the engine and wallet service from configuration.
//!
//! Implementations are looked up by name in the supplied factory maps, so the
//! binary decides which backends exist and tests can inject their own.

use crate::{PermitEngine, PermitError};
use permit_account::{WalletError, WalletInterface, WalletService};
use permit_config::Config;
use permit_token::{TokenError, TokenInterface};
use std::collections::HashMap;

/// Factory functions the builder draws implementations from.
pub struct PermitFactories<WF, TF> {
	pub wallet_factories: HashMap<String, WF>,
	pub token_factory: TF,
}

/// Builder for a ready-to-run engine and its wallet.
pub struct PermitBuilder {
	config: Config,
}

impl PermitBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Creates the primary wallet and the token reader.
	pub fn build<WF, TF>(
		self,
		factories: PermitFactories<WF, TF>,
	) -> Result<(PermitEngine, WalletService), PermitError>
	where
		WF: Fn(&toml::Value) -> Result<Box<dyn WalletInterface>, WalletError>,
		TF: Fn(&str) -> Result<Box<dyn TokenInterface>, TokenError>,
	{
		let primary = self.config.wallet.primary.as_str();
		let wallet_config = self.config.wallet_implementation()?;

		let factory = factories.wallet_factories.get(primary).ok_or_else(|| {
			PermitError::Config(format!("Unknown wallet implementation '{}'", primary))
		})?;

		let wallet = factory(wallet_config).map_err(|e| {
			tracing::error!(
				component = "wallet",
				implementation = %primary,
				error = %e,
				"Failed to create wallet implementation"
			);
			PermitError::from(e)
		})?;
		tracing::info!(component = "wallet", implementation = %primary, "Loaded");

		let rpc_url = self.config.token_rpc_url().ok_or_else(|| {
			PermitError::Config("No RPC endpoint configured for token calls".to_string())
		})?;
		let token_reader = (factories.token_factory)(rpc_url)?;
		tracing::info!(component = "token", token = %self.config.token.address, "Loaded");

		let mut engine =
			PermitEngine::new(token_reader).with_signing_timeout(self.config.signing_timeout());

		// Token calls going through the wallet's own endpoint cannot disagree on the chain.
		if self.config.token.rpc_url.is_none() {
			engine = engine.without_network_check();
		}

		Ok((engine, WalletService::new(wallet)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use permit_account::{get_all_implementations, WalletFactory};
	use permit_token::MockTokenInterface;

	const LOCAL_CONFIG: &str = r#"
[token]
address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
rpc_url = "http://127.0.0.1:8545"

[permit]
spender = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"

[wallet]
primary = "local"

[wallet.implementations.local]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
chain_id = 31337
"#;

	fn wallet_factories() -> HashMap<String, WalletFactory> {
		get_all_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect()
	}

	fn mock_token_factory(url: &str) -> Result<Box<dyn TokenInterface>, TokenError> {
		assert_eq!(url, "http://127.0.0.1:8545");
		Ok(Box::new(MockTokenInterface::new()))
	}

	#[tokio::test]
	async fn test_builds_local_wallet() {
		let config: Config = LOCAL_CONFIG.parse().unwrap();

		let (_engine, wallet) = PermitBuilder::new(config)
			.build(PermitFactories {
				wallet_factories: wallet_factories(),
				token_factory: mock_token_factory,
			})
			.unwrap();

		let session = wallet.connect().await.unwrap();
		assert_eq!(
			session.address().to_string(),
			"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
		);
	}

	#[test]
	fn test_unregistered_wallet_is_config_error() {
		let config: Config = LOCAL_CONFIG.parse().unwrap();

		let result = PermitBuilder::new(config).build(PermitFactories {
			wallet_factories: HashMap::<String, WalletFactory>::new(),
			token_factory: mock_token_factory,
		});

		assert!(matches!(result, Err(PermitError::Config(_))));
	}

	#[test]
	fn test_invalid_wallet_table_is_config_error() {
		let content = LOCAL_CONFIG.replace("chain_id = 31337", "chain_id = 0");
		let config: Config = content.parse().unwrap();

		let result = PermitBuilder::new(config).build(PermitFactories {
			wallet_factories: wallet_factories(),
			token_factory: mock_token_factory,
		});

		assert!(matches!(result, Err(PermitError::Config(_))));
	}
}
