//! Wallet management for the permit signer.
//!
//! A wallet is the external party that owns the signing key: it reveals the
//! signer address when connected, reports the chain it signs for, and asks
//! its user to approve a typed-data signature. Backends implement
//! [`WalletInterface`] and are selected by name from configuration.
//!
//! The connected wallet is represented by a [`WalletSession`] that is passed
//! explicitly to every step needing it and closed with
//! [`WalletSession::disconnect`] when the run ends.

use async_trait::async_trait;
use permit_types::{
	short_hex, Address, Bytes, ConfigSchema, ImplementationRegistry, PermitTypedData,
	SignatureError,
};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
	pub mod rpc;
}

/// Errors that can occur during wallet operations.
#[derive(Debug, Error)]
pub enum WalletError {
	/// No wallet could be reached, or it exposes no account.
	#[error("Wallet unavailable: {0}")]
	Unavailable(String),
	/// The user declined the connection or the signature.
	#[error("Request rejected by user: {0}")]
	Rejected(String),
	/// The chain id could not be determined.
	#[error("Chain id lookup failed: {0}")]
	ChainId(String),
	/// The wallet failed to produce a signature.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// The wallet answered the signature request with undecodable data.
	#[error("Invalid signature: {0}")]
	InvalidSignature(SignatureError),
	/// A cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// The backend configuration is invalid.
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),
	/// Unknown wallet implementation name.
	#[error("Unknown wallet implementation: {0}")]
	UnknownImplementation(String),
}

/// Trait defining the interface for wallet backends.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait WalletInterface: Send + Sync {
	/// Returns the configuration schema for this wallet implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Connects to the wallet and returns the signer address.
	///
	/// May prompt the user for approval.
	async fn connect(&self) -> Result<Address, WalletError>;

	/// Returns the chain id the wallet signs for.
	async fn chain_id(&self) -> Result<u64, WalletError>;

	/// Requests an EIP-712 signature from `signer` over `typed_data`.
	///
	/// Returns the raw 65-byte `r || s || v` signature. This suspends until
	/// the user approves or rejects.
	async fn sign_typed_data(
		&self,
		signer: Address,
		typed_data: &PermitTypedData,
	) -> Result<Bytes, WalletError>;

	/// Releases any connection state held by the backend.
	async fn disconnect(&self) -> Result<(), WalletError> {
		Ok(())
	}
}

/// Type alias for wallet factory functions.
pub type WalletFactory = fn(&toml::Value) -> Result<Box<dyn WalletInterface>, WalletError>;

/// Registry trait for wallet implementations.
pub trait WalletRegistry: ImplementationRegistry<Factory = WalletFactory> {}

/// Get all registered wallet implementations.
pub fn get_all_implementations() -> Vec<(&'static str, WalletFactory)> {
	use implementations::{local, rpc};

	vec![
		(local::Registry::NAME, local::Registry::factory()),
		(rpc::Registry::NAME, rpc::Registry::factory()),
	]
}

/// Builds the named wallet implementation from its configuration table.
pub fn create_wallet(
	name: &str,
	config: &toml::Value,
) -> Result<Box<dyn WalletInterface>, WalletError> {
	let (_, factory) = get_all_implementations()
		.into_iter()
		.find(|(registered, _)| *registered == name)
		.ok_or_else(|| WalletError::UnknownImplementation(name.to_string()))?;

	factory(config)
}

/// Service that owns a wallet backend until it is connected.
pub struct WalletService {
	implementation: Box<dyn WalletInterface>,
}

impl WalletService {
	pub fn new(implementation: Box<dyn WalletInterface>) -> Self {
		Self { implementation }
	}

	/// Connects to the wallet and opens a session for the returned signer.
	pub async fn connect(self) -> Result<WalletSession, WalletError> {
		let address = self.implementation.connect().await?;
		tracing::info!(signer = %address, "Connected wallet");

		Ok(WalletSession {
			implementation: self.implementation,
			address,
		})
	}
}

/// A connected wallet and its signer identity.
pub struct WalletSession {
	implementation: Box<dyn WalletInterface>,
	address: Address,
}

impl WalletSession {
	/// Checksummed signer address.
	pub fn address(&self) -> Address {
		self.address
	}

	/// Returns the chain id the wallet signs for.
	pub async fn chain_id(&self) -> Result<u64, WalletError> {
		self.implementation.chain_id().await
	}

	/// Requests a signature from the session's signer.
	pub async fn sign_typed_data(&self, typed_data: &PermitTypedData) -> Result<Bytes, WalletError> {
		tracing::debug!(
			signer = %short_hex(&self.address.to_string()),
			"Requesting typed data signature"
		);
		self.implementation
			.sign_typed_data(self.address, typed_data)
			.await
	}

	/// Ends the session.
	pub async fn disconnect(self) -> Result<(), WalletError> {
		self.implementation.disconnect().await?;
		tracing::debug!(signer = %self.address, "Disconnected wallet");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_registered_names() {
		let names: Vec<&str> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert_eq!(names, vec!["local", "rpc"]);
	}

	#[test]
	fn test_unknown_implementation() {
		let result = create_wallet("ledger", &toml::Value::Table(toml::Table::new()));
		assert!(matches!(result, Err(WalletError::UnknownImplementation(name)) if name == "ledger"));
	}

	#[tokio::test]
	async fn test_session_lifecycle_with_local_wallet() {
		let config: toml::Table = toml::from_str(
			r#"
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
chain_id = 31337
"#,
		)
		.unwrap();
		let config = toml::Value::Table(config);
		let wallet = create_wallet("local", &config).unwrap();
		assert!(wallet.config_schema().validate(&config).is_ok());

		let session = WalletService::new(wallet).connect().await.unwrap();
		assert_eq!(
			session.address().to_string(),
			"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
		);
		assert_eq!(session.chain_id().await.unwrap(), 31337);
		session.disconnect().await.unwrap();
	}
}
