//! Wallet backed by a private key held in process memory.
//!
//! Signs without prompting anyone. Useful against local development chains
//! and for unattended runs where the key is supplied through the environment.

use crate::{WalletError, WalletInterface};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use permit_types::{
	Address, Bytes, ConfigSchema, Field, FieldType, PermitTypedData, Schema, SecretString,
	ValidationError,
};

/// Local wallet implementation using Alloy's signer.
#[derive(Debug)]
pub struct LocalWallet {
	signer: PrivateKeySigner,
	chain_id: u64,
}

impl LocalWallet {
	/// Creates a wallet from a hex-encoded private key (with or without 0x prefix).
	pub fn new(private_key: &SecretString, chain_id: u64) -> Result<Self, WalletError> {
		let signer = private_key
			.with_exposed(|key| key.parse::<PrivateKeySigner>())
			.map_err(|e| WalletError::InvalidKey(format!("Invalid private key: {}", e)))?;

		Ok(Self { signer, chain_id })
	}
}

/// Configuration schema for LocalWallet.
pub struct LocalWalletSchema;

impl LocalWalletSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		Self.validate(config)
	}
}

impl ConfigSchema for LocalWalletSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("private_key", FieldType::String).with_validator(|value| {
					let key = value.as_str().unwrap_or_default();
					let key = key.strip_prefix("0x").unwrap_or(key);

					if key.len() != 64 {
						return Err("Private key must be 64 hex characters (32 bytes)".to_string());
					}
					if hex::decode(key).is_err() {
						return Err("Private key must be valid hexadecimal".to_string());
					}
					Ok(())
				}),
				Field::new(
					"chain_id",
					FieldType::Integer {
						min: Some(1),
						max: None,
					},
				),
			],
			vec![],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl WalletInterface for LocalWallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalWalletSchema)
	}

	async fn connect(&self) -> Result<Address, WalletError> {
		Ok(self.signer.address())
	}

	async fn chain_id(&self) -> Result<u64, WalletError> {
		Ok(self.chain_id)
	}

	async fn sign_typed_data(
		&self,
		signer: Address,
		typed_data: &PermitTypedData,
	) -> Result<Bytes, WalletError> {
		if signer != self.signer.address() {
			return Err(WalletError::SigningFailed(format!(
				"Wallet does not hold the key for {}",
				signer
			)));
		}

		let digest = typed_data
			.signing_hash()
			.map_err(|e| WalletError::SigningFailed(e.to_string()))?;

		let signature = self
			.signer
			.sign_hash(&digest)
			.await
			.map_err(|e| WalletError::SigningFailed(format!("Failed to sign typed data: {}", e)))?;

		Ok(Bytes::from(signature.as_bytes().to_vec()))
	}
}

/// Factory function to create a local wallet from configuration.
///
/// Requires `private_key` and `chain_id` keys in the table.
pub fn create_wallet(config: &toml::Value) -> Result<Box<dyn WalletInterface>, WalletError> {
	LocalWalletSchema::validate_config(config)
		.map_err(|e| WalletError::InvalidConfig(e.to_string()))?;

	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.map(SecretString::from)
		.ok_or_else(|| WalletError::InvalidConfig("private_key is required".to_string()))?;
	let chain_id = config
		.get("chain_id")
		.and_then(|v| v.as_integer())
		.and_then(|id| u64::try_from(id).ok())
		.ok_or_else(|| WalletError::InvalidConfig("chain_id is required".to_string()))?;

	Ok(Box::new(LocalWallet::new(&private_key, chain_id)?))
}

/// Registry for the local wallet implementation.
pub struct Registry;

impl permit_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = crate::WalletFactory;

	fn factory() -> Self::Factory {
		create_wallet
	}
}

impl crate::WalletRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, PrimitiveSignature};
	use permit_types::{PermitDomain, PermitMessage, SignatureComponents, U256};

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn config(key: &str, chain_id: i64) -> toml::Value {
		let mut table = toml::Table::new();
		table.insert("private_key".to_string(), key.into());
		table.insert("chain_id".to_string(), chain_id.into());
		toml::Value::Table(table)
	}

	fn typed_data(owner: Address) -> PermitTypedData {
		PermitTypedData::new(
			PermitDomain::new(
				"Test Token".to_string(),
				31337,
				address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
			),
			PermitMessage {
				owner,
				spender: address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
				value: U256::from(10u64).pow(U256::from(18u64)),
				nonce: U256::ZERO,
				deadline: 1_900_000_000,
			},
		)
	}

	#[tokio::test]
	async fn test_connect_returns_key_address() {
		let wallet = create_wallet(&config(KEY, 31337)).unwrap();

		assert_eq!(
			wallet.connect().await.unwrap(),
			address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
		);
		assert_eq!(wallet.chain_id().await.unwrap(), 31337);
	}

	#[tokio::test]
	async fn test_signature_recovers_to_owner() {
		let wallet = create_wallet(&config(KEY, 31337)).unwrap();
		let owner = wallet.connect().await.unwrap();
		let typed = typed_data(owner);

		let raw = wallet.sign_typed_data(owner, &typed).await.unwrap();
		assert_eq!(raw.len(), 65);

		let components = SignatureComponents::from_bytes(&raw).unwrap();
		assert!(components.v == 27 || components.v == 28);

		let signature = PrimitiveSignature::try_from(raw.as_ref()).unwrap();
		let recovered = signature
			.recover_address_from_prehash(&typed.signing_hash().unwrap())
			.unwrap();
		assert_eq!(recovered, owner);
	}

	#[tokio::test]
	async fn test_rejects_foreign_signer() {
		let wallet = create_wallet(&config(KEY, 31337)).unwrap();
		let other = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

		let result = wallet.sign_typed_data(other, &typed_data(other)).await;
		assert!(matches!(result, Err(WalletError::SigningFailed(_))));
	}

	#[test]
	fn test_schema_rejects_bad_keys() {
		assert!(LocalWalletSchema::validate_config(&config("0x1234", 1)).is_err());
		assert!(LocalWalletSchema::validate_config(&config(&"zz".repeat(32), 1)).is_err());
		assert!(LocalWalletSchema::validate_config(&config(KEY, 0)).is_err());
		assert!(LocalWalletSchema::validate_config(&config(&KEY[2..], 1)).is_ok());
	}

	#[test]
	fn test_missing_chain_id() {
		let mut table = toml::Table::new();
		table.insert("private_key".to_string(), KEY.into());

		let result = create_wallet(&toml::Value::Table(table));
		assert!(matches!(result, Err(WalletError::InvalidConfig(_))));
	}
}
