//! Wallet reached over the EIP-1193 JSON-RPC methods.
//!
//! Talks to any endpoint that forwards `eth_requestAccounts`, `eth_chainId`
//! and `eth_signTypedData_v4` to a user-controlled signer, such as a browser
//! wallet bridge or a desktop wallet exposing an RPC port. Approval prompts
//! happen on the wallet side; this backend only waits for the answer.

use crate::{WalletError, WalletInterface};
use alloy_provider::{Provider, RootProvider};
use alloy_transport::{RpcError, TransportError};
use alloy_transport_http::Http;
use async_trait::async_trait;
use permit_types::{
	Address, Bytes, ConfigSchema, Field, FieldType, PermitTypedData, Schema, SignatureError,
};

/// The user rejected the request.
const USER_REJECTED: i64 = 4001;
/// The requested account or method has not been authorized.
const UNAUTHORIZED: i64 = 4100;
/// The wallet is not connected to any chain.
const DISCONNECTED: i64 = 4900;
/// The wallet is not connected to the requested chain.
const CHAIN_DISCONNECTED: i64 = 4901;

/// Wallet implementation forwarding requests to a JSON-RPC endpoint.
pub struct RpcWallet {
	provider: RootProvider<Http<reqwest::Client>>,
}

impl RpcWallet {
	pub fn new(url: &str) -> Result<Self, WalletError> {
		let url = url
			.parse::<reqwest::Url>()
			.map_err(|e| WalletError::InvalidConfig(format!("Invalid wallet url {}: {}", url, e)))?;

		Ok(Self {
			provider: RootProvider::new_http(url),
		})
	}
}

/// Maps a transport failure onto the wallet error taxonomy.
///
/// Error codes follow EIP-1193; anything unrecognized is handed to `fallback`.
fn classify(error: TransportError, fallback: fn(String) -> WalletError) -> WalletError {
	if let Some(payload) = error.as_error_resp() {
		return match payload.code {
			USER_REJECTED | UNAUTHORIZED => WalletError::Rejected(payload.message.to_string()),
			DISCONNECTED | CHAIN_DISCONNECTED => {
				WalletError::Unavailable(payload.message.to_string())
			},
			_ => fallback(error.to_string()),
		};
	}

	match error {
		RpcError::Transport(kind) => WalletError::Unavailable(kind.to_string()),
		other => fallback(other.to_string()),
	}
}

/// Maps a failed `eth_signTypedData_v4` call.
///
/// A response that does not decode as bytes is a bad signature, not a
/// transport problem.
fn classify_signing(error: TransportError) -> WalletError {
	match error {
		RpcError::DeserError { err, text } => WalletError::InvalidSignature(
			SignatureError::Malformed(format!("{} in response {}", err, text)),
		),
		other => classify(other, WalletError::SigningFailed),
	}
}

/// Configuration schema for RpcWallet.
pub struct RpcWalletSchema;

impl ConfigSchema for RpcWalletSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), permit_types::ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("url", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
							Ok(())
						},
						_ => Err("url must be an http(s) endpoint".to_string()),
					}
				}),
			],
			vec![],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl WalletInterface for RpcWallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(RpcWalletSchema)
	}

	async fn connect(&self) -> Result<Address, WalletError> {
		let accounts: Vec<Address> = self
			.provider
			.raw_request("eth_requestAccounts".into(), ())
			.await
			.map_err(|e| classify(e, WalletError::Unavailable))?;

		accounts
			.first()
			.copied()
			.ok_or_else(|| WalletError::Unavailable("Wallet exposed no accounts".to_string()))
	}

	async fn chain_id(&self) -> Result<u64, WalletError> {
		self.provider
			.get_chain_id()
			.await
			.map_err(|e| classify(e, WalletError::ChainId))
	}

	async fn sign_typed_data(
		&self,
		signer: Address,
		typed_data: &PermitTypedData,
	) -> Result<Bytes, WalletError> {
		let payload = typed_data
			.to_json()
			.map_err(|e| WalletError::SigningFailed(e.to_string()))?;

		tracing::debug!(%signer, "Sending eth_signTypedData_v4");

		self.provider
			.raw_request("eth_signTypedData_v4".into(), (signer, payload))
			.await
			.map_err(classify_signing)
	}
}

/// Factory function to create an RPC wallet from configuration.
///
/// Requires a `url` key in the table.
pub fn create_wallet(config: &toml::Value) -> Result<Box<dyn WalletInterface>, WalletError> {
	RpcWalletSchema
		.validate(config)
		.map_err(|e| WalletError::InvalidConfig(e.to_string()))?;

	let url = config
		.get("url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| WalletError::InvalidConfig("url is required".to_string()))?;

	Ok(Box::new(RpcWallet::new(url)?))
}

/// Registry for the RPC wallet implementation.
pub struct Registry;

impl permit_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "rpc";
	type Factory = crate::WalletFactory;

	fn factory() -> Self::Factory {
		create_wallet
	}
}

impl crate::WalletRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_json_rpc::ErrorPayload;
	use alloy_transport::TransportErrorKind;

	fn config(url: &str) -> toml::Value {
		let mut table = toml::Table::new();
		table.insert("url".to_string(), url.into());
		toml::Value::Table(table)
	}

	fn error_response(code: i64, message: &str) -> TransportError {
		let payload: ErrorPayload = serde_json::from_value(serde_json::json!({
			"code": code,
			"message": message,
		}))
		.unwrap();
		RpcError::ErrorResp(payload)
	}

	#[test]
	fn test_user_rejection_codes() {
		let err = classify(
			error_response(4001, "User rejected the request."),
			WalletError::SigningFailed,
		);
		assert!(matches!(err, WalletError::Rejected(m) if m == "User rejected the request."));

		let err = classify(error_response(4100, "Unauthorized"), WalletError::Unavailable);
		assert!(matches!(err, WalletError::Rejected(_)));
	}

	#[test]
	fn test_disconnected_codes() {
		let err = classify(error_response(4900, "Disconnected"), WalletError::SigningFailed);
		assert!(matches!(err, WalletError::Unavailable(_)));
	}

	#[test]
	fn test_other_errors_use_fallback() {
		let err = classify(error_response(-32603, "Internal error"), WalletError::SigningFailed);
		assert!(matches!(err, WalletError::SigningFailed(_)));

		let err = classify(
			TransportErrorKind::custom_str("connection refused"),
			WalletError::SigningFailed,
		);
		assert!(matches!(err, WalletError::Unavailable(_)));
	}

	#[test]
	fn test_undecodable_signature_response() {
		let text = "\"0xnot-hex\"".to_string();
		let err = serde_json::from_str::<Bytes>(&text).unwrap_err();

		let err = classify_signing(RpcError::DeserError { err, text });
		assert!(matches!(
			err,
			WalletError::InvalidSignature(SignatureError::Malformed(msg)) if msg.contains("0xnot-hex")
		));

		let err = classify_signing(error_response(4001, "User rejected the request."));
		assert!(matches!(err, WalletError::Rejected(_)));
		let err = classify_signing(error_response(-32603, "Internal error"));
		assert!(matches!(err, WalletError::SigningFailed(_)));
	}

	#[test]
	fn test_schema_requires_http_url() {
		assert!(create_wallet(&config("http://127.0.0.1:1248")).is_ok());
		assert!(matches!(
			create_wallet(&config("ws://127.0.0.1:1248")),
			Err(WalletError::InvalidConfig(_))
		));
		assert!(matches!(
			create_wallet(&toml::Value::Table(toml::Table::new())),
			Err(WalletError::InvalidConfig(_))
		));
	}

	#[tokio::test]
	async fn test_unreachable_wallet_is_unavailable() {
		let wallet = create_wallet(&config("http://127.0.0.1:1")).unwrap();

		let result = wallet.connect().await;
		assert!(matches!(result, Err(WalletError::Unavailable(_))));
	}
}
