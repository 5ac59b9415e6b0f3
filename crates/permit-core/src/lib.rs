//! Core permit signing pipeline.
//!
//! Ties the wallet and the token reader together into the one-shot flow:
//! connect, read `name()` and `nonces(owner)`, identify the chain, assemble
//! the EIP-712 `Permit`, request the signature and split it into `(v, r, s)`.
//! Every failure along the way is fatal and surfaces as a [`PermitError`].

use permit_account::WalletError;
use permit_config::ConfigError;
use permit_token::TokenError;
use permit_types::{SignatureError, TypedDataError};
use std::time::Duration;
use thiserror::Error;

pub mod builder;
pub mod engine;

pub use builder::{PermitBuilder, PermitFactories};
pub use engine::{PermitEngine, PermitRequest};

/// Errors that end a permit signing run.
#[derive(Debug, Error)]
pub enum PermitError {
	/// No wallet could be reached.
	#[error("Wallet unavailable: {0}")]
	WalletUnavailable(String),
	/// The user declined the connection or the signature.
	#[error("Rejected by user: {0}")]
	ConnectionRejected(String),
	/// Reading the token contract failed.
	#[error("Contract call failed: {0}")]
	ContractCallFailed(String),
	/// The wallet signs for a different chain than the token endpoint serves.
	#[error("Network mismatch: wallet is on chain {wallet}, token endpoint is on chain {network}")]
	NetworkMismatch { wallet: u64, network: u64 },
	/// The chain id could not be determined.
	#[error("Chain id lookup failed: {0}")]
	ChainIdLookup(String),
	/// The wallet returned bytes that are not a valid signature.
	#[error("Signature decode failed: {0}")]
	SignatureDecodeFailed(#[from] SignatureError),
	/// Invalid or missing configuration.
	#[error("Configuration error: {0}")]
	Config(String),
	/// The wallet did not answer the signature request in time.
	#[error("Signing timed out after {}s", .0.as_secs())]
	SigningTimedOut(Duration),
	/// Any other wallet failure.
	#[error("Wallet error: {0}")]
	Wallet(String),
	/// The typed data could not be serialized or hashed.
	#[error("Typed data error: {0}")]
	TypedData(#[from] TypedDataError),
}

impl PermitError {
	/// Short machine-readable name of the error kind.
	pub fn kind(&self) -> &'static str {
		match self {
			PermitError::WalletUnavailable(_) => "WalletUnavailable",
			PermitError::ConnectionRejected(_) => "ConnectionRejected",
			PermitError::ContractCallFailed(_) => "ContractCallFailed",
			PermitError::NetworkMismatch { .. } | PermitError::ChainIdLookup(_) => {
				"NetworkMismatch"
			},
			PermitError::SignatureDecodeFailed(_) => "SignatureDecodeFailed",
			PermitError::Config(_) => "Config",
			PermitError::SigningTimedOut(_) => "SigningTimedOut",
			PermitError::Wallet(_) => "Wallet",
			PermitError::TypedData(_) => "TypedData",
		}
	}

	/// Process exit status for this error.
	///
	/// `2` for environment and setup problems, `3` when the user declined,
	/// `4` for failed remote calls.
	pub fn exit_code(&self) -> u8 {
		match self {
			PermitError::Config(_) | PermitError::WalletUnavailable(_) | PermitError::TypedData(_) => {
				2
			},
			PermitError::ConnectionRejected(_) | PermitError::SigningTimedOut(_) => 3,
			PermitError::ContractCallFailed(_)
			| PermitError::NetworkMismatch { .. }
			| PermitError::ChainIdLookup(_)
			| PermitError::Wallet(_)
			| PermitError::SignatureDecodeFailed(_) => 4,
		}
	}
}

impl From<WalletError> for PermitError {
	fn from(err: WalletError) -> Self {
		match err {
			WalletError::Unavailable(msg) => PermitError::WalletUnavailable(msg),
			WalletError::Rejected(msg) => PermitError::ConnectionRejected(msg),
			WalletError::ChainId(msg) => PermitError::ChainIdLookup(msg),
			WalletError::SigningFailed(msg) => PermitError::Wallet(msg),
			WalletError::InvalidSignature(e) => PermitError::SignatureDecodeFailed(e),
			WalletError::InvalidKey(_)
			| WalletError::InvalidConfig(_)
			| WalletError::UnknownImplementation(_) => PermitError::Config(err.to_string()),
		}
	}
}

impl From<TokenError> for PermitError {
	fn from(err: TokenError) -> Self {
		match err {
			TokenError::CallFailed { .. } => PermitError::ContractCallFailed(err.to_string()),
			TokenError::Network(msg) => PermitError::ChainIdLookup(msg),
			TokenError::InvalidConfig(_) => PermitError::Config(err.to_string()),
		}
	}
}

impl From<ConfigError> for PermitError {
	fn from(err: ConfigError) -> Self {
		PermitError::Config(err.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_exit_codes_by_class() {
		assert_eq!(PermitError::Config("x".into()).exit_code(), 2);
		assert_eq!(PermitError::WalletUnavailable("x".into()).exit_code(), 2);
		assert_eq!(PermitError::ConnectionRejected("x".into()).exit_code(), 3);
		assert_eq!(
			PermitError::SigningTimedOut(Duration::from_secs(5)).exit_code(),
			3
		);
		assert_eq!(PermitError::ContractCallFailed("x".into()).exit_code(), 4);
		assert_eq!(
			PermitError::NetworkMismatch {
				wallet: 1,
				network: 5
			}
			.exit_code(),
			4
		);
		assert_eq!(
			PermitError::from(SignatureError::InvalidLength(64)).exit_code(),
			4
		);
	}

	#[test]
	fn test_wallet_error_mapping() {
		assert!(matches!(
			PermitError::from(WalletError::Rejected("no".into())),
			PermitError::ConnectionRejected(_)
		));
		assert!(matches!(
			PermitError::from(WalletError::Unavailable("down".into())),
			PermitError::WalletUnavailable(_)
		));
		assert!(matches!(
			PermitError::from(WalletError::UnknownImplementation("ledger".into())),
			PermitError::Config(_)
		));
		assert!(matches!(
			PermitError::from(WalletError::SigningFailed("boom".into())),
			PermitError::Wallet(_)
		));

		let err = PermitError::from(WalletError::InvalidSignature(SignatureError::Malformed(
			"not hex".into(),
		)));
		assert_eq!(err.kind(), "SignatureDecodeFailed");
		assert_eq!(err.exit_code(), 4);
	}

	#[test]
	fn test_token_error_mapping() {
		let err = PermitError::from(TokenError::CallFailed {
			method: "nonces(address)",
			token: permit_types::Address::ZERO,
			reason: "execution reverted".into(),
		});
		assert_eq!(err.kind(), "ContractCallFailed");
		assert!(err.to_string().contains("nonces(address)"));
	}

	#[test]
	fn test_timeout_message() {
		let err = PermitError::SigningTimedOut(Duration::from_secs(30));
		assert_eq!(err.to_string(), "Signing timed out after 30s");
	}
}
