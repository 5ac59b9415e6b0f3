//! Read-only access to the ERC-2612 token contract.
//!
//! The permit domain needs the token's `name()` and the owner's current
//! `nonces(owner)`; both are view calls against the verifying contract. The
//! reader also reports the chain id of the endpoint it talks to, so the
//! caller can detect a wallet signing for a different network.

use alloy_sol_types::sol;
use async_trait::async_trait;
use permit_types::{Address, U256};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

sol! {
	/// The subset of the ERC-20 and ERC-2612 surface read before signing.
	interface IERC20Permit {
		function name() external view returns (string);
		function nonces(address owner) external view returns (uint256);
	}
}

/// Type alias for token reader factory functions, taking the RPC endpoint.
pub type TokenFactory = fn(&str) -> Result<Box<dyn TokenInterface>, TokenError>;

/// Errors that can occur while reading the token contract.
#[derive(Debug, Error)]
pub enum TokenError {
	/// A view call failed, reverted, or returned undecodable data.
	#[error("Call to {method} on {token} failed: {reason}")]
	CallFailed {
		method: &'static str,
		token: Address,
		reason: String,
	},
	/// The endpoint could not be queried.
	#[error("Network error: {0}")]
	Network(String),
	/// The reader configuration is invalid.
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),
}

/// Trait defining the read operations needed to build a permit.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait TokenInterface: Send + Sync {
	/// Returns the token's `name()`, used as the EIP-712 domain name.
	async fn name(&self, token: Address) -> Result<String, TokenError>;

	/// Returns the permit nonce of `owner`.
	async fn nonces(&self, token: Address, owner: Address) -> Result<U256, TokenError>;

	/// Returns the chain id of the endpoint the reader queries.
	async fn chain_id(&self) -> Result<u64, TokenError>;
}
