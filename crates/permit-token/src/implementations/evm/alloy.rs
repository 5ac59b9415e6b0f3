//! Token reader using an Alloy HTTP provider.

use crate::{IERC20Permit, TokenError, TokenInterface};
use alloy_primitives::Bytes;
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::SolCall;
use alloy_transport_http::Http;
use async_trait::async_trait;
use permit_types::{Address, U256};

/// Alloy-based token reader bound to one RPC endpoint.
pub struct AlloyTokenReader {
	provider: RootProvider<Http<reqwest::Client>>,
}

impl AlloyTokenReader {
	pub fn new(rpc_url: &str) -> Result<Self, TokenError> {
		let url = rpc_url
			.parse::<reqwest::Url>()
			.map_err(|e| TokenError::InvalidConfig(format!("Invalid RPC URL {}: {}", rpc_url, e)))?;

		Ok(Self {
			provider: RootProvider::new_http(url),
		})
	}

	/// Executes `call` against `token` with `eth_call` and decodes its return data.
	async fn view<C: SolCall>(&self, token: Address, call: C) -> Result<C::Return, TokenError> {
		let request = TransactionRequest::default()
			.to(token)
			.input(call.abi_encode().into());

		let data = self
			.provider
			.call(&request)
			.await
			.map_err(|e| call_failed::<C>(token, e.to_string()))?;

		decode_returns::<C>(token, &data)
	}
}

fn call_failed<C: SolCall>(token: Address, reason: String) -> TokenError {
	TokenError::CallFailed {
		method: C::SIGNATURE,
		token,
		reason,
	}
}

/// Decodes return data, treating an empty result (no code at the address) as a failure.
fn decode_returns<C: SolCall>(token: Address, data: &Bytes) -> Result<C::Return, TokenError> {
	if data.is_empty() {
		return Err(call_failed::<C>(
			token,
			"empty return data, is the address a contract?".to_string(),
		));
	}

	C::abi_decode_returns(data, true).map_err(|e| call_failed::<C>(token, e.to_string()))
}

#[async_trait]
impl TokenInterface for AlloyTokenReader {
	async fn name(&self, token: Address) -> Result<String, TokenError> {
		let name = self.view(token, IERC20Permit::nameCall {}).await?._0;
		tracing::debug!(%token, %name, "Read token name");
		Ok(name)
	}

	async fn nonces(&self, token: Address, owner: Address) -> Result<U256, TokenError> {
		let nonce = self
			.view(token, IERC20Permit::noncesCall { owner })
			.await?
			._0;
		tracing::debug!(%token, %owner, %nonce, "Read permit nonce");
		Ok(nonce)
	}

	async fn chain_id(&self) -> Result<u64, TokenError> {
		self.provider
			.get_chain_id()
			.await
			.map_err(|e| TokenError::Network(format!("Failed to get chain id: {}", e)))
	}
}

/// Factory function to create a token reader for an RPC endpoint.
pub fn create_token_reader(rpc_url: &str) -> Result<Box<dyn TokenInterface>, TokenError> {
	Ok(Box::new(AlloyTokenReader::new(rpc_url)?))
}
