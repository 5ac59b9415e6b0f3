//! The permit signing engine.
//!
//! Runs the steps strictly in order, one suspension point at a time. Only the
//! signature request is guarded by a timeout and by Ctrl-C; every other call
//! waits for its answer.

use crate::PermitError;
use permit_account::{WalletService, WalletSession};
use permit_config::Config;
use permit_token::TokenInterface;
use permit_types::{
	Address, Bytes, PermitDomain, PermitMessage, PermitTypedData, SignatureComponents,
	SignedPermit, U256,
};
use std::future::Future;
use std::time::Duration;

/// What to sign, fixed before the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitRequest {
	/// Token contract, also the EIP-712 verifying contract.
	pub token: Address,
	pub spender: Address,
	/// Allowance in base units.
	pub value: U256,
	/// Unix timestamp after which the permit is invalid.
	pub deadline: u64,
}

impl PermitRequest {
	/// Builds the request from configuration with the deadline anchored at `now`.
	pub fn from_config(config: &Config, now: u64) -> Result<Self, PermitError> {
		let deadline = now
			.checked_add(config.permit.deadline_window_seconds)
			.ok_or_else(|| PermitError::Config("deadline overflows u64".to_string()))?;

		Ok(Self {
			token: config.token.address,
			spender: config.permit.spender,
			value: config.permit_value()?,
			deadline,
		})
	}
}

/// Drives one permit signing run.
pub struct PermitEngine {
	token_reader: Box<dyn TokenInterface>,
	signing_timeout: Option<Duration>,
	/// Whether the token endpoint's chain id is compared with the wallet's.
	check_network: bool,
}

impl PermitEngine {
	pub fn new(token_reader: Box<dyn TokenInterface>) -> Self {
		Self {
			token_reader,
			signing_timeout: None,
			check_network: true,
		}
	}

	/// Bounds the time spent waiting for the wallet to sign.
	pub fn with_signing_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.signing_timeout = timeout;
		self
	}

	/// Disables the wallet/endpoint chain id comparison.
	pub fn without_network_check(mut self) -> Self {
		self.check_network = false;
		self
	}

	/// Connects the wallet, signs the permit and closes the session.
	///
	/// The session is disconnected whether or not signing succeeds.
	pub async fn run(
		&self,
		wallet: WalletService,
		request: &PermitRequest,
	) -> Result<SignedPermit, PermitError> {
		self.run_until(wallet, request, shutdown_signal()).await
	}

	/// Like [`run`](Self::run), with `cancel` aborting a pending signature request.
	pub async fn run_until<F>(
		&self,
		wallet: WalletService,
		request: &PermitRequest,
		cancel: F,
	) -> Result<SignedPermit, PermitError>
	where
		F: Future<Output = ()>,
	{
		let session = wallet.connect().await?;

		let result = self.sign_with_session(&session, request, cancel).await;

		if let Err(e) = session.disconnect().await {
			tracing::warn!(error = %e, "Failed to disconnect wallet");
		}

		result
	}

	async fn sign_with_session<F>(
		&self,
		session: &WalletSession,
		request: &PermitRequest,
		cancel: F,
	) -> Result<SignedPermit, PermitError>
	where
		F: Future<Output = ()>,
	{
		let owner = session.address();

		let name = self.token_reader.name(request.token).await?;
		let nonce = self.token_reader.nonces(request.token, owner).await?;
		tracing::info!(token = %request.token, %name, %owner, %nonce, "Read token state");

		let chain_id = self.resolve_chain_id(session).await?;

		let typed_data = PermitTypedData::new(
			PermitDomain::new(name, chain_id, request.token),
			PermitMessage {
				owner,
				spender: request.spender,
				value: request.value,
				nonce,
				deadline: request.deadline,
			},
		);
		let digest = typed_data.signing_hash()?;
		tracing::debug!(%digest, chain_id, deadline = request.deadline, "Assembled permit");

		let signature = self.request_signature(session, &typed_data, cancel).await?;
		let components = SignatureComponents::from_bytes(&signature)?;
		tracing::info!(v = components.v, "Received signature");

		Ok(SignedPermit {
			domain: typed_data.domain,
			message: typed_data.message,
			digest,
			signature,
			components,
		})
	}

	async fn resolve_chain_id(&self, session: &WalletSession) -> Result<u64, PermitError> {
		let wallet_chain = session.chain_id().await?;

		if self.check_network {
			let network_chain = self.token_reader.chain_id().await?;
			if wallet_chain != network_chain {
				return Err(PermitError::NetworkMismatch {
					wallet: wallet_chain,
					network: network_chain,
				});
			}
		}

		tracing::info!(chain_id = wallet_chain, "Resolved chain");
		Ok(wallet_chain)
	}

	async fn request_signature<F>(
		&self,
		session: &WalletSession,
		typed_data: &PermitTypedData,
		cancel: F,
	) -> Result<Bytes, PermitError>
	where
		F: Future<Output = ()>,
	{
		tracing::info!("Waiting for wallet to sign");
		let sign = session.sign_typed_data(typed_data);

		let signed = async {
			let result = match self.signing_timeout {
				Some(limit) => match tokio::time::timeout(limit, sign).await {
					Ok(result) => result,
					Err(_) => return Err(PermitError::SigningTimedOut(limit)),
				},
				None => sign.await,
			};
			result.map_err(PermitError::from)
		};

		tokio::select! {
			result = signed => result,
			_ = cancel => Err(PermitError::ConnectionRejected(
				"Signature request cancelled".to_string(),
			)),
		}
	}
}

async fn shutdown_signal() {
	if tokio::signal::ctrl_c().await.is_err() {
		// Without a signal handler the request can only end by itself.
		std::future::pending::<()>().await;
	}
	tracing::info!("Received Ctrl-C");
}
