//! Decoding of 65-byte recoverable ECDSA signatures.
//!
//! Wallets return `r || s || v`. The recovery id is reported in the legacy
//! `27/28` form that `permit(owner, spender, value, deadline, v, r, s)` and
//! `ecrecover` expect; a trailing `0/1` y-parity byte is lifted into that
//! range.

use crate::utils::with_0x_prefix;
use alloy_primitives::B256;
use std::fmt;
use thiserror::Error;

/// Length of an `r || s || v` signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// Errors that can occur while decoding a signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
	/// The input is not exactly 65 bytes long.
	#[error("Invalid signature length: expected 65 bytes, got {0}")]
	InvalidLength(usize),
	/// The trailing byte is neither a y-parity bit nor a legacy recovery id.
	#[error("Invalid recovery id byte: {0}")]
	InvalidRecoveryId(u8),
	/// The wallet answered with something that is not hex-encoded bytes.
	#[error("Malformed signature: {0}")]
	Malformed(String),
}

/// The `(v, r, s)` split of a recoverable signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureComponents {
	/// Recovery id, always 27 or 28.
	pub v: u8,
	pub r: B256,
	pub s: B256,
}

impl SignatureComponents {
	/// Splits a raw signature.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
		if bytes.len() != SIGNATURE_LENGTH {
			return Err(SignatureError::InvalidLength(bytes.len()));
		}

		let v = match bytes[64] {
			parity @ (0 | 1) => parity + 27,
			legacy @ (27 | 28) => legacy,
			other => return Err(SignatureError::InvalidRecoveryId(other)),
		};

		Ok(Self {
			v,
			r: B256::from_slice(&bytes[..32]),
			s: B256::from_slice(&bytes[32..64]),
		})
	}

	/// Re-encodes as `r || s || v`.
	pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
		let mut out = [0u8; SIGNATURE_LENGTH];
		out[..32].copy_from_slice(self.r.as_slice());
		out[32..64].copy_from_slice(self.s.as_slice());
		out[64] = self.v;
		out
	}

	/// Hex encoding of `r` with 0x prefix.
	pub fn r_hex(&self) -> String {
		with_0x_prefix(&hex::encode(self.r))
	}

	/// Hex encoding of `s` with 0x prefix.
	pub fn s_hex(&self) -> String {
		with_0x_prefix(&hex::encode(self.s))
	}
}

impl TryFrom<&[u8]> for SignatureComponents {
	type Error = SignatureError;

	fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
		Self::from_bytes(bytes)
	}
}

impl fmt::Display for SignatureComponents {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "v: {}", self.v)?;
		writeln!(f, "r: {}", self.r_hex())?;
		write!(f, "s: {}", self.s_hex())
	}
}
