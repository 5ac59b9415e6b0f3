//! Console rendering of a signed permit.

use clap::ValueEnum;
use permit_types::{with_0x_prefix, SignedPermit};
use serde::Serialize;

/// Format of the report written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable `v`, `r` and `s` lines.
	Text,
	/// A single JSON object.
	Json,
}

#[derive(Serialize)]
struct JsonReport {
	v: u8,
	r: String,
	s: String,
	signature: String,
	digest: String,
	deadline: u64,
	nonce: String,
	owner: String,
}

impl From<&SignedPermit> for JsonReport {
	fn from(signed: &SignedPermit) -> Self {
		Self {
			v: signed.components.v,
			r: signed.components.r_hex(),
			s: signed.components.s_hex(),
			signature: with_0x_prefix(&hex::encode(&signed.signature)),
			digest: with_0x_prefix(&hex::encode(signed.digest)),
			deadline: signed.message.deadline,
			nonce: signed.message.nonce.to_string(),
			owner: signed.message.owner.to_string(),
		}
	}
}

/// Renders the report for `signed` in the requested format.
pub fn render(signed: &SignedPermit, format: OutputFormat) -> Result<String, serde_json::Error> {
	match format {
		OutputFormat::Text => Ok(format!("Signature components:\n{}", signed.components)),
		OutputFormat::Json => serde_json::to_string(&JsonReport::from(signed)),
	}
}
