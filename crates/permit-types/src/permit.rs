//! ERC-2612 permit payloads.
//!
//! A permit is an EIP-712 signature over a fixed `Permit` struct, scoped to one
//! token deployment by its domain (`name`, `version`, `chainId`,
//! `verifyingContract`). This module builds the `eth_signTypedData_v4` payload
//! from already-fetched inputs. It never reads the clock or the network, so the
//! same inputs always produce the same payload and digest.

use crate::signature::SignatureComponents;
use alloy_dyn_abi::TypedData;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, Eip712Domain, SolStruct};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Domain version used by ERC-2612 tokens.
pub const PERMIT_VERSION: &str = "1";
/// Primary type of the permit payload.
pub const PERMIT_PRIMARY_TYPE: &str = "Permit";
/// Reserved EIP-712 domain type name.
pub const DOMAIN_PRIMARY_TYPE: &str = "EIP712Domain";

sol! {
	/// The permit struct exactly as the token contract hashes it.
	#[derive(Debug, PartialEq, Eq)]
	struct Permit {
		address owner;
		address spender;
		uint256 value;
		uint256 nonce;
		uint256 deadline;
	}
}

/// A single `{ name, type }` entry of an EIP-712 type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypeField {
	pub name: &'static str,
	#[serde(rename = "type")]
	pub type_name: &'static str,
}

impl TypeField {
	const fn new(name: &'static str, type_name: &'static str) -> Self {
		Self { name, type_name }
	}
}

/// Field list of the `EIP712Domain` type for permit tokens.
pub const DOMAIN_FIELDS: [TypeField; 4] = [
	TypeField::new("name", "string"),
	TypeField::new("version", "string"),
	TypeField::new("chainId", "uint256"),
	TypeField::new("verifyingContract", "address"),
];

/// Field list of the `Permit` type.
pub const PERMIT_FIELDS: [TypeField; 5] = [
	TypeField::new("owner", "address"),
	TypeField::new("spender", "address"),
	TypeField::new("value", "uint256"),
	TypeField::new("nonce", "uint256"),
	TypeField::new("deadline", "uint256"),
];

/// Errors raised while converting or hashing a typed-data payload.
#[derive(Debug, Error)]
pub enum TypedDataError {
	/// The payload could not be represented as JSON.
	#[error("Failed to serialize typed data: {0}")]
	Serialization(#[from] serde_json::Error),
	/// The typed-data library rejected the payload.
	#[error("Failed to hash typed data: {0}")]
	Hashing(#[from] alloy_dyn_abi::Error),
}

/// EIP-712 domain of a permit token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitDomain {
	/// Token name as returned by `name()`.
	pub name: String,
	/// Domain version, always [`PERMIT_VERSION`] for tokens built on this flow.
	pub version: String,
	/// Chain the signature is valid on.
	pub chain_id: u64,
	/// Token contract that verifies the permit.
	pub verifying_contract: Address,
}

impl PermitDomain {
	/// Creates a domain with the standard permit version.
	pub fn new(name: impl Into<String>, chain_id: u64, verifying_contract: Address) -> Self {
		Self {
			name: name.into(),
			version: PERMIT_VERSION.to_string(),
			chain_id,
			verifying_contract,
		}
	}

	/// Converts into the `alloy-sol-types` domain used for static struct hashing.
	pub fn to_eip712_domain(&self) -> Eip712Domain {
		Eip712Domain::new(
			Some(self.name.clone().into()),
			Some(self.version.clone().into()),
			Some(U256::from(self.chain_id)),
			Some(self.verifying_contract),
			None,
		)
	}
}

/// The `Permit` message.
///
/// `value` and `nonce` are 256-bit and travel as decimal strings so no
/// consumer truncates them into a float or a 64-bit integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitMessage {
	pub owner: Address,
	pub spender: Address,
	#[serde(with = "decimal_u256")]
	pub value: U256,
	#[serde(with = "decimal_u256")]
	pub nonce: U256,
	/// Unix timestamp (seconds) after which the permit is rejected.
	pub deadline: u64,
}

impl PermitMessage {
	/// Converts into the `sol!` struct.
	pub fn to_sol(&self) -> Permit {
		Permit {
			owner: self.owner,
			spender: self.spender,
			value: self.value,
			nonce: self.nonce,
			deadline: U256::from(self.deadline),
		}
	}
}

/// A complete `eth_signTypedData_v4` payload for a permit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitTypedData {
	pub types: BTreeMap<&'static str, Vec<TypeField>>,
	pub primary_type: &'static str,
	pub domain: PermitDomain,
	pub message: PermitMessage,
}

impl PermitTypedData {
	/// Assembles the payload from a domain and a message.
	pub fn new(domain: PermitDomain, message: PermitMessage) -> Self {
		let types = BTreeMap::from([
			(DOMAIN_PRIMARY_TYPE, DOMAIN_FIELDS.to_vec()),
			(PERMIT_PRIMARY_TYPE, PERMIT_FIELDS.to_vec()),
		]);

		Self {
			types,
			primary_type: PERMIT_PRIMARY_TYPE,
			domain,
			message,
		}
	}

	/// Serializes the payload in wallet wire format.
	pub fn to_json(&self) -> Result<String, TypedDataError> {
		Ok(serde_json::to_string(self)?)
	}

	/// Converts into the dynamic typed-data representation used for hashing
	/// and signing.
	pub fn to_typed_data(&self) -> Result<TypedData, TypedDataError> {
		let value = serde_json::to_value(self)?;
		Ok(serde_json::from_value(value)?)
	}

	/// Computes the EIP-712 signing digest
	/// `keccak256(0x1901 || domainSeparator || hashStruct(message))`.
	pub fn signing_hash(&self) -> Result<B256, TypedDataError> {
		let digest = self.to_typed_data()?.eip712_signing_hash()?;

		debug_assert_eq!(
			digest,
			self.message
				.to_sol()
				.eip712_signing_hash(&self.domain.to_eip712_domain())
		);

		Ok(digest)
	}
}

/// Outcome of a successful signing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPermit {
	pub domain: PermitDomain,
	pub message: PermitMessage,
	/// Digest the wallet signed.
	pub digest: B256,
	/// Raw `r || s || v` signature returned by the wallet.
	pub signature: Bytes,
	pub components: SignatureComponents,
}

mod decimal_u256 {
	use alloy_primitives::U256;
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.collect_str(value)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		U256::from_str_radix(&s, 10).map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, b256, keccak256};

	fn golden_domain() -> PermitDomain {
		PermitDomain::new(
			"TestToken",
			1,
			address!("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"),
		)
	}

	fn golden_message() -> PermitMessage {
		PermitMessage {
			owner: address!("1111111111111111111111111111111111111111"),
			spender: address!("2222222222222222222222222222222222222222"),
			value: U256::from(1_000_000_000_000_000_000u128),
			nonce: U256::ZERO,
			deadline: 1_700_000_000,
		}
	}

	#[test]
	fn test_permit_type_hash_matches_erc2612() {
		assert_eq!(
			Permit::eip712_encode_type(),
			"Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)"
		);
		assert_eq!(
			keccak256(Permit::eip712_encode_type().as_bytes()),
			b256!("6e71edae12b1b97f4d1f60370fef10105fa2faae0126114a169c64845d6126c9")
		);
	}

	#[test]
	fn test_domain_separator_golden_vector() {
		assert_eq!(
			golden_domain().to_eip712_domain().separator(),
			b256!("3b8671a2298387bd66b923c6a89da3c69a26963725ddbc63564f6e29069eea11")
		);
	}

	#[test]
	fn test_signing_hash_golden_vector() {
		let typed = PermitTypedData::new(golden_domain(), golden_message());
		let digest = typed.signing_hash().unwrap();

		assert_eq!(
			digest,
			b256!("bcfd30bd294e7f5dc6581d2c4b3d94961e949d5991634e06f4fab104e6e53064")
		);
	}

	#[test]
	fn test_dynamic_and_static_hashing_agree() {
		let typed = PermitTypedData::new(golden_domain(), golden_message());
		let static_hash = golden_message()
			.to_sol()
			.eip712_signing_hash(&golden_domain().to_eip712_domain());

		assert_eq!(
			typed.to_typed_data().unwrap().eip712_signing_hash().unwrap(),
			static_hash
		);
	}

	#[test]
	fn test_assembly_is_deterministic() {
		let first = PermitTypedData::new(golden_domain(), golden_message());
		let second = PermitTypedData::new(golden_domain(), golden_message());

		assert_eq!(first, second);
		assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
	}

	#[test]
	fn test_wire_format() {
		let typed = PermitTypedData::new(golden_domain(), golden_message());
		let json: serde_json::Value = serde_json::from_str(&typed.to_json().unwrap()).unwrap();

		assert_eq!(json["primaryType"], "Permit");
		assert_eq!(json["domain"]["name"], "TestToken");
		assert_eq!(json["domain"]["version"], "1");
		assert_eq!(json["domain"]["chainId"], 1);
		assert_eq!(json["message"]["value"], "1000000000000000000");
		assert_eq!(json["message"]["nonce"], "0");
		assert_eq!(json["message"]["deadline"], 1_700_000_000u64);

		let permit_fields: Vec<(String, String)> = json["types"]["Permit"]
			.as_array()
			.unwrap()
			.iter()
			.map(|f| {
				(
					f["name"].as_str().unwrap().to_string(),
					f["type"].as_str().unwrap().to_string(),
				)
			})
			.collect();
		assert_eq!(
			permit_fields,
			vec![
				("owner".to_string(), "address".to_string()),
				("spender".to_string(), "address".to_string()),
				("value".to_string(), "uint256".to_string()),
				("nonce".to_string(), "uint256".to_string()),
				("deadline".to_string(), "uint256".to_string()),
			]
		);
		assert_eq!(json["types"]["EIP712Domain"].as_array().unwrap().len(), 4);
	}

	#[test]
	fn test_large_values_survive_as_decimal_strings() {
		let mut message = golden_message();
		message.value = U256::MAX;
		message.nonce = U256::from(u64::MAX) + U256::from(1u8);

		let json = serde_json::to_value(&message).unwrap();
		assert_eq!(json["value"], U256::MAX.to_string());
		assert_eq!(json["nonce"], "18446744073709551616");

		let back: PermitMessage = serde_json::from_value(json).unwrap();
		assert_eq!(back, message);
	}

	#[test]
	fn test_message_changes_digest() {
		let base = PermitTypedData::new(golden_domain(), golden_message());

		let mut bumped = golden_message();
		bumped.nonce = U256::from(1u8);
		let other = PermitTypedData::new(golden_domain(), bumped);

		assert_ne!(base.signing_hash().unwrap(), other.signing_hash().unwrap());
	}
}
