//! Common types for the permit signer.
//!
//! This crate holds the value records that flow through a single signing run:
//! the EIP-712 domain and `Permit` message, the typed-data payload handed to
//! the wallet, and the decoded signature components. It also carries the
//! small amount of shared plumbing (configuration schemas, implementation
//! registry, redacted secrets) used by the other crates.

/// EIP-712 domain, `Permit` message and typed-data assembly.
pub mod permit;
/// Implementation registry for pluggable wallet backends.
pub mod registry;
/// Redacting wrapper for private keys.
pub mod secret_string;
/// Recoverable signature decoding.
pub mod signature;
/// Formatting helpers.
pub mod utils;
/// Configuration validation types for implementation-specific TOML tables.
pub mod validation;

pub use permit::{
	Permit, PermitDomain, PermitMessage, PermitTypedData, SignedPermit, TypeField,
	TypedDataError, DOMAIN_FIELDS, DOMAIN_PRIMARY_TYPE, PERMIT_FIELDS, PERMIT_PRIMARY_TYPE,
	PERMIT_VERSION,
};
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use signature::{SignatureComponents, SignatureError, SIGNATURE_LENGTH};
pub use utils::{short_hex, with_0x_prefix, without_0x_prefix};
pub use validation::{ConfigSchema, Field, FieldType, Schema, ValidationError};

pub use alloy_primitives::{Address, Bytes, B256, U256};
