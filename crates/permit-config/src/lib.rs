//! Configuration module for the permit signer.
//!
//! Configuration comes from an optional TOML file, with `${VAR}` and
//! `${VAR:-default}` placeholders resolved from the environment before
//! parsing. Command-line overrides are merged on top of the parsed table, so a
//! complete configuration can also be given without any file at all.
//!
//! ```toml
//! [token]
//! address = "0x..."
//! rpc_url = "https://..."
//!
//! [permit]
//! spender = "0x..."
//! amount = "1.0"
//! decimals = 18
//! deadline_window_seconds = 3600
//!
//! [wallet]
//! primary = "rpc"
//!
//! [wallet.implementations.rpc]
//! url = "http://127.0.0.1:1248"
//! ```

mod overrides;

pub use overrides::ConfigOverrides;

use alloy_primitives::utils::{parse_units, ParseUnits};
use alloy_primitives::{Address, U256};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message only, the error's Display repeats the input.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level configuration of a signing run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Token whose permit is signed.
	pub token: TokenConfig,
	/// Permit message parameters.
	pub permit: PermitConfig,
	/// Signature request behaviour.
	#[serde(default)]
	pub signing: SigningConfig,
	/// Wallet backend selection.
	pub wallet: WalletConfig,
}

/// Token contract settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
	/// Address of the ERC-2612 token, used as the verifying contract.
	pub address: Address,
	/// JSON-RPC endpoint used for `name()`, `nonces()` and the chain id.
	/// Falls back to the selected wallet's `url` when omitted.
	pub rpc_url: Option<String>,
}

/// Permit message settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PermitConfig {
	/// Contract allowed to move the tokens.
	pub spender: Address,
	/// Human-readable amount, scaled by `decimals`.
	#[serde(default = "default_amount")]
	pub amount: String,
	/// Token decimals used to scale `amount`.
	#[serde(default = "default_decimals")]
	pub decimals: u8,
	/// Seconds between signing time and the permit deadline.
	#[serde(default = "default_deadline_window_seconds")]
	pub deadline_window_seconds: u64,
}

/// Signature request settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SigningConfig {
	/// Upper bound on how long to wait for the wallet approval.
	/// Waits indefinitely when unset.
	pub timeout_seconds: Option<u64>,
}

/// Wallet backend selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WalletConfig {
	/// Name of the implementation to use.
	pub primary: String,
	/// Map of wallet implementation names to their raw TOML tables.
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
}

fn default_amount() -> String {
	"1.0".to_string()
}

fn default_decimals() -> u8 {
	18
}

fn default_deadline_window_seconds() -> u64 {
	3600
}

/// Resolves `${VAR_NAME}` and `${VAR_NAME:-default}` placeholders.
///
/// Comment lines are copied untouched. Input strings are limited to 1MB to
/// bound regex work.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());

	for line in input.split_inclusive('\n') {
		if line.trim_start().starts_with('#') {
			result.push_str(line);
			continue;
		}

		let mut last = 0;
		for cap in re.captures_iter(line) {
			let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
				continue;
			};

			let value = match (std::env::var(var_name.as_str()), cap.get(2)) {
				(Ok(v), _) => v,
				(Err(_), Some(default)) => default.as_str().to_string(),
				(Err(_), None) => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)));
				},
			};

			result.push_str(&line[last..full_match.start()]);
			result.push_str(&value);
			last = full_match.end();
		}
		result.push_str(&line[last..]);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from an optional file and applies overrides.
	///
	/// A missing `path` starts from an empty table, in which case the
	/// overrides must supply every required value.
	pub async fn load(
		path: Option<&Path>,
		overrides: &ConfigOverrides,
	) -> Result<Self, ConfigError> {
		let content = match path {
			Some(path) => {
				tracing::debug!(path = %path.display(), "Reading configuration file");
				tokio::fs::read_to_string(path).await.map_err(|e| {
					ConfigError::Io(std::io::Error::new(
						e.kind(),
						format!("Cannot read {}: {}", path.display(), e),
					))
				})?
			},
			None => String::new(),
		};

		Self::from_str_with_overrides(&content, overrides)
	}

	/// Parses TOML content, applies overrides and validates the result.
	pub fn from_str_with_overrides(
		content: &str,
		overrides: &ConfigOverrides,
	) -> Result<Self, ConfigError> {
		let resolved = resolve_env_vars(content)?;
		let mut table: toml::Table = toml::from_str(&resolved)?;
		overrides.apply(&mut table);

		let config: Config = toml::Value::Table(table).try_into()?;
		config.validate()?;
		Ok(config)
	}

	/// Returns the permit value in base units.
	pub fn permit_value(&self) -> Result<U256, ConfigError> {
		match parse_units(&self.permit.amount, self.permit.decimals) {
			Ok(ParseUnits::U256(value)) => Ok(value),
			Ok(ParseUnits::I256(_)) => Err(ConfigError::Validation(format!(
				"Permit amount cannot be negative: {}",
				self.permit.amount
			))),
			Err(e) => Err(ConfigError::Validation(format!(
				"Invalid permit amount '{}' with {} decimals: {}",
				self.permit.amount, self.permit.decimals, e
			))),
		}
	}

	/// Returns the configured wait bound for the wallet approval.
	pub fn signing_timeout(&self) -> Option<Duration> {
		self.signing.timeout_seconds.map(Duration::from_secs)
	}

	/// Returns the TOML table of the selected wallet implementation.
	pub fn wallet_implementation(&self) -> Result<&toml::Value, ConfigError> {
		self.wallet
			.implementations
			.get(&self.wallet.primary)
			.ok_or_else(|| {
				ConfigError::Validation(format!(
					"Primary wallet '{}' not found in wallet.implementations",
					self.wallet.primary
				))
			})
	}

	/// Returns the endpoint for read-only token calls.
	///
	/// Uses `token.rpc_url` when set, otherwise the `url` of the selected
	/// wallet implementation.
	pub fn token_rpc_url(&self) -> Option<&str> {
		self.token.rpc_url.as_deref().or_else(|| {
			self.wallet_implementation()
				.ok()
				.and_then(|table| table.get("url"))
				.and_then(|url| url.as_str())
		})
	}

	/// Validates cross-field constraints that serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.token.address.is_zero() {
			return Err(ConfigError::Validation(
				"token.address cannot be the zero address".into(),
			));
		}
		if self.permit.spender.is_zero() {
			return Err(ConfigError::Validation(
				"permit.spender cannot be the zero address".into(),
			));
		}
		if self.permit.decimals > 77 {
			return Err(ConfigError::Validation(
				"permit.decimals cannot exceed 77".into(),
			));
		}
		self.permit_value()?;

		if self.permit.deadline_window_seconds == 0 {
			return Err(ConfigError::Validation(
				"permit.deadline_window_seconds must be greater than 0".into(),
			));
		}
		if self.signing.timeout_seconds == Some(0) {
			return Err(ConfigError::Validation(
				"signing.timeout_seconds must be greater than 0".into(),
			));
		}

		if self.wallet.primary.is_empty() {
			return Err(ConfigError::Validation(
				"wallet.primary cannot be empty".into(),
			));
		}
		self.wallet_implementation()?;

		if self.token_rpc_url().is_none() {
			return Err(ConfigError::Validation(format!(
				"token.rpc_url is required when wallet '{}' has no url",
				self.wallet.primary
			)));
		}

		Ok(())
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_str_with_overrides(s, &ConfigOverrides::default())
	}
}
