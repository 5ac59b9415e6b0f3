//! Main entry point for the permit signer.
//!
//! Loads configuration, connects the configured wallet, requests an ERC-2612
//! permit signature and prints its `(v, r, s)` components. Logs go to stderr
//! so stdout carries only the report.

use clap::Parser;
use permit_config::{Config, ConfigOverrides};
use permit_core::{PermitBuilder, PermitError, PermitRequest};
use permit_types::Address;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod factory_registry;
mod report;

use report::OutputFormat;

/// Configuration file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "permit.toml";

/// Command-line arguments for the permit signer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file (defaults to ./permit.toml when present)
	#[arg(short, long, env = "PERMIT_CONFIG")]
	config: Option<PathBuf>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	/// Report format written to stdout
	#[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
	output: OutputFormat,

	/// Token contract address (verifying contract)
	#[arg(long, env = "PERMIT_TOKEN")]
	token: Option<Address>,

	/// RPC endpoint for token reads
	#[arg(long, env = "PERMIT_RPC_URL")]
	rpc_url: Option<String>,

	/// Spender allowed to use the permit
	#[arg(long, env = "PERMIT_SPENDER")]
	spender: Option<Address>,

	/// Allowance in whole tokens, e.g. "1.5"
	#[arg(long, env = "PERMIT_AMOUNT")]
	amount: Option<String>,

	/// Token decimals used to scale the amount
	#[arg(long, env = "PERMIT_DECIMALS")]
	decimals: Option<u8>,

	/// Seconds from now until the permit expires
	#[arg(long, env = "PERMIT_DEADLINE_WINDOW")]
	deadline_window: Option<u64>,

	/// Seconds to wait for the wallet to sign
	#[arg(long)]
	signing_timeout: Option<u64>,

	/// Wallet implementation to use (local, rpc)
	#[arg(long, env = "PERMIT_WALLET")]
	wallet: Option<String>,

	/// Endpoint of the selected wallet implementation
	#[arg(long, env = "PERMIT_WALLET_URL")]
	wallet_url: Option<String>,
}

impl Args {
	fn overrides(&self) -> ConfigOverrides {
		ConfigOverrides {
			token: self.token,
			rpc_url: self.rpc_url.clone(),
			spender: self.spender,
			amount: self.amount.clone(),
			decimals: self.decimals,
			deadline_window_seconds: self.deadline_window,
			signing_timeout_seconds: self.signing_timeout,
			wallet: self.wallet.clone(),
			wallet_url: self.wallet_url.clone(),
		}
	}

	/// Returns the configuration file to read, if any.
	fn config_path(&self) -> Option<PathBuf> {
		self.config.clone().or_else(|| {
			let default = Path::new(DEFAULT_CONFIG_FILE);
			default.exists().then(|| default.to_path_buf())
		})
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	match run(&args).await {
		Ok(report) => {
			println!("{}", report);
			ExitCode::SUCCESS
		},
		Err(e) => {
			tracing::error!(kind = e.kind(), error = %e, "Permit signing failed");
			eprintln!("error[{}]: {}", e.kind(), e);
			ExitCode::from(e.exit_code())
		},
	}
}

async fn run(args: &Args) -> Result<String, PermitError> {
	let config_path = args.config_path();
	let config = Config::load(config_path.as_deref(), &args.overrides()).await?;
	tracing::info!(
		token = %config.token.address,
		spender = %config.permit.spender,
		wallet = %config.wallet.primary,
		"Loaded configuration"
	);

	let now = u64::try_from(chrono::Utc::now().timestamp())
		.map_err(|_| PermitError::Config("System clock is before the Unix epoch".to_string()))?;
	let request = PermitRequest::from_config(&config, now)?;

	let (engine, wallet) =
		PermitBuilder::new(config).build(factory_registry::build_factories())?;

	let signed = engine.run(wallet, &request).await?;
	tracing::info!(digest = %signed.digest, "Signed permit");

	report::render(&signed, args.output)
		.map_err(|e| PermitError::Config(format!("Failed to render report: {}", e)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, U256};
	use std::io::Write;

	#[test]
	fn test_flags_become_overrides() {
		let args = Args::try_parse_from([
			"permit-signer",
			"--token",
			"0x5FbDB2315678afecb367f032d93F642f64180aa3",
			"--spender",
			"0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
			"--amount",
			"2.5",
			"--decimals",
			"6",
			"--signing-timeout",
			"60",
			"--wallet",
			"rpc",
			"--wallet-url",
			"http://127.0.0.1:1248",
			"--output",
			"json",
		])
		.unwrap();

		assert_eq!(args.output, OutputFormat::Json);

		let config = Config::from_str_with_overrides("", &args.overrides()).unwrap();
		assert_eq!(
			config.token.address,
			address!("5FbDB2315678afecb367f032d93F642f64180aa3")
		);
		assert_eq!(config.permit.decimals, 6);
		assert_eq!(config.permit_value().unwrap(), U256::from(2_500_000u64));
		assert_eq!(config.signing.timeout_seconds, Some(60));
		assert_eq!(config.token_rpc_url(), Some("http://127.0.0.1:1248"));
	}

	#[test]
	fn test_invalid_address_flag_is_rejected() {
		let result = Args::try_parse_from(["permit-signer", "--token", "0x1234"]);
		assert!(result.is_err());
	}

	#[test]
	fn test_explicit_config_path_wins() {
		let args = Args::try_parse_from(["permit-signer", "--config", "other.toml"]).unwrap();
		assert_eq!(args.config_path(), Some(PathBuf::from("other.toml")));
	}

	#[tokio::test]
	async fn test_missing_config_file_is_setup_error() {
		let args = Args::try_parse_from([
			"permit-signer",
			"--config",
			"/nonexistent/permit.toml",
		])
		.unwrap();

		let err = run(&args).await.unwrap_err();
		assert!(matches!(err, PermitError::Config(_)));
		assert_eq!(err.exit_code(), 2);
	}

	#[tokio::test]
	async fn test_invalid_wallet_table_stops_before_connecting() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(
			file,
			r#"
[token]
address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
rpc_url = "http://127.0.0.1:1"

[permit]
spender = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"

[wallet]
primary = "local"

[wallet.implementations.local]
private_key = "0x1234"
chain_id = 1
"#
		)
		.unwrap();

		let path = file.path().to_string_lossy().to_string();
		let args = Args::try_parse_from(["permit-signer", "--config", path.as_str()]).unwrap();

		let err = run(&args).await.unwrap_err();
		assert!(matches!(err, PermitError::Config(_)));
	}
}
