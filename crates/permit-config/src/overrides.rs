//! Command-line overrides merged on top of the file configuration.

use alloy_primitives::Address;

/// Values supplied on the command line or through environment variables.
///
/// Every field is optional; set fields replace the corresponding file value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
	pub token: Option<Address>,
	pub rpc_url: Option<String>,
	pub spender: Option<Address>,
	pub amount: Option<String>,
	pub decimals: Option<u8>,
	pub deadline_window_seconds: Option<u64>,
	pub signing_timeout_seconds: Option<u64>,
	pub wallet: Option<String>,
	/// Endpoint of the selected wallet implementation (its `url` key).
	pub wallet_url: Option<String>,
}

impl ConfigOverrides {
	/// Writes the set values into a parsed configuration table.
	pub(crate) fn apply(&self, root: &mut toml::Table) {
		if let Some(token) = self.token {
			set(root, &["token"], "address", token.to_string().into());
		}
		if let Some(rpc_url) = &self.rpc_url {
			set(root, &["token"], "rpc_url", rpc_url.clone().into());
		}
		if let Some(spender) = self.spender {
			set(root, &["permit"], "spender", spender.to_string().into());
		}
		if let Some(amount) = &self.amount {
			set(root, &["permit"], "amount", amount.clone().into());
		}
		if let Some(decimals) = self.decimals {
			set(root, &["permit"], "decimals", i64::from(decimals).into());
		}
		if let Some(window) = self.deadline_window_seconds {
			set(
				root,
				&["permit"],
				"deadline_window_seconds",
				clamp_i64(window).into(),
			);
		}
		if let Some(timeout) = self.signing_timeout_seconds {
			set(root, &["signing"], "timeout_seconds", clamp_i64(timeout).into());
		}
		if let Some(wallet) = &self.wallet {
			set(root, &["wallet"], "primary", wallet.clone().into());
		}
		if let Some(url) = &self.wallet_url {
			let primary = root
				.get("wallet")
				.and_then(|w| w.get("primary"))
				.and_then(|p| p.as_str())
				.map(str::to_string);

			match primary {
				Some(primary) => set(
					root,
					&["wallet", "implementations", &primary],
					"url",
					url.clone().into(),
				),
				None => tracing::warn!("Ignoring wallet url override: no wallet selected"),
			}
		}
	}
}

fn clamp_i64(value: u64) -> i64 {
	i64::try_from(value).unwrap_or(i64::MAX)
}

/// Sets `key` in the table found by walking `path`, creating tables as needed.
///
/// A non-table value in the way is replaced by a table.
fn set(root: &mut toml::Table, path: &[&str], key: &str, value: toml::Value) {
	let mut table = root;
	for segment in path {
		let entry = table
			.entry(segment.to_string())
			.or_insert(toml::Value::Table(toml::Table::new()));
		if !entry.is_table() {
			*entry = toml::Value::Table(toml::Table::new());
		}
		let Some(inner) = entry.as_table_mut() else {
			return;
		};
		table = inner;
	}
	table.insert(key.to_string(), value);
}
