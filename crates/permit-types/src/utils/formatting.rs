//! Hex string formatting helpers.

/// Adds "0x" prefix to a hex string if it doesn't already have one.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Removes "0x" or "0X" prefix from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Shortens a hex value for log lines, e.g. `0x1234..cdef`.
///
/// Values of 12 characters or fewer (after the prefix) are returned whole.
pub fn short_hex(hex_str: &str) -> String {
	let body = without_0x_prefix(hex_str);
	if body.len() <= 12 || !body.is_ascii() {
		return with_0x_prefix(body);
	}
	format!("0x{}..{}", &body[..4], &body[body.len() - 4..])
}
