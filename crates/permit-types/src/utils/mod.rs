//! Utility functions shared across the permit signer crates.

pub mod formatting;

pub use formatting::{short_hex, with_0x_prefix, without_0x_prefix};
