//! Session configuration
//!
//! Board-agnostic settings for one CTA-2045 port. Optionally loaded from a
//! TOML document with the `toml` feature.

pub mod types;

pub use types::*;
