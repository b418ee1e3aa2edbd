//! Symbol classification and dialect helpers.
//!
//! The resolver answers two questions for the rest of the crate:
//! - which asset class a raw symbol belongs to ([`classify`])
//! - how a symbol decomposes into pair legs or ticker and exchange suffix
//!
//! Provider-specific rewriting builds on these helpers inside each provider
//! module.

mod classifier;
mod exchange_suffixes;
mod pairs;

pub use classifier::{canonical_symbol, classify};
pub use exchange_suffixes::{split_exchange_suffix, strip_exchange_suffix, suffix_to_mic};
pub use pairs::{is_crypto_base, is_major_currency, split_pair, CRYPTO_BASES, MAJOR_CURRENCIES};
