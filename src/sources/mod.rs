//! HTTP clients for the external data providers.
//!
//! Each client owns its provider's quirks: endpoint fallbacks, response
//! envelopes, retry classes, dry-run substitutes. Callers get typed
//! optional-field payloads and the error taxonomy in [`crate::error`].

pub mod birdeye;
pub mod dexscreener;
pub mod solscan;

pub use birdeye::BirdeyeClient;
pub use dexscreener::DexScreenerClient;
pub use solscan::SolscanClient;
