//! token-sentinel - Solana token signal service
//!
//! Pulls token metadata and market data from public providers, scores each
//! token locally, and serves enriched signals over a small HTTP API, with an
//! optional LLM verdict layered on top.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod oracle;
pub mod pipeline;
pub mod sources;
pub mod types;

// Re-export main types for convenience
pub use engine::SignalEngine;
pub use types::{Signal, Snapshot};
