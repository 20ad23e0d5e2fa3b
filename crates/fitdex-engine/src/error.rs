//! Error types for the extraction engine.
//!
//! Strategy-level parse failures never leave the chain: `run_chain` catches
//! them, records a failed attempt in the trace, and moves on. Only cache
//! persistence can surface an error to the orchestration layer.

use thiserror::Error;

/// A single strategy failed to parse the content it was given.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// The page declares fitment data in an embedded script but the payload
    /// does not parse as JSON.
    #[error("malformed embedded fitment JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The content cannot be meaningfully parsed by any strategy.
    #[error("unusable content: {0}")]
    Content(String),
}

/// Cache snapshot persistence failures. Individual corrupt entries are
/// handled inside the cache (skipped, logged) and never raise this.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to read cache snapshot at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write cache snapshot at {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode cache snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}
