//! Fitment extraction engine.
//!
//! Takes raw product-page content plus a brand registry and produces
//! deduplicated vehicle applications with confidence scores. The pipeline
//! is synchronous and I/O-free: resolve the vendor, run the strategy chain
//! over the content, normalize and score each attempt, then merge the
//! winner with any fallback rows. Fetching, concurrency, and caching to
//! disk live with the caller.

pub mod cache;
pub mod chain;
pub mod error;
pub mod merge;
pub mod resolver;
pub mod score;
pub mod strategies;
pub mod types;

mod normalize;
mod patterns;

pub use normalize::{normalize_applications, NormalizeOutcome};
pub use patterns::{parse_vehicle_line, split_fitment_segments};

use fitdex_core::BrandRegistry;

use types::ChainOutcome;

/// Resolve the vendor for one page and run the extraction chain on it.
#[must_use]
pub fn extract_fitment(
    registry: &BrandRegistry,
    brand_hint: Option<&str>,
    source_url: &str,
    raw_content: &str,
) -> ChainOutcome {
    let vendor = resolver::resolve(registry, brand_hint, source_url);
    chain::run_chain(raw_content, &vendor, source_url)
}
