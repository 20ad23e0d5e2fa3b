//! Extraction strategies, one module per content shape.
//!
//! Every strategy takes the raw page content and returns the raw
//! applications it could read, errors included. The chain decides what a
//! failure means; strategies just report honestly.

use fitdex_core::application::collapse_whitespace;
use fitdex_core::{StrategyId, VehicleApplication};
use regex::Regex;
use scraper::Html;
use std::sync::OnceLock;

use crate::error::StrategyError;
use crate::types::ExtractionContext;

pub mod bilstein;
pub mod hawk;
pub mod heuristic;
pub mod list;
pub mod structured;
pub mod table;
pub mod text;

fn script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("valid regex"))
}

fn style_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style>").expect("valid regex"))
}

/// Run one strategy against the page content.
///
/// Blank content is an error rather than an empty success so the chain
/// records it as a failed attempt instead of a quiet miss.
///
/// # Errors
///
/// Returns [`StrategyError`] when the content is empty or the strategy hit
/// malformed data it could not recover from (for example an embedded
/// fitment array that is not valid JSON).
pub fn attempt(
    strategy: StrategyId,
    raw_content: &str,
    ctx: ExtractionContext<'_>,
) -> Result<Vec<VehicleApplication>, StrategyError> {
    if raw_content.trim().is_empty() {
        return Err(StrategyError::Content("empty page content".to_string()));
    }
    tracing::debug!(
        strategy = %strategy,
        source_url = ctx.source_url,
        "attempting extraction strategy"
    );
    match strategy {
        StrategyId::HawkPerformance => hawk::extract(raw_content),
        StrategyId::Bilstein => bilstein::extract(raw_content),
        StrategyId::StructuredData => structured::extract(raw_content),
        StrategyId::Table => table::extract(raw_content),
        StrategyId::List => list::extract(raw_content),
        StrategyId::Text => text::extract(raw_content),
        StrategyId::Heuristic => heuristic::extract(raw_content),
        StrategyId::Fallback => {
            tracing::debug!(
                source_url = ctx.source_url,
                "no extraction strategy produced fitment, fallback data applies"
            );
            Ok(Vec::new())
        }
    }
}

/// Visible text of a page: scripts and styles stripped, markup removed,
/// whitespace collapsed. Plain text passes through unchanged apart from
/// whitespace. Malformed HTML never fails; the parser repairs what it can.
pub(crate) fn visible_text(raw: &str) -> String {
    let without_scripts = script_re().replace_all(raw, " ");
    let without_styles = style_re().replace_all(&without_scripts, " ");
    let document = Html::parse_document(&without_styles);
    let joined = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    collapse_whitespace(&joined)
}
