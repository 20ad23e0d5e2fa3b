//! Result and trace types passed between the resolver, chain, and scorer.

use fitdex_core::{BrandEntry, StrategyId, VehicleApplication};
use serde::{Deserialize, Serialize};

/// What a strategy gets to see besides the raw page body.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionContext<'a> {
    pub source_url: &'a str,
    /// Registry entry for the resolved vendor, if the brand hint or source
    /// domain matched one.
    pub brand: Option<&'a BrandEntry>,
}

/// Output of one strategy attempt, post-normalization.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub strategy: StrategyId,
    /// Deduplicated, normalized applications. Empty when the strategy ran
    /// cleanly but found nothing.
    pub applications: Vec<VehicleApplication>,
    /// Aggregate score from the confidence scorer, 0.0 to 1.0.
    pub confidence: f64,
    /// Ran without error AND found at least one application. A clean empty
    /// run and a parse error both leave this false; the trace tells them
    /// apart through [`StrategyTrace::error`].
    pub succeeded: bool,
}

impl ExtractionResult {
    /// A result for a strategy that ran and found nothing.
    #[must_use]
    pub fn empty(strategy: StrategyId) -> Self {
        Self {
            strategy,
            applications: Vec::new(),
            confidence: 0.0,
            succeeded: false,
        }
    }
}

/// One line of the per-product observability trace: every attempted strategy
/// leaves exactly one entry, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyTrace {
    pub strategy: StrategyId,
    pub confidence: f64,
    pub succeeded: bool,
    /// Applications surviving normalization for this attempt.
    pub applications: usize,
    /// Present when the strategy raised a parse error instead of returning.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

/// Outcome of running the full strategy chain over one page.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    /// Winning extraction, either by short-circuit or scorer selection.
    /// `None` is the explicit no-official-data outcome, not an error.
    pub winner: Option<ExtractionResult>,
    pub trace: Vec<StrategyTrace>,
    /// Candidate records dropped for failing invariant checks.
    pub rejected_records: usize,
}

impl ChainOutcome {
    /// True when no strategy produced a usable result; callers decide
    /// whether to fall back to spreadsheet data.
    #[must_use]
    pub fn no_fitment_found(&self) -> bool {
        self.winner
            .as_ref()
            .is_none_or(|w| w.applications.is_empty())
    }
}
