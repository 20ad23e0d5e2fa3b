//! The extraction chain.
//!
//! Strategies run in the vendor's order. Each attempt is normalized and
//! scored; a sufficiently confident success stops the chain early, and
//! otherwise the best successful attempt of the whole run wins. Strategy
//! errors are recorded in the trace and never abort the chain.

use fitdex_core::max_model_year;

use crate::normalize::normalize_applications;
use crate::resolver::ResolvedVendor;
use crate::score::{score, select_winner};
use crate::strategies;
use crate::types::{ChainOutcome, ExtractionContext, ExtractionResult, StrategyTrace};

/// Confidence at which the chain stops trying further strategies.
pub const HIGH_CONFIDENCE: f64 = 0.8;

/// Stamp the aggregate confidence onto every record of the winning result.
fn stamp(mut result: ExtractionResult) -> ExtractionResult {
    for app in &mut result.applications {
        app.confidence = result.confidence;
    }
    result
}

/// Run the strategy chain over one page.
#[must_use]
pub fn run_chain(
    raw_content: &str,
    vendor: &ResolvedVendor<'_>,
    source_url: &str,
) -> ChainOutcome {
    let ctx = ExtractionContext {
        source_url,
        brand: vendor.entry,
    };
    let max_year = max_model_year();

    let mut results: Vec<ExtractionResult> = Vec::with_capacity(vendor.strategy_order.len());
    let mut trace: Vec<StrategyTrace> = Vec::with_capacity(vendor.strategy_order.len());
    let mut rejected_records = 0usize;

    for &strategy in &vendor.strategy_order {
        match strategies::attempt(strategy, raw_content, ctx) {
            Ok(raw_applications) => {
                let extracted = raw_applications.len();
                let outcome = normalize_applications(raw_applications, max_year);
                rejected_records += outcome.rejected;
                let confidence = score(strategy, &outcome.applications, vendor.entry);
                let succeeded = !outcome.applications.is_empty();
                tracing::debug!(
                    strategy = %strategy,
                    extracted,
                    kept = outcome.applications.len(),
                    rejected = outcome.rejected,
                    confidence,
                    "strategy attempt finished"
                );
                trace.push(StrategyTrace {
                    strategy,
                    confidence,
                    succeeded,
                    applications: outcome.applications.len(),
                    error: None,
                });

                let result = ExtractionResult {
                    strategy,
                    applications: outcome.applications,
                    confidence,
                    succeeded,
                };
                if succeeded && confidence >= HIGH_CONFIDENCE {
                    tracing::debug!(
                        strategy = %strategy,
                        confidence,
                        "confidence clears the early-stop bar, chain done"
                    );
                    return ChainOutcome {
                        winner: Some(stamp(result)),
                        trace,
                        rejected_records,
                    };
                }
                results.push(result);
            }
            Err(error) => {
                tracing::warn!(
                    strategy = %strategy,
                    source_url,
                    %error,
                    "strategy attempt failed"
                );
                trace.push(StrategyTrace {
                    strategy,
                    confidence: 0.0,
                    succeeded: false,
                    applications: 0,
                    error: Some(error.to_string()),
                });
            }
        }
    }

    let winner = select_winner(&results).cloned().map(stamp);
    if winner.is_none() {
        tracing::warn!(source_url, "no strategy found fitment on this page");
    }
    ChainOutcome {
        winner,
        trace,
        rejected_records,
    }
}
