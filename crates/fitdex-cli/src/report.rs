//! JSON report types for a batch run.
//!
//! One [`ProductReport`] per input product plus a [`BatchSummary`] with
//! run-level counts, serialized as a single [`BatchReport`] document.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fitdex_core::MergedFitment;
use fitdex_engine::types::StrategyTrace;

/// Per-product extraction result for the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReport {
    pub sku: String,
    /// URL the winning extraction came from, if any page produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub from_cache: bool,
    pub timed_out: bool,
    /// Records dropped during normalization across all attempted pages.
    pub rejected_records: usize,
    pub fitment: MergedFitment,
    /// Strategy-by-strategy trace for the winning page's chain run.
    pub trace: Vec<StrategyTrace>,
}

/// Run-level counters derived from the per-product reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub products: usize,
    /// Products with at least one official application.
    pub with_official: usize,
    /// Products that only yielded manufacturer fallback rows.
    pub fallback_only: usize,
    /// Products with no applications at all.
    pub no_fitment: usize,
    pub cache_hits: usize,
    pub timed_out: usize,
    pub rejected_records: usize,
    /// Winning strategy name to number of products it won.
    pub strategy_wins: BTreeMap<String, usize>,
}

/// Top-level report document for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub summary: BatchSummary,
    pub products: Vec<ProductReport>,
}

/// Aggregates per-product reports into run-level counters.
#[must_use]
pub fn build_summary(products: &[ProductReport]) -> BatchSummary {
    let mut summary = BatchSummary {
        products: products.len(),
        with_official: 0,
        fallback_only: 0,
        no_fitment: 0,
        cache_hits: 0,
        timed_out: 0,
        rejected_records: 0,
        strategy_wins: BTreeMap::new(),
    };

    for product in products {
        if product.fitment.official_count() > 0 {
            summary.with_official += 1;
        } else if product.fitment.fallback_count() > 0 {
            summary.fallback_only += 1;
        } else {
            summary.no_fitment += 1;
        }
        if product.from_cache {
            summary.cache_hits += 1;
        }
        if product.timed_out {
            summary.timed_out += 1;
        }
        summary.rejected_records += product.rejected_records;
        if let Some(strategy) = product.fitment.winning_strategy {
            *summary.strategy_wins.entry(strategy.to_string()).or_insert(0) += 1;
        }
    }

    summary
}

/// Writes the report as pretty-printed JSON to `output`, or stdout when
/// no path is given.
///
/// # Errors
///
/// Returns an error if serialization fails or the output file cannot be
/// written.
pub fn write_report(report: &BatchReport, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize batch report")?;
    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            tracing::info!(path = %path.display(), "batch report written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(json.as_bytes())
                .context("failed to write report to stdout")?;
            stdout
                .write_all(b"\n")
                .context("failed to write report to stdout")?;
        }
    }
    Ok(())
}
