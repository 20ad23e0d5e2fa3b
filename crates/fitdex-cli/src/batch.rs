//! Batch orchestration: read the product list, fan products out across a
//! bounded worker pool, run the extraction chain per page, merge fallback
//! rows, and populate the cache.
//!
//! Per-product work is wrapped in a wall-clock timeout; a product that
//! exceeds it is reported with its fallback rows only and nothing is
//! cached for it.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use futures::stream::{self, StreamExt};
use serde::Deserialize;

use fitdex_core::{AppConfig, BrandRegistry, VehicleApplication};
use fitdex_engine::cache::{source_key, FitmentCache};
use fitdex_engine::merge::merge_with_fallback;
use fitdex_engine::types::{ChainOutcome, ExtractionResult};
use fitdex_engine::{extract_fitment, parse_vehicle_line};

use crate::fetch::PageFetcher;
use crate::report::ProductReport;

/// Stop trying further URLs for a product once one wins at or above this
/// confidence.
const URL_STOP_CONFIDENCE: f64 = 0.7;

/// One product from the batch input file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub sku: String,
    /// Brand hint for the vendor resolver, e.g. `"Hawk Performance"`.
    #[serde(default)]
    pub brand: Option<String>,
    /// Candidate product pages, in priority order.
    #[serde(default)]
    pub urls: Vec<String>,
    /// Free-text fitment lines from the manufacturer feed, used when pages
    /// yield nothing and merged beneath official records otherwise.
    #[serde(default)]
    pub fallback: Vec<String>,
}

/// Top-level shape of the batch input file.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchInput {
    pub products: Vec<ProductInput>,
}

/// Shared state for one batch run.
pub struct RunContext {
    pub config: AppConfig,
    pub registry: BrandRegistry,
    pub cache: FitmentCache,
    /// `None` in offline mode; products then resolve from cache and
    /// fallback lines only.
    pub fetcher: Option<PageFetcher>,
}

/// Reads and parses the batch input file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid JSON.
pub fn load_batch_input(path: &Path) -> anyhow::Result<BatchInput> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read batch input {}", path.display()))?;
    let input: BatchInput = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse batch input {}", path.display()))?;
    Ok(input)
}

/// Keeps only products whose brand matches `brand`, resolving aliases
/// through the registry so `--brand hawk` matches `"Hawk Performance"`.
/// `None` keeps everything.
#[must_use]
pub fn filter_products(
    products: Vec<ProductInput>,
    registry: &BrandRegistry,
    brand: Option<&str>,
) -> Vec<ProductInput> {
    let Some(wanted) = brand else {
        return products;
    };
    let canonical = registry.lookup(wanted).map(|entry| entry.name.clone());
    let target = canonical.as_deref().unwrap_or(wanted);

    let before = products.len();
    let kept: Vec<ProductInput> = products
        .into_iter()
        .filter(|product| {
            product.brand.as_deref().is_some_and(|name| {
                let resolved = registry
                    .lookup(name)
                    .map_or(name, |entry| entry.name.as_str());
                resolved.eq_ignore_ascii_case(target)
            })
        })
        .collect();
    tracing::info!(
        brand = %wanted,
        kept = kept.len(),
        skipped = before - kept.len(),
        "filtered batch by brand"
    );
    kept
}

/// Processes all products through a bounded worker pool and returns one
/// report per product, in input order.
pub async fn run_batch(ctx: &RunContext, products: Vec<ProductInput>) -> Vec<ProductReport> {
    let max_concurrent = ctx.config.max_concurrent_products.max(1);
    let timeout = Duration::from_secs(ctx.config.product_timeout_secs);

    let mut indexed: Vec<(usize, ProductReport)> = stream::iter(products.into_iter().enumerate())
        .map(|(idx, product)| async move {
            let report =
                match tokio::time::timeout(timeout, process_product(ctx, &product)).await {
                    Ok(report) => report,
                    Err(_) => timed_out_report(&product),
                };
            (idx, report)
        })
        .buffer_unordered(max_concurrent)
        .collect()
        .await;

    // buffer_unordered yields in completion order; restore input order so
    // the report is deterministic.
    indexed.sort_by_key(|(idx, _)| *idx);
    indexed.into_iter().map(|(_, report)| report).collect()
}

async fn process_product(ctx: &RunContext, product: &ProductInput) -> ProductReport {
    let mut best: Option<(String, ChainOutcome)> = None;
    let mut rejected_records: usize = 0;

    for url in product.urls.iter().take(ctx.config.max_urls_per_product) {
        if let Some(fitment) = ctx.cache.get(&source_key(url, "")) {
            tracing::debug!(sku = %product.sku, url = %url, "cache hit");
            return ProductReport {
                sku: product.sku.clone(),
                source_url: Some(url.clone()),
                from_cache: true,
                timed_out: false,
                rejected_records: 0,
                fitment,
                trace: Vec::new(),
            };
        }

        let Some(fetcher) = &ctx.fetcher else {
            tracing::debug!(sku = %product.sku, url = %url, "offline, skipping fetch");
            continue;
        };
        let content = match fetcher.fetch_page(url).await {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(sku = %product.sku, url = %url, error = %err, "page fetch failed");
                continue;
            }
        };

        let outcome = extract_fitment(&ctx.registry, product.brand.as_deref(), url, &content);
        rejected_records += outcome.rejected_records;
        let confidence = outcome
            .winner
            .as_ref()
            .map_or(0.0, |winner| winner.confidence);
        let best_confidence = best.as_ref().map_or(-1.0, |(_, held)| {
            held.winner.as_ref().map_or(0.0, |winner| winner.confidence)
        });
        if confidence > best_confidence {
            best = Some((url.clone(), outcome));
        }
        if confidence >= URL_STOP_CONFIDENCE {
            break;
        }
    }

    let fallback_rows = parse_fallback_lines(&product.sku, &product.fallback);

    let mut source_url: Option<String> = None;
    let mut trace = Vec::new();
    let mut winner: Option<ExtractionResult> = None;
    if let Some((url, outcome)) = best {
        trace = outcome.trace;
        winner = outcome.winner;
        if winner.is_some() {
            source_url = Some(url);
        }
    }

    let fitment = merge_with_fallback(winner.as_ref(), &fallback_rows);

    // Cache keyed by the winning page so the next run short-circuits it.
    if winner.is_some() {
        if let Some(url) = &source_url {
            ctx.cache.put(source_key(url, ""), fitment.clone());
        }
    }
    if fitment.is_empty() {
        tracing::warn!(sku = %product.sku, "no fitment found");
    }

    ProductReport {
        sku: product.sku.clone(),
        source_url,
        from_cache: false,
        timed_out: false,
        rejected_records,
        fitment,
        trace,
    }
}

/// Report for a product whose extraction exceeded the per-product timeout.
/// Only its fallback lines survive; the cache is left untouched.
fn timed_out_report(product: &ProductInput) -> ProductReport {
    tracing::warn!(sku = %product.sku, "product timed out, keeping fallback rows only");
    let fallback_rows = parse_fallback_lines(&product.sku, &product.fallback);
    ProductReport {
        sku: product.sku.clone(),
        source_url: None,
        from_cache: false,
        timed_out: true,
        rejected_records: 0,
        fitment: merge_with_fallback(None, &fallback_rows),
        trace: Vec::new(),
    }
}

fn parse_fallback_lines(sku: &str, lines: &[String]) -> Vec<VehicleApplication> {
    let mut rows = Vec::new();
    for line in lines {
        match parse_vehicle_line(line) {
            Some(application) => rows.push(application),
            None => {
                tracing::warn!(sku = %sku, line = %line, "unparsable fallback line, skipping");
            }
        }
    }
    rows
}
