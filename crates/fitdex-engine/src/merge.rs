//! Merge of extracted fitment with spreadsheet fallback rows.
//!
//! Official records always win: a fallback row that names the same vehicle
//! as an extracted record is dropped, and only vehicles the page never
//! mentioned are admitted from the fallback, marked with their origin and a
//! fixed low confidence.

use std::collections::HashSet;

use fitdex_core::{max_model_year, MergedFitment, Origin, VehicleApplication};

use crate::normalize::normalize_applications;
use crate::types::ExtractionResult;

/// Confidence assigned to records only the fallback source claims.
pub const FALLBACK_CONFIDENCE: f64 = 0.35;

/// Combine the winning extraction (if any) with fallback rows.
///
/// Fallback rows run through the same normalization as page output, so
/// case or spacing variants of an official record still deduplicate.
#[must_use]
pub fn merge_with_fallback(
    official: Option<&ExtractionResult>,
    fallback: &[VehicleApplication],
) -> MergedFitment {
    let mut applications: Vec<VehicleApplication> = official
        .map(|result| result.applications.clone())
        .unwrap_or_default();
    let mut seen: HashSet<String> = applications
        .iter()
        .map(VehicleApplication::identity_key)
        .collect();

    let mut fallback_rows = fallback.to_vec();
    for row in &mut fallback_rows {
        row.origin = Origin::Fallback;
        row.confidence = FALLBACK_CONFIDENCE;
    }
    let normalized = normalize_applications(fallback_rows, max_model_year());
    if normalized.rejected > 0 {
        tracing::debug!(
            rejected = normalized.rejected,
            "fallback rows dropped during normalization"
        );
    }

    let mut added = 0usize;
    for app in normalized.applications {
        if seen.insert(app.identity_key()) {
            applications.push(app);
            added += 1;
        }
    }
    tracing::debug!(
        official = applications.len() - added,
        fallback_added = added,
        "merged fitment assembled"
    );

    MergedFitment {
        applications,
        winning_strategy: official.map(|result| result.strategy),
        confidence: official.map_or(0.0, |result| result.confidence),
    }
}
