//! Canonicalization and deduplication of raw strategy output.
//!
//! Strategies return whatever the page said; this pass folds spelling
//! variants onto canonical makes, collapses whitespace, rejects records
//! with missing mandatory fields or implausible year ranges, and collapses
//! duplicates. Rejects are counted, not silently dropped, so the chain can
//! report them per product.

use std::collections::HashMap;

use fitdex_core::application::collapse_whitespace;
use fitdex_core::{makes, VehicleApplication};

/// Result of one normalization pass.
#[derive(Debug)]
pub struct NormalizeOutcome {
    pub applications: Vec<VehicleApplication>,
    /// Records dropped for missing fields or implausible years. Duplicates
    /// are not rejects.
    pub rejected: usize,
}

/// Normalize raw applications, preserving extraction order.
///
/// Duplicates keep their first-seen position; a later duplicate replaces
/// the kept record only when its confidence is strictly higher, so output
/// order stays deterministic for equal inputs.
#[must_use]
pub fn normalize_applications(raw: Vec<VehicleApplication>, max_year: i32) -> NormalizeOutcome {
    let mut applications: Vec<VehicleApplication> = Vec::with_capacity(raw.len());
    let mut index_by_key: HashMap<String, usize> = HashMap::new();
    let mut rejected = 0usize;

    for mut app in raw {
        app.make = normalize_make(&app.make);
        app.model = collapse_whitespace(&app.model);
        app.trim = clean_optional(app.trim.take());
        app.engine = clean_optional(app.engine.take());

        if app.make.is_empty() || app.model.is_empty() {
            rejected += 1;
            tracing::debug!("rejected record with missing make or model");
            continue;
        }
        if !app.has_valid_years(max_year) {
            rejected += 1;
            tracing::debug!(
                make = %app.make,
                model = %app.model,
                years = %app.year_label(),
                "rejected record with implausible years"
            );
            continue;
        }

        let key = app.identity_key();
        if let Some(&idx) = index_by_key.get(&key) {
            if app.confidence > applications[idx].confidence {
                applications[idx] = app;
            }
        } else {
            index_by_key.insert(key, applications.len());
            applications.push(app);
        }
    }

    NormalizeOutcome {
        applications,
        rejected,
    }
}

/// Canonical spelling for known makes, title case for the rest.
fn normalize_make(raw: &str) -> String {
    let collapsed = collapse_whitespace(raw);
    match makes::canonical_make(&collapsed) {
        Some(canonical) => canonical.to_string(),
        None => title_case(&collapsed),
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|s| collapse_whitespace(&s))
        .filter(|s| !s.is_empty())
}
