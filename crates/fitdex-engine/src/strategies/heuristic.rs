//! Last-resort heuristic scan.
//!
//! Runs the permissive year-first parser over the visible text and keeps
//! only matches with enough corroborating signals. Each candidate earns a
//! density score; anything under the acceptance floor is dropped. The
//! density is stored as the record's own confidence so deduplication can
//! prefer the stronger duplicate.

use fitdex_core::{makes, max_model_year, VehicleApplication};

use crate::error::StrategyError;
use crate::patterns::{parse_vehicle_line, split_fitment_segments};

/// Minimum signal density for a candidate to count as fitment.
const ACCEPT_FLOOR: f64 = 0.7;

fn is_model_shaped(model: &str) -> bool {
    !model.is_empty()
        && model.len() <= 20
        && model.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn signal_density(app: &VehicleApplication, max_year: i32) -> f64 {
    let mut density: f64 = 0.45;
    if makes::canonical_make(&app.make).is_some() {
        density += 0.35;
    }
    if app.has_valid_years(max_year) {
        density += 0.2;
    }
    if is_model_shaped(&app.model) {
        density += 0.1;
    }
    density.min(1.0)
}

/// # Errors
///
/// Does not fail; candidates below the acceptance floor are dropped.
pub fn extract(raw_content: &str) -> Result<Vec<VehicleApplication>, StrategyError> {
    let text = super::visible_text(raw_content);
    let max_year = max_model_year();

    let mut applications = Vec::new();
    let mut dropped = 0usize;
    for segment in split_fitment_segments(&text) {
        let Some(mut app) = parse_vehicle_line(segment) else {
            continue;
        };
        let density = signal_density(&app, max_year);
        if density < ACCEPT_FLOOR {
            dropped += 1;
            continue;
        }
        app.confidence = density;
        applications.push(app);
    }
    tracing::debug!(
        records = applications.len(),
        dropped,
        "heuristic extraction finished"
    );
    Ok(applications)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_make_candidates_are_accepted() {
        let apps = extract("2016-2021 Honda Civic Si").unwrap();
        assert_eq!(apps.len(), 1);
        assert!(apps[0].confidence >= ACCEPT_FLOOR);
    }

    #[test]
    fn unknown_make_needs_year_and_model_shape() {
        // Plausible year plus a model-shaped word clears the floor even for
        // an unknown marque.
        let apps = extract("2016 Zephyr Quantum").unwrap();
        assert_eq!(apps.len(), 1);
        assert!((apps[0].confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn far_future_year_with_unknown_make_is_dropped() {
        let apps = extract("2098 Zephyr Quantum").unwrap();
        assert!(apps.is_empty());
    }

    #[test]
    fn garbage_model_with_unknown_make_is_dropped() {
        let apps = extract("2016 Zephyr !!!").unwrap();
        assert!(apps.is_empty());
    }

    #[test]
    fn known_make_survives_a_reversed_range() {
        // Make signal alone reaches the floor; the normalizer still rejects
        // the reversed range later and counts it.
        let apps = extract("2021-2016 Honda Civic").unwrap();
        assert_eq!(apps.len(), 1);
        assert!((apps[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn prose_without_vehicles_yields_nothing() {
        let apps = extract("Shipped worldwide since the early days.").unwrap();
        assert!(apps.is_empty());
    }
}
