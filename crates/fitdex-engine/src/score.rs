//! Confidence scoring and winner selection.
//!
//! A strategy's confidence is its trust prior shaped by two multiplicative
//! factors: how complete the records are (trim and engine populated) and
//! how authoritative the source vendor is. Factors only attenuate, so a
//! low-trust strategy can never outscore a brand parser on volume alone.

use fitdex_core::{BrandEntry, StrategyId, VehicleApplication};

use crate::types::ExtractionResult;

/// Authority assumed for vendors missing from the registry.
pub const DEFAULT_AUTHORITY: u8 = 50;

/// Base trust in each strategy's output before page-specific factors.
fn strategy_prior(strategy: StrategyId) -> f64 {
    match strategy {
        StrategyId::HawkPerformance | StrategyId::Bilstein => 1.0,
        StrategyId::StructuredData => 0.92,
        StrategyId::Table => 0.85,
        StrategyId::List => 0.75,
        StrategyId::Text => 0.60,
        StrategyId::Heuristic => 0.45,
        StrategyId::Fallback => 0.0,
    }
}

/// Confidence for one strategy's normalized output.
#[must_use]
pub fn score(
    strategy: StrategyId,
    applications: &[VehicleApplication],
    brand: Option<&BrandEntry>,
) -> f64 {
    if applications.is_empty() {
        return 0.0;
    }

    let complete = applications.iter().filter(|a| a.is_complete()).count();
    #[allow(clippy::cast_precision_loss)]
    let ratio = complete as f64 / applications.len() as f64;
    let completeness = 0.85 + 0.15 * ratio;

    let authority = brand.map_or(DEFAULT_AUTHORITY, |b| b.authority);
    let authority_factor = 0.6 + 0.4 * (f64::from(authority) / 100.0);

    (strategy_prior(strategy) * completeness * authority_factor).clamp(0.0, 1.0)
}

/// Highest-confidence successful result; earlier results win ties so the
/// strategy order is the tiebreak.
#[must_use]
pub fn select_winner(results: &[ExtractionResult]) -> Option<&ExtractionResult> {
    let mut winner: Option<&ExtractionResult> = None;
    for result in results.iter().filter(|r| r.succeeded) {
        match winner {
            Some(best) if result.confidence <= best.confidence => {}
            _ => winner = Some(result),
        }
    }
    winner
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitdex_core::{BrandCategory, Origin, VehicleApplication};

    fn apps(complete: usize, incomplete: usize) -> Vec<VehicleApplication> {
        let mut out = Vec::new();
        for i in 0..complete + incomplete {
            out.push(VehicleApplication {
                make: "Honda".to_string(),
                model: format!("Civic{i}"),
                year_start: 2016,
                year_end: 2021,
                trim: (i < complete).then(|| "Si".to_string()),
                engine: (i < complete).then(|| "1.5L Turbo".to_string()),
                origin: Origin::Official,
                confidence: 0.0,
            });
        }
        out
    }

    fn brand(authority: u8) -> BrandEntry {
        BrandEntry {
            name: "Hawk Performance".to_string(),
            category: BrandCategory::Performance,
            domains: vec![],
            authority,
            preferred_strategy: None,
            aliases: vec![],
        }
    }

    fn result(strategy: StrategyId, confidence: f64, succeeded: bool) -> ExtractionResult {
        ExtractionResult {
            strategy,
            applications: apps(0, 1),
            confidence,
            succeeded,
        }
    }

    #[test]
    fn empty_output_scores_zero() {
        assert_eq!(score(StrategyId::Table, &[], Some(&brand(90))), 0.0);
    }

    #[test]
    fn fallback_strategy_scores_zero() {
        assert_eq!(score(StrategyId::Fallback, &apps(1, 0), None), 0.0);
    }

    #[test]
    fn priors_rank_strategies() {
        let records = apps(1, 1);
        let b = brand(90);
        let ranked: Vec<f64> = [
            StrategyId::HawkPerformance,
            StrategyId::StructuredData,
            StrategyId::Table,
            StrategyId::List,
            StrategyId::Text,
            StrategyId::Heuristic,
        ]
        .iter()
        .map(|&s| score(s, &records, Some(&b)))
        .collect();
        for pair in ranked.windows(2) {
            assert!(pair[0] > pair[1], "priors out of order: {ranked:?}");
        }
    }

    #[test]
    fn complete_records_raise_the_score() {
        let b = brand(90);
        let partial = score(StrategyId::Table, &apps(0, 2), Some(&b));
        let complete = score(StrategyId::Table, &apps(2, 0), Some(&b));
        assert!(complete > partial);
    }

    #[test]
    fn higher_authority_raises_the_score() {
        let low = score(StrategyId::Table, &apps(1, 0), Some(&brand(40)));
        let high = score(StrategyId::Table, &apps(1, 0), Some(&brand(95)));
        assert!(high > low);
    }

    #[test]
    fn unknown_vendor_uses_the_default_authority() {
        let unknown = score(StrategyId::Table, &apps(1, 0), None);
        let default = score(StrategyId::Table, &apps(1, 0), Some(&brand(DEFAULT_AUTHORITY)));
        assert!((unknown - default).abs() < 1e-12);
    }

    #[test]
    fn brand_parser_on_trusted_vendor_clears_the_short_circuit_bar() {
        let confidence = score(StrategyId::HawkPerformance, &apps(0, 3), Some(&brand(90)));
        assert!(confidence >= 0.8, "got {confidence}");
    }

    #[test]
    fn winner_is_highest_confidence_successful_result() {
        let results = vec![
            result(StrategyId::StructuredData, 0.6, true),
            result(StrategyId::Table, 0.75, true),
            result(StrategyId::Text, 0.9, false),
        ];
        let winner = select_winner(&results).unwrap();
        assert_eq!(winner.strategy, StrategyId::Table);
    }

    #[test]
    fn ties_keep_the_earlier_strategy() {
        let results = vec![
            result(StrategyId::StructuredData, 0.7, true),
            result(StrategyId::Table, 0.7, true),
        ];
        assert_eq!(
            select_winner(&results).unwrap().strategy,
            StrategyId::StructuredData
        );
    }

    #[test]
    fn no_successful_results_means_no_winner() {
        let results = vec![result(StrategyId::Table, 0.9, false)];
        assert!(select_winner(&results).is_none());
    }
}
