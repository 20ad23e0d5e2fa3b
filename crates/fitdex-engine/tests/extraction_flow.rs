//! End-to-end extraction runs: resolve, chain, merge, cache.

use std::path::PathBuf;

use fitdex_core::{BrandCategory, BrandEntry, BrandRegistry, Origin, StrategyId};
use fitdex_engine::cache::{source_key, FitmentCache};
use fitdex_engine::chain::HIGH_CONFIDENCE;
use fitdex_engine::merge::merge_with_fallback;
use fitdex_engine::{extract_fitment, parse_vehicle_line};

fn entry(
    name: &str,
    category: BrandCategory,
    domains: &[&str],
    authority: u8,
    preferred: Option<StrategyId>,
) -> BrandEntry {
    BrandEntry {
        name: name.to_string(),
        category,
        domains: domains.iter().map(ToString::to_string).collect(),
        authority,
        preferred_strategy: preferred,
        aliases: vec![],
    }
}

fn registry() -> BrandRegistry {
    BrandRegistry::from_entries(vec![
        entry(
            "Hawk Performance",
            BrandCategory::Performance,
            &["hawkperformance.com"],
            90,
            Some(StrategyId::HawkPerformance),
        ),
        entry(
            "Bilstein",
            BrandCategory::Performance,
            &["bilstein.com"],
            88,
            Some(StrategyId::Bilstein),
        ),
        entry("Ford", BrandCategory::Oem, &["ford.com"], 95, None),
    ])
}

#[test]
fn concatenated_hawk_fitment_splits_into_exactly_three_records() {
    let reg = registry();
    let content = "2016-2021 Honda Civic Si 2019-2022 Acura ILX 2018-2021 Honda Civic Type R";

    let outcome = extract_fitment(
        &reg,
        Some("Hawk Performance"),
        "https://hawkperformance.com/p/hb145",
        content,
    );

    let winner = outcome.winner.expect("hawk parser should win");
    assert_eq!(winner.strategy, StrategyId::HawkPerformance);
    assert!(winner.confidence >= HIGH_CONFIDENCE);
    assert_eq!(winner.applications.len(), 3);

    let apps = &winner.applications;
    assert_eq!(
        (apps[0].make.as_str(), apps[0].model.as_str(), apps[0].trim.as_deref()),
        ("Honda", "Civic", Some("Si"))
    );
    assert_eq!((apps[0].year_start, apps[0].year_end), (2016, 2021));
    assert_eq!(
        (apps[1].make.as_str(), apps[1].model.as_str(), apps[1].trim.as_deref()),
        ("Acura", "ILX", None)
    );
    assert_eq!((apps[1].year_start, apps[1].year_end), (2019, 2022));
    assert_eq!(
        (apps[2].make.as_str(), apps[2].model.as_str(), apps[2].trim.as_deref()),
        ("Honda", "Civic", Some("Type R"))
    );
    assert_eq!((apps[2].year_start, apps[2].year_end), (2018, 2021));
    assert!(apps.iter().all(|a| a.origin == Origin::Official));
}

#[test]
fn bilstein_labeled_blocks_win_via_brand_hint() {
    let reg = registry();
    let content = "Years: 2015 - 2020, Make: Ford, Model: F-150, Trim: Lariat, Engine: 3.5L V6\n\
                   Years: 2019, Make: Ram, Model: 1500";

    let outcome = extract_fitment(&reg, Some("Bilstein"), "https://example.com/p/1", content);
    let winner = outcome.winner.unwrap();
    assert_eq!(winner.strategy, StrategyId::Bilstein);
    assert_eq!(winner.applications.len(), 2);
    assert_eq!(winner.applications[0].engine.as_deref(), Some("3.5L V6"));
}

#[test]
fn json_ld_wins_for_a_vendor_resolved_by_domain() {
    let reg = registry();
    let page = r#"<html><head><script type="application/ld+json">
        {"@type": "Product", "isAccessoryOrSparePartFor": [
            {"@type": "Vehicle", "brand": "Ford", "model": "Mustang",
             "vehicleModelDate": "2015-2023", "vehicleConfiguration": "GT",
             "vehicleEngine": {"name": "5.0L V8"}}]}
        </script></head><body></body></html>"#;

    let outcome = extract_fitment(&reg, None, "https://parts.ford.com/p/m1", page);
    let winner = outcome.winner.unwrap();
    assert_eq!(winner.strategy, StrategyId::StructuredData);
    // Early stop: nothing after the winning strategy was attempted.
    assert_eq!(outcome.trace.len(), 1);
    assert_eq!(winner.applications[0].model, "Mustang");
}

#[test]
fn fitment_table_from_an_unknown_vendor_still_extracts() {
    let reg = registry();
    let page = r"<table>
        <tr><th>Year</th><th>Make</th><th>Model</th><th>Trim</th></tr>
        <tr><td>2005-2023</td><td>Toyota</td><td>Tacoma</td><td>TRD</td></tr>
        <tr><td>2010-2015</td><td>Ford</td><td>F150</td><td>XLT</td></tr>
    </table>";

    let outcome = extract_fitment(&reg, None, "https://unknownparts.example/p/9", page);
    let winner = outcome.winner.unwrap();
    assert_eq!(winner.strategy, StrategyId::Table);
    assert_eq!(winner.applications.len(), 2);
    assert!(winner.confidence > 0.0);
}

#[test]
fn page_without_fitment_reports_no_official_data_not_an_error() {
    let reg = registry();
    let page = "<html><body><h1>Premium Brake Pads</h1>\
                <p>Track-ready stopping power with low dust.</p></body></html>";

    let outcome = extract_fitment(&reg, None, "https://unknownparts.example/p/9", page);
    assert!(outcome.no_fitment_found());
    assert_eq!(outcome.trace.len(), StrategyId::GENERIC_ORDER.len());
    assert!(outcome.trace.iter().all(|t| t.error.is_none()));
    assert_eq!(outcome.rejected_records, 0);
}

#[test]
fn severely_malformed_html_degrades_without_panicking() {
    let reg = registry();
    let page = "<table><tr><td>2016<div<<html <ul><li>2016-2021 Honda Civic Si</li>\x00\u{fffd}";

    let outcome = extract_fitment(&reg, None, "https://unknownparts.example/p/9", page);
    let winner = outcome.winner.unwrap();
    assert!(winner
        .applications
        .iter()
        .any(|a| a.make == "Honda" && a.model == "Civic"));
}

#[test]
fn extraction_is_deterministic_across_runs() {
    let reg = registry();
    let page = r"<ul>
        <li>2016-2021 Honda Civic Si</li>
        <li>2019-2022 Acura ILX</li>
        <li>2016-2021 Honda Civic Si</li>
    </ul>";

    let first = extract_fitment(&reg, None, "https://unknownparts.example/p/9", page);
    let second = extract_fitment(&reg, None, "https://unknownparts.example/p/9", page);

    let a = serde_json::to_value(&first.winner.unwrap().applications).unwrap();
    let b = serde_json::to_value(&second.winner.unwrap().applications).unwrap();
    assert_eq!(a, b);
}

#[test]
fn official_extraction_beats_fallback_duplicates_in_the_merge() {
    let reg = registry();
    let page = r"<table>
        <tr><th>Year</th><th>Make</th><th>Model</th></tr>
        <tr><td>2005-2023</td><td>Toyota</td><td>Tacoma</td></tr>
    </table>";
    let outcome = extract_fitment(&reg, None, "https://unknownparts.example/p/9", page);

    // Spreadsheet rows arrive as free text and go through the line parser.
    let fallback: Vec<_> = ["2005-2023 toyota tacoma", "2010-2015 Ford F150"]
        .iter()
        .filter_map(|line| parse_vehicle_line(line))
        .collect();
    assert_eq!(fallback.len(), 2);

    let merged = merge_with_fallback(outcome.winner.as_ref(), &fallback);
    assert_eq!(merged.applications.len(), 2);
    assert_eq!(merged.applications[0].make, "Toyota");
    assert_eq!(merged.applications[0].origin, Origin::Official);
    assert_eq!(merged.applications[1].make, "Ford");
    assert_eq!(merged.applications[1].origin, Origin::Fallback);
    assert_eq!(merged.winning_strategy, Some(StrategyId::Table));
}

#[test]
fn merged_fitment_survives_a_cache_round_trip_with_origins() {
    let reg = registry();
    let content = "2016-2021 Honda Civic Si 2019-2022 Acura ILX 2018-2021 Honda Civic Type R";
    let url = "https://hawkperformance.com/p/hb145";

    let outcome = extract_fitment(&reg, Some("Hawk Performance"), url, content);
    let fallback = vec![parse_vehicle_line("2010-2015 Ford F150").unwrap()];
    let merged = merge_with_fallback(outcome.winner.as_ref(), &fallback);

    let path = cache_path("flow-roundtrip");
    let key = source_key(url, content);
    let cache = FitmentCache::new();
    cache.put(key.clone(), merged.clone());
    cache.persist(&path).unwrap();

    let reloaded = FitmentCache::load(&path).unwrap();
    let restored = reloaded.get(&key).expect("cache hit after reload");

    let before = serde_json::to_value(&merged).unwrap();
    let after = serde_json::to_value(&restored).unwrap();
    assert_eq!(before, after);
    assert_eq!(restored.official_count(), 3);
    assert_eq!(restored.fallback_count(), 1);

    let _ = std::fs::remove_file(&path);
}

fn cache_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("fitdex-{name}-{}.json", std::process::id()))
}
