//! Free-text fitment scan.
//!
//! Prose pages name vehicles in two shapes: year-first ("2016-2021 Honda
//! Civic Si") and make-first ("Honda Civic 2016-2021"). Year-first records
//! are found with the shared segment splitter and kept only when the make
//! is in the known vocabulary, which filters out phrases like "Established
//! 1998 Our Company". The make-first pattern is anchored on the vocabulary
//! itself and runs only when no year-first record exists, so its year
//! capture can never reach across into a neighboring year-first record.

use std::sync::OnceLock;

use regex::Regex;

use fitdex_core::{makes, Origin, VehicleApplication};

use crate::error::StrategyError;
use crate::patterns::{parse_vehicle_line, split_engine_and_trim, split_fitment_segments};

fn make_first_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation = makes::all_spellings()
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        // Model words start with a letter so a year can never be read as a
        // model word.
        Regex::new(&format!(
            r"(?i)\b({alternation})\s+((?:[A-Za-z][\w\-]*)(?:\s+[A-Za-z][\w\-]*){{0,3}})[\s,]*\(?((?:19|20)\d{{2}})(?:\s*[-\u{{2013}}\u{{2014}}]\s*((?:19|20)\d{{2}}))?\)?"
        ))
        .expect("valid regex")
    })
}

/// # Errors
///
/// Does not fail; unmatched text simply yields nothing.
pub fn extract(raw_content: &str) -> Result<Vec<VehicleApplication>, StrategyError> {
    let text = super::visible_text(raw_content);

    let mut applications: Vec<VehicleApplication> = split_fitment_segments(&text)
        .into_iter()
        .map(clause_of)
        .filter_map(parse_vehicle_line)
        .filter(|app| makes::canonical_make(&app.make).is_some())
        .collect();

    if applications.is_empty() {
        applications = extract_make_first(&text);
    }

    tracing::debug!(
        records = applications.len(),
        "text extraction finished"
    );
    Ok(applications)
}

/// Cut a segment at the first sentence boundary so trailing prose never
/// lands in the trim field. Bare periods inside tokens like `4.0L` survive
/// because only a period followed by a space ends a sentence.
fn clause_of(segment: &str) -> &str {
    let end = [". ", "! ", "? "]
        .iter()
        .filter_map(|sep| segment.find(sep))
        .min()
        .unwrap_or(segment.len());
    &segment[..end]
}

fn extract_make_first(text: &str) -> Vec<VehicleApplication> {
    make_first_re()
        .captures_iter(text)
        .filter_map(|caps| {
            let make = caps.get(1)?.as_str().to_string();
            let words: Vec<&str> = caps.get(2)?.as_str().split_whitespace().collect();
            let model = (*words.first()?).to_string();
            let year_start: i32 = caps.get(3)?.as_str().parse().ok()?;
            let year_end: i32 = match caps.get(4) {
                Some(m) => m.as_str().parse().ok()?,
                None => year_start,
            };
            let (engine, trim) = split_engine_and_trim(&words[1..].join(" "));
            Some(VehicleApplication {
                make,
                model,
                year_start,
                year_end,
                trim,
                engine,
                origin: Origin::Official,
                confidence: 0.0,
            })
        })
        .collect()
}
