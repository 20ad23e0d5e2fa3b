//! Year-range and vehicle-record text patterns shared by the extraction
//! strategies and the fallback-line parser.
//!
//! The central invariant lives here: fitment text that concatenates several
//! `"YYYY-YYYY Make Model Trim"` records back to back is split on year-range
//! boundaries so each vehicle is recovered on its own. No field of one
//! record may swallow the next record's text.

use std::sync::OnceLock;

use regex::Regex;

use fitdex_core::application::collapse_whitespace;
use fitdex_core::{makes, Origin, VehicleApplication};

/// Start of a fitment record: a 4-digit year, an optional dash-joined second
/// year, then a capitalized word (the make). The `regex` crate has no
/// lookahead, so segmentation works from match start offsets instead.
fn record_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:19|20)\d{2}(?:\s*[-\u{2013}\u{2014}]\s*(?:19|20)\d{2})?\s+[A-Z]")
            .expect("valid regex")
    })
}

/// A year or dash-joined year range, captured for parsing.
fn year_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b((?:19|20)\d{2})(?:\s*[-\u{2013}\u{2014}]\s*((?:19|20)\d{2}))?\b")
            .expect("valid regex")
    })
}

/// Engine descriptor tokens: displacement (`2.0L`, `3.5L V6`, `2.0L Turbo`),
/// bare forced induction (`2.5 Turbo`), or cylinder layout (`V6`).
fn engine_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:\d+(?:\.\d+)?\s*l(?:\s*turbo|\s*v\d{1,2}|\s*i\d)?|\d+(?:\.\d+)?\s*turbo|v\d{1,2})\b",
        )
        .expect("valid regex")
    })
}

/// Split text into per-record segments at year-range boundaries.
///
/// Each returned segment starts at its own year token and runs to the next
/// record's year token (or end of text). Text before the first year token is
/// dropped. Returns an empty vector when no record start is found.
#[must_use]
pub fn split_fitment_segments(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = record_start_re()
        .find_iter(text)
        .map(|m| m.start())
        .collect();

    let mut segments = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        let segment = text[start..end].trim();
        if !segment.is_empty() {
            segments.push(segment);
        }
    }
    segments
}

/// Parse one fitment line of the form `"[junk] YYYY[-YYYY] Make Model
/// [Trim] [Engine]"` into a raw application.
///
/// Rules:
/// 1. The first year token anchors the record; anything before it is ignored.
/// 2. The first one or two words after the years form the make; two words are
///    taken only when they spell a known make (`Land Rover`).
/// 3. The next word is the model; it is mandatory.
/// 4. Remaining words are split into an engine descriptor (if one matches)
///    and the trim.
///
/// Returns `None` when no year or no model can be found. Year-range sanity
/// is left to normalization so rejects can be counted there.
#[must_use]
pub fn parse_vehicle_line(line: &str) -> Option<VehicleApplication> {
    let caps = year_range_re().captures(line)?;
    let year_match = caps.get(0)?;
    let year_start: i32 = caps.get(1)?.as_str().parse().ok()?;
    let year_end: i32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => year_start,
    };

    let tail = &line[year_match.end()..];
    let mut words: Vec<&str> = tail
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| matches!(c, ',' | ';' | ':' | '.' | '(' | ')')))
        .filter(|w| !w.is_empty())
        .collect();

    // The make must start with a letter; shed separator tokens like "-".
    while words
        .first()
        .is_some_and(|w| !w.chars().next().is_some_and(char::is_alphabetic))
    {
        words.remove(0);
    }
    if words.len() < 2 {
        return None;
    }

    let two_word = format!("{} {}", words[0], words[1]);
    let (make, model_idx) = if words.len() >= 3 && makes::canonical_make(&two_word).is_some() {
        (two_word, 2)
    } else {
        (words[0].to_string(), 1)
    };

    let model = (*words.get(model_idx)?).to_string();
    if model.is_empty() {
        return None;
    }

    let rest = words[model_idx + 1..].join(" ");
    let (engine, trim) = split_engine_and_trim(&rest);

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
}

/// Parse a standalone year cell: `"2016"`, `"2016-2021"`, `"2016 - 2021"`.
/// The whole token must be the year expression; free text is rejected.
#[must_use]
pub fn parse_year_token(token: &str) -> Option<(i32, i32)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^\s*((?:19|20)\d{2})(?:\s*[-\u{2013}\u{2014}]\s*((?:19|20)\d{2}))?\s*$")
            .expect("valid regex")
    });
    let caps = re.captures(token)?;
    let start: i32 = caps.get(1)?.as_str().parse().ok()?;
    let end: i32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => start,
    };
    Some((start, end))
}

/// Separate an engine descriptor from trim text. The first engine-shaped
/// token is lifted out; whatever remains (both sides of it) is the trim.
pub(crate) fn split_engine_and_trim(rest: &str) -> (Option<String>, Option<String>) {
    if rest.trim().is_empty() {
        return (None, None);
    }
    if let Some(m) = engine_re().find(rest) {
        let engine = collapse_whitespace(m.as_str());
        let leftover = format!("{} {}", &rest[..m.start()], &rest[m.end()..]);
        let trim = collapse_whitespace(&leftover);
        (Some(engine), (!trim.is_empty()).then_some(trim))
    } else {
        (None, Some(collapse_whitespace(rest)))
    }
}
