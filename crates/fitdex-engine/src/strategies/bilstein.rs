//! Bilstein catalog pages.
//!
//! Bilstein publishes fitment as labeled blocks ("Years: 2015 - 2020,
//! Make: Ford, Model: F-150, Trim: Lariat, Engine: 3.5L V6"), one block per
//! vehicle. Blocks are sliced apart at each `Years:` label and the fields
//! are read individually inside each slice. Pages without a single labeled
//! block fall back to the concatenated year-range format.

use std::sync::OnceLock;

use regex::Regex;
use scraper::Html;

use fitdex_core::application::collapse_whitespace;
use fitdex_core::{Origin, VehicleApplication};

use crate::error::StrategyError;
use crate::patterns::{parse_vehicle_line, split_fitment_segments};

fn years_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\byears?\s*:").expect("valid regex"))
}

fn years_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\byears?\s*:\s*((?:19|20)\d{2})(?:\s*[-\u{2013}\u{2014}]\s*((?:19|20)\d{2}))?",
        )
        .expect("valid regex")
    })
}

fn field_re(label: &str) -> Regex {
    // Values run to the next comma, semicolon, or line break.
    Regex::new(&format!(r"(?i)\b{label}\s*:\s*([^,;\n]+)")).expect("valid regex")
}

fn make_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| field_re("make"))
}

fn model_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| field_re("model"))
}

fn trim_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| field_re("trim"))
}

fn engine_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| field_re("engine"))
}

/// Text content with line structure kept. The labeled-field grammar relies
/// on line breaks to terminate values, so the shared whitespace-collapsing
/// helper is not used here.
fn visible_lines(raw: &str) -> String {
    let without_scripts = super::script_re().replace_all(raw, "\n");
    let without_styles = super::style_re().replace_all(&without_scripts, "\n");
    let document = Html::parse_document(&without_styles);
    document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join("\n")
}

fn capture_field(re: &Regex, block: &str) -> Option<String> {
    let value = collapse_whitespace(re.captures(block)?.get(1)?.as_str());
    (!value.is_empty()).then_some(value)
}

fn parse_block(block: &str) -> Option<VehicleApplication> {
    let years = years_value_re().captures(block)?;
    let year_start: i32 = years.get(1)?.as_str().parse().ok()?;
    let year_end: i32 = match years.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => year_start,
    };

    let make = capture_field(make_re(), block)?;
    let model = capture_field(model_re(), block)?;

    Some(VehicleApplication {
        make,
        model,
        year_start,
        year_end,
        trim: capture_field(trim_re(), block),
        engine: capture_field(engine_re(), block),
        origin: Origin::Official,
        confidence: 0.0,
    })
}

/// # Errors
///
/// Does not fail on unreadable blocks; blocks missing years, make, or model
/// are skipped. The shared blank-content guard runs before dispatch.
pub fn extract(raw_content: &str) -> Result<Vec<VehicleApplication>, StrategyError> {
    let text = visible_lines(raw_content);

    let starts: Vec<usize> = years_label_re()
        .find_iter(&text)
        .map(|m| m.start())
        .collect();

    if starts.is_empty() {
        // Older pages use the plain concatenated format.
        let flat = collapse_whitespace(&text);
        let applications = split_fitment_segments(&flat)
            .into_iter()
            .filter_map(parse_vehicle_line)
            .collect::<Vec<_>>();
        tracing::debug!(
            records = applications.len(),
            "bilstein extraction used unlabeled fallback"
        );
        return Ok(applications);
    }

    let mut applications = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        if let Some(app) = parse_block(&text[start..end]) {
            applications.push(app);
        }
    }
    tracing::debug!(
        blocks = starts.len(),
        records = applications.len(),
        "bilstein extraction finished"
    );
    Ok(applications)
}
