//! Fitment bullet lists.
//!
//! Each `<li>` that carries a year token is treated as one or more fitment
//! lines; a single bullet may still concatenate several records, so the
//! year-boundary splitter runs inside each item.

use scraper::{Html, Selector};

use fitdex_core::application::collapse_whitespace;
use fitdex_core::VehicleApplication;

use crate::error::StrategyError;
use crate::patterns::{parse_vehicle_line, split_fitment_segments};

/// # Errors
///
/// Does not fail on malformed markup; items without a parsable fitment line
/// are skipped.
pub fn extract(raw_content: &str) -> Result<Vec<VehicleApplication>, StrategyError> {
    let document = Html::parse_document(raw_content);
    let item_sel = Selector::parse("ul li, ol li").expect("valid selector");

    let mut applications = Vec::new();
    for item in document.select(&item_sel) {
        let text = collapse_whitespace(&item.text().collect::<Vec<_>>().join(" "));
        for segment in split_fitment_segments(&text) {
            if let Some(app) = parse_vehicle_line(segment) {
                applications.push(app);
            }
        }
    }
    tracing::debug!(
        records = applications.len(),
        "list extraction finished"
    );
    Ok(applications)
}
