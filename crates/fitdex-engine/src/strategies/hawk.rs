//! Hawk Performance catalog pages.
//!
//! Hawk lists fitment as plain text, either semicolon-separated or run
//! together with no separator at all ("2016-2021 Honda Civic Si 2019-2022
//! Acura ILX"). Records are recovered by splitting on year-range starts
//! inside each semicolon chunk.

use fitdex_core::VehicleApplication;

use crate::error::StrategyError;
use crate::patterns::{parse_vehicle_line, split_fitment_segments};

/// # Errors
///
/// Does not fail on unreadable records; chunks that parse to nothing are
/// skipped. The shared blank-content guard runs before dispatch.
pub fn extract(raw_content: &str) -> Result<Vec<VehicleApplication>, StrategyError> {
    let text = super::visible_text(raw_content);

    let mut applications = Vec::new();
    for chunk in text.split(';') {
        for segment in split_fitment_segments(chunk) {
            if let Some(app) = parse_vehicle_line(segment) {
                applications.push(app);
            }
        }
    }
    tracing::debug!(
        records = applications.len(),
        "hawk extraction finished"
    );
    Ok(applications)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenated_records_are_split_into_three() {
        let content =
            "2016-2021 Honda Civic Si 2019-2022 Acura ILX 2018-2021 Honda Civic Type R";
        let apps = extract(content).unwrap();
        assert_eq!(apps.len(), 3);
        assert_eq!(apps[0].model, "Civic");
        assert_eq!(apps[0].trim.as_deref(), Some("Si"));
        assert_eq!(apps[1].make, "Acura");
        assert_eq!(apps[1].model, "ILX");
        assert_eq!(apps[2].trim.as_deref(), Some("Type R"));
    }

    #[test]
    fn semicolon_separated_records() {
        let content = "2010-2015 Chevrolet Camaro SS; 2012-2015 Chevrolet Camaro ZL1";
        let apps = extract(content).unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].trim.as_deref(), Some("SS"));
        assert_eq!(apps[1].trim.as_deref(), Some("ZL1"));
    }

    #[test]
    fn html_wrapper_is_stripped_first() {
        let content = "<div class=\"fitment\">2016-2021 Honda Civic Si; 2019 Acura ILX</div>";
        let apps = extract(content).unwrap();
        assert_eq!(apps.len(), 2);
    }

    #[test]
    fn no_fitment_text_yields_empty() {
        let apps = extract("Premium brake pads. Race proven.").unwrap();
        assert!(apps.is_empty());
    }
}
