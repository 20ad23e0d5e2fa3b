//! Canonical vehicle-application records: the unit of fitment data produced
//! by extraction and consumed by the merge and cache layers.

use serde::{Deserialize, Serialize};

/// Oldest model year accepted anywhere in the pipeline.
pub const MIN_MODEL_YEAR: i32 = 1900;

/// Model years may run slightly ahead of the calendar (next-year models are
/// announced mid-year), so the upper bound is the current year plus two.
#[must_use]
pub fn max_model_year() -> i32 {
    use chrono::Datelike;
    chrono::Utc::now().year() + 2
}

/// Where a fitment record came from: a manufacturer/retailer page, or the
/// spreadsheet-supplied secondary source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Official,
    Fallback,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Official => write!(f, "official"),
            Origin::Fallback => write!(f, "fallback"),
        }
    }
}

/// A statement that a part fits one make/model/year-range combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleApplication {
    pub make: String,
    pub model: String,
    /// First model year covered, inclusive. Equal to `year_end` for a
    /// single-year fitment.
    pub year_start: i32,
    pub year_end: i32,
    pub trim: Option<String>,
    /// Engine descriptor as printed by the source, e.g. `"2.0L V6"`.
    pub engine: Option<String>,
    pub origin: Origin,
    pub confidence: f64,
}

impl VehicleApplication {
    /// Identity of a record for deduplication: every text field lowercased
    /// with internal whitespace collapsed, joined with `\x00` so field
    /// boundaries survive (`"a b" + "c"` never collides with `"a" + "b c"`).
    #[must_use]
    pub fn identity_key(&self) -> String {
        let fold = |s: &str| collapse_whitespace(s).to_lowercase();
        [
            fold(&self.make),
            fold(&self.model),
            self.year_start.to_string(),
            self.year_end.to_string(),
            self.trim.as_deref().map(fold).unwrap_or_default(),
            self.engine.as_deref().map(fold).unwrap_or_default(),
        ]
        .join("\x00")
    }

    /// True when every optional descriptor is populated, not just the
    /// mandatory make/model/year triple.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.trim.as_deref().is_some_and(|t| !t.is_empty())
            && self.engine.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// True when the year range is ordered and both ends fall inside the
    /// plausible model-year window.
    #[must_use]
    pub fn has_valid_years(&self, max_year: i32) -> bool {
        self.year_start <= self.year_end
            && self.year_start >= MIN_MODEL_YEAR
            && self.year_end <= max_year
    }

    /// Human-readable year range, e.g. `"2016-2021"` or `"2019"`.
    #[must_use]
    pub fn year_label(&self) -> String {
        if self.year_start == self.year_end {
            self.year_start.to_string()
        } else {
            format!("{}-{}", self.year_start, self.year_end)
        }
    }
}

/// Final per-product fitment: official records first, then fallback records
/// that do not duplicate an official one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergedFitment {
    pub applications: Vec<VehicleApplication>,
    /// Strategy that produced the official portion, if any extraction won.
    pub winning_strategy: Option<crate::registry::StrategyId>,
    /// Aggregate confidence of the winning extraction, 0.0 when none.
    pub confidence: f64,
}

impl MergedFitment {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }

    #[must_use]
    pub fn official_count(&self) -> usize {
        self.applications
            .iter()
            .filter(|a| a.origin == Origin::Official)
            .count()
    }

    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.applications
            .iter()
            .filter(|a| a.origin == Origin::Fallback)
            .count()
    }
}

/// Collapses runs of whitespace to single spaces and trims the ends.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
