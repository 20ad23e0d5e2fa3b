//! Known vehicle-make vocabulary.
//!
//! Canonicalization is deliberately narrow: exact case-insensitive equality
//! against a canonical name or one of its listed alternate spellings. There
//! is no distance-based fuzzy matching, so distinct makes can never be
//! silently merged.

/// Canonical make names with accepted alternate spellings.
///
/// The alternates cover only spellings that appear verbatim in real fitment
/// text (abbreviations and missing punctuation), not nicknames.
const MAKES: &[(&str, &[&str])] = &[
    ("Acura", &[]),
    ("Audi", &[]),
    ("BMW", &[]),
    ("Buick", &[]),
    ("Cadillac", &[]),
    ("Chevrolet", &["Chevy"]),
    ("Chrysler", &[]),
    ("Dodge", &[]),
    ("Ford", &[]),
    ("Genesis", &[]),
    ("GMC", &[]),
    ("Honda", &[]),
    ("Hyundai", &[]),
    ("Infiniti", &[]),
    ("Jaguar", &[]),
    ("Jeep", &[]),
    ("Kia", &[]),
    ("Land Rover", &["Landrover"]),
    ("Lexus", &[]),
    ("Lincoln", &[]),
    ("Mazda", &[]),
    ("Mercedes-Benz", &["Mercedes", "Mercedes Benz", "MB"]),
    ("Mini", &[]),
    ("Mitsubishi", &[]),
    ("Nissan", &[]),
    ("Pontiac", &[]),
    ("Porsche", &[]),
    ("Ram", &[]),
    ("Saab", &[]),
    ("Saturn", &[]),
    ("Scion", &[]),
    ("Subaru", &[]),
    ("Suzuki", &[]),
    ("Tesla", &[]),
    ("Toyota", &[]),
    ("Volkswagen", &["VW"]),
    ("Volvo", &[]),
];

/// Resolve a raw make string to its canonical spelling.
///
/// Matching is exact after case folding; `None` means the make is unknown to
/// the vocabulary (callers decide whether to keep it as-is).
#[must_use]
pub fn canonical_make(raw: &str) -> Option<&'static str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for (canonical, alternates) in MAKES {
        if canonical.eq_ignore_ascii_case(trimmed)
            || alternates.iter().any(|a| a.eq_ignore_ascii_case(trimmed))
        {
            return Some(canonical);
        }
    }
    None
}

/// True when the string names a known make, canonical or alternate.
#[must_use]
pub fn is_known_make(raw: &str) -> bool {
    canonical_make(raw).is_some()
}

/// Every recognized spelling (canonical names and alternates), for building
/// text-matching alternations. Multi-word spellings come first so longest
/// match wins when the list is joined into a pattern in order.
#[must_use]
pub fn all_spellings() -> Vec<&'static str> {
    let mut spellings: Vec<&'static str> = MAKES
        .iter()
        .flat_map(|(canonical, alternates)| {
            std::iter::once(*canonical).chain(alternates.iter().copied())
        })
        .collect();
    spellings.sort_by_key(|s| std::cmp::Reverse(s.len()));
    spellings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_make_exact_case_insensitive() {
        assert_eq!(canonical_make("honda"), Some("Honda"));
        assert_eq!(canonical_make("HONDA"), Some("Honda"));
        assert_eq!(canonical_make("Honda"), Some("Honda"));
    }

    #[test]
    fn canonical_make_resolves_alternate_spellings() {
        assert_eq!(canonical_make("Chevy"), Some("Chevrolet"));
        assert_eq!(canonical_make("vw"), Some("Volkswagen"));
        assert_eq!(canonical_make("Mercedes"), Some("Mercedes-Benz"));
        assert_eq!(canonical_make("mercedes benz"), Some("Mercedes-Benz"));
        assert_eq!(canonical_make("landrover"), Some("Land Rover"));
    }

    #[test]
    fn canonical_make_trims_surrounding_whitespace() {
        assert_eq!(canonical_make("  Toyota  "), Some("Toyota"));
    }

    #[test]
    fn canonical_make_rejects_unknown_and_partial() {
        assert_eq!(canonical_make("Hondas"), None);
        assert_eq!(canonical_make("Hon"), None);
        assert_eq!(canonical_make(""), None);
        assert_eq!(canonical_make("   "), None);
    }

    #[test]
    fn all_spellings_longest_first_and_contains_alternates() {
        let spellings = all_spellings();
        assert!(spellings.contains(&"Chevy"));
        assert!(spellings.contains(&"Mercedes-Benz"));
        let mb = spellings.iter().position(|s| *s == "Mercedes Benz").unwrap();
        let short = spellings.iter().position(|s| *s == "MB").unwrap();
        assert!(mb < short, "longer spellings must precede their prefixes");
    }

    #[test]
    fn is_known_make_matches_canonical_lookup() {
        assert!(is_known_make("Acura"));
        assert!(!is_known_make("Yamaha SR400"));
    }
}
