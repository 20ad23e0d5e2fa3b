//! Brand authority registry: per-vendor metadata loaded once from YAML and
//! queried read-only for the rest of the run.
//!
//! Lookups fail silently with `None`; an unknown brand or domain only means
//! the brand-specific strategy drops out of the candidate list, never that
//! extraction stops.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Identifier of one extraction strategy.
///
/// The first two are brand-specific parsers registered against a registry
/// entry via `preferred_strategy`; the rest form the generic chain in trust
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    HawkPerformance,
    Bilstein,
    StructuredData,
    Table,
    List,
    Text,
    Heuristic,
    Fallback,
}

impl StrategyId {
    /// Generic strategies in fixed precedence, appended after any preferred
    /// strategy by the vendor resolver.
    pub const GENERIC_ORDER: [StrategyId; 6] = [
        StrategyId::StructuredData,
        StrategyId::Table,
        StrategyId::List,
        StrategyId::Text,
        StrategyId::Heuristic,
        StrategyId::Fallback,
    ];

    /// True for parsers hand-coded to one vendor's page layout.
    #[must_use]
    pub fn is_brand_specific(self) -> bool {
        matches!(self, StrategyId::HawkPerformance | StrategyId::Bilstein)
    }
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StrategyId::HawkPerformance => "hawk_performance",
            StrategyId::Bilstein => "bilstein",
            StrategyId::StructuredData => "structured_data",
            StrategyId::Table => "table",
            StrategyId::List => "list",
            StrategyId::Text => "text",
            StrategyId::Heuristic => "heuristic",
            StrategyId::Fallback => "fallback",
        };
        write!(f, "{name}")
    }
}

/// What kind of source a brand is; distributors aggregate other vendors'
/// data and sit lower on the authority scale than the manufacturers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrandCategory {
    Oem,
    Performance,
    Distributor,
    Unknown,
}

impl std::fmt::Display for BrandCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrandCategory::Oem => write!(f, "oem"),
            BrandCategory::Performance => write!(f, "performance"),
            BrandCategory::Distributor => write!(f, "distributor"),
            BrandCategory::Unknown => write!(f, "unknown"),
        }
    }
}

/// One manufacturer/retailer the pipeline knows how to trust.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandEntry {
    pub name: String,
    pub category: BrandCategory,
    /// Hostname patterns owned by this brand; a page host matches on exact
    /// equality or as a dot-separated suffix (`www.bilstein.com` matches
    /// `bilstein.com`).
    #[serde(default)]
    pub domains: Vec<String>,
    /// Source trust on a 0-100 scale; feeds confidence scoring only, never
    /// strategy ordering within one page.
    pub authority: u8,
    /// Strategy to try first for this brand, ahead of the generic chain.
    #[serde(default)]
    pub preferred_strategy: Option<StrategyId>,
    /// Alternate names the brand appears under in product feeds.
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Top-level shape of `config/brands.yaml`.
#[derive(Debug, Deserialize)]
pub struct RegistryFile {
    pub brands: Vec<BrandEntry>,
}

/// Immutable, pre-indexed registry. Built once at startup and shared by
/// reference; no interior mutability.
#[derive(Debug)]
pub struct BrandRegistry {
    entries: Vec<BrandEntry>,
    by_name: HashMap<String, usize>,
    by_domain: HashMap<String, usize>,
}

impl BrandRegistry {
    /// Index a validated list of entries. Name and alias keys are folded to
    /// lowercase; domains likewise.
    #[must_use]
    pub fn from_entries(entries: Vec<BrandEntry>) -> Self {
        let mut by_name = HashMap::new();
        let mut by_domain = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            by_name.insert(entry.name.to_lowercase(), idx);
            for alias in &entry.aliases {
                by_name.insert(alias.to_lowercase(), idx);
            }
            for domain in &entry.domains {
                by_domain.insert(domain.to_lowercase(), idx);
            }
        }
        Self {
            entries,
            by_name,
            by_domain,
        }
    }

    /// Find a brand by canonical name or alias, case-insensitively.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&BrandEntry> {
        let key = name.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        self.by_name.get(&key).map(|&idx| &self.entries[idx])
    }

    /// Find the brand owning a hostname. Tries the exact host first, then
    /// walks parent suffixes (`shop.bilstein.com` -> `bilstein.com`), never
    /// matching a bare top-level label.
    #[must_use]
    pub fn lookup_domain(&self, host: &str) -> Option<&BrandEntry> {
        let mut candidate = host.trim().trim_end_matches('.').to_lowercase();
        loop {
            if let Some(&idx) = self.by_domain.get(&candidate) {
                return Some(&self.entries[idx]);
            }
            match candidate.split_once('.') {
                // Require at least one dot left in the parent suffix.
                Some((_, parent)) if parent.contains('.') => {
                    candidate = parent.to_string();
                }
                _ => return None,
            }
        }
    }

    #[must_use]
    pub fn all(&self) -> &[BrandEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Load and validate the brand registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_registry(path: &Path) -> Result<BrandRegistry, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RegistryFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: RegistryFile = serde_yaml::from_str(&content)?;
    validate_registry(&file)?;

    Ok(BrandRegistry::from_entries(file.brands))
}

fn validate_registry(file: &RegistryFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_domains = HashSet::new();

    for entry in &file.brands {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        if entry.authority > 100 {
            return Err(ConfigError::Validation(format!(
                "brand '{}' has authority {}; must be 0-100",
                entry.name, entry.authority
            )));
        }

        if !seen_names.insert(entry.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: '{}'",
                entry.name
            )));
        }
        for alias in &entry.aliases {
            if alias.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "brand '{}' has an empty alias",
                    entry.name
                )));
            }
            if !seen_names.insert(alias.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate brand name or alias: '{alias}' (on brand '{}')",
                    entry.name
                )));
            }
        }

        for domain in &entry.domains {
            if domain.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "brand '{}' has an empty domain",
                    entry.name
                )));
            }
            if !seen_domains.insert(domain.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate domain: '{domain}' (on brand '{}')",
                    entry.name
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
