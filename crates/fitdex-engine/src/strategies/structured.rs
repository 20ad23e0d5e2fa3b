//! Structured data embedded in product pages.
//!
//! Two sources, tried in order:
//!
//! 1. `application/ld+json` script blocks. Schema.org `Product` nodes point
//!    at vehicles through `isAccessoryOrSparePartFor`; standalone `Vehicle`
//!    or `Car` nodes are read directly. Malformed blocks are skipped, since
//!    pages routinely ship broken JSON-LD alongside good blocks.
//! 2. Fitment arrays assigned in plain script blocks (`var fitment = [...]`).
//!    A candidate is any array whose leading objects name both a make and a
//!    year key. Once a candidate is found, a parse failure is an error, not
//!    a skip: data the page meant as fitment but serves truncated should
//!    surface in the strategy trace.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use fitdex_core::{Origin, VehicleApplication};

use crate::error::StrategyError;
use crate::patterns::parse_year_token;

fn ld_json_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
            .expect("valid regex")
    })
}

fn script_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b[^>]*>(.*?)</script>").expect("valid regex"))
}

/// Start of an array whose first object names both a year and a make, in
/// either key order.
fn fitment_array_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?is)\[\s*\{[^\[\]]*?"(?:year|years|year_start|yearstart|startyear|start_year)"[^\[\]]*?"(?:make|brand)"\s*:|\[\s*\{[^\[\]]*?"(?:make|brand)"[^\[\]]*?"(?:year|years|year_start|yearstart|startyear|start_year)"\s*:"#,
        )
        .expect("valid regex")
    })
}

/// # Errors
///
/// Returns [`StrategyError::Json`] when a fitment-keyed embedded array is
/// not valid JSON. JSON-LD blocks never error; broken ones are skipped.
pub fn extract(raw_content: &str) -> Result<Vec<VehicleApplication>, StrategyError> {
    let from_ld = extract_json_ld(raw_content);
    if !from_ld.is_empty() {
        tracing::debug!(records = from_ld.len(), "structured data read from JSON-LD");
        return Ok(from_ld);
    }
    let from_scripts = extract_embedded_arrays(raw_content)?;
    tracing::debug!(
        records = from_scripts.len(),
        "structured data read from embedded arrays"
    );
    Ok(from_scripts)
}

// ----- JSON-LD -----

fn extract_json_ld(raw_content: &str) -> Vec<VehicleApplication> {
    let mut applications = Vec::new();
    for caps in ld_json_re().captures_iter(raw_content) {
        let Some(body) = caps.get(1) else { continue };
        let value: Value = match serde_json::from_str(body.as_str().trim()) {
            Ok(v) => v,
            Err(error) => {
                tracing::debug!(%error, "skipping malformed JSON-LD block");
                continue;
            }
        };
        for node in expand_nodes(&value) {
            collect_from_node(node, &mut applications);
        }
    }
    applications
}

/// Flatten top-level arrays and `@graph` wrappers into a node list.
fn expand_nodes(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(obj) => match obj.get("@graph") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => vec![value],
        },
        _ => Vec::new(),
    }
}

fn collect_from_node(node: &Value, out: &mut Vec<VehicleApplication>) {
    if type_matches(node, "Product") {
        match node.get("isAccessoryOrSparePartFor") {
            Some(Value::Array(vehicles)) => {
                out.extend(vehicles.iter().filter_map(vehicle_from_value));
            }
            Some(vehicle @ Value::Object(_)) => {
                out.extend(vehicle_from_value(vehicle));
            }
            _ => {}
        }
    } else if type_matches(node, "Vehicle") || type_matches(node, "Car") {
        out.extend(vehicle_from_value(node));
    }
}

/// `@type` may be a single string or an array of strings.
fn type_matches(node: &Value, wanted: &str) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t.eq_ignore_ascii_case(wanted),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t.eq_ignore_ascii_case(wanted)),
        _ => false,
    }
}

fn vehicle_from_value(value: &Value) -> Option<VehicleApplication> {
    let make = string_field(value, &["brand", "manufacturer", "make"])?;
    let model = string_field(value, &["model", "vehicleModel"])?;
    let (year_start, year_end) =
        year_field(value, &["vehicleModelDate", "modelDate", "productionDate", "year"])?;
    Some(VehicleApplication {
        make,
        model,
        year_start,
        year_end,
        trim: string_field(value, &["vehicleConfiguration", "trim"]),
        engine: string_field(value, &["vehicleEngine", "engine"]),
        origin: Origin::Official,
        confidence: 0.0,
    })
}

// ----- embedded script arrays -----

fn extract_embedded_arrays(raw_content: &str) -> Result<Vec<VehicleApplication>, StrategyError> {
    let mut applications = Vec::new();
    for caps in script_block_re().captures_iter(raw_content) {
        let Some(body) = caps.get(1) else { continue };
        let block = body.as_str();
        for candidate in fitment_array_re().find_iter(block) {
            let Some(array_text) = balanced_array(block, candidate.start()) else {
                tracing::debug!("skipping unterminated fitment array");
                continue;
            };
            let value: Value = serde_json::from_str(array_text)?;
            let Some(items) = value.as_array() else { continue };
            applications.extend(items.iter().filter_map(embedded_from_value));
        }
    }
    Ok(applications)
}

fn embedded_from_value(value: &Value) -> Option<VehicleApplication> {
    let make = string_field(value, &["make", "brand"])?;
    let model = string_field(value, &["model"])?;
    let (year_start, year_end) = year_field(value, &["year", "years"])?;
    Some(VehicleApplication {
        make,
        model,
        year_start,
        year_end,
        trim: string_field(value, &["trim", "submodel"]),
        engine: string_field(value, &["engine"]),
        origin: Origin::Official,
        confidence: 0.0,
    })
}

/// Slice out a balanced `[...]` starting at `open`, honoring JSON string
/// escapes so brackets inside string values do not count.
fn balanced_array(text: &str, open: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

// ----- shared field readers -----

/// First non-empty string among `keys`. Objects contribute their `name`
/// field (schema.org `Brand`, `EngineSpecification`); numbers are rendered
/// as text for models like `1500`.
fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match value.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            Some(Value::Object(obj)) => {
                if let Some(Value::String(s)) = obj.get("name") {
                    if !s.trim().is_empty() {
                        return Some(s.trim().to_string());
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// Years from a single key (number, `"2016"`, or `"2016-2021"`), falling
/// back to explicit start/end key pairs.
fn year_field(value: &Value, keys: &[&str]) -> Option<(i32, i32)> {
    for key in keys {
        match value.get(key) {
            Some(Value::String(s)) => {
                if let Some(range) = parse_year_token(s) {
                    return Some(range);
                }
            }
            Some(Value::Number(n)) => {
                if let Some(year) = n.as_i64().and_then(|y| i32::try_from(y).ok()) {
                    return Some((year, year));
                }
            }
            _ => {}
        }
    }
    let start = int_field(value, &["year_start", "yearStart", "startYear", "start_year"])?;
    let end =
        int_field(value, &["year_end", "yearEnd", "endYear", "end_year"]).unwrap_or(start);
    Some((start, end))
}

fn int_field(value: &Value, keys: &[&str]) -> Option<i32> {
    for key in keys {
        match value.get(key) {
            Some(Value::Number(n)) => {
                if let Some(v) = n.as_i64().and_then(|y| i32::try_from(y).ok()) {
                    return Some(v);
                }
            }
            Some(Value::String(s)) => {
                if let Ok(v) = s.trim().parse() {
                    return Some(v);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
#[path = "structured_test.rs"]
mod tests;
