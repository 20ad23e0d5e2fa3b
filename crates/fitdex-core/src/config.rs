use std::fmt::Display;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from `FITDEX_*` environment variables.
///
/// Calls `dotenvy::dotenv().ok()` first so a local `.env` file can supply
/// overrides.
///
/// # Errors
///
/// Returns `ConfigError` if any override value fails to parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load configuration from the process environment without touching `.env`
/// files. Callers that manage their own environment (tests, mostly) use
/// this directly.
///
/// # Errors
///
/// Returns `ConfigError` if any override value fails to parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Assemble the config through an injectable variable lookup so tests can
/// drive it from a plain `HashMap` instead of mutating the real environment.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default =
        |var: &str, default: &str| lookup(var).unwrap_or_else(|_| default.to_string());

    Ok(AppConfig {
        env: parse_environment(&or_default("FITDEX_ENV", "development")),
        log_level: or_default("FITDEX_LOG_LEVEL", "info"),
        registry_path: or_default("FITDEX_REGISTRY_PATH", "./config/brands.yaml").into(),
        cache_path: or_default("FITDEX_CACHE_PATH", "./fitment-cache.json").into(),
        max_concurrent_products: env_parse(&lookup, "FITDEX_MAX_CONCURRENT_PRODUCTS", "5")?,
        product_timeout_secs: env_parse(&lookup, "FITDEX_PRODUCT_TIMEOUT_SECS", "60")?,
        fetch_timeout_secs: env_parse(&lookup, "FITDEX_FETCH_TIMEOUT_SECS", "30")?,
        fetch_max_retries: env_parse(&lookup, "FITDEX_FETCH_MAX_RETRIES", "2")?,
        fetch_backoff_base_secs: env_parse(&lookup, "FITDEX_FETCH_BACKOFF_BASE_SECS", "1")?,
        user_agent: or_default("FITDEX_USER_AGENT", "fitdex/0.1 (catalog-fitment)"),
        max_urls_per_product: env_parse(&lookup, "FITDEX_MAX_URLS_PER_PRODUCT", "3")?,
    })
}

/// Read one variable through `lookup` and parse it, falling back to
/// `default` when the variable is unset.
fn env_parse<T, F>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
