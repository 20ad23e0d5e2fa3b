//! Shared domain types and configuration for the fitment extraction pipeline:
//! the brand authority registry, the known-make vocabulary, the canonical
//! vehicle-application record, and environment-driven application config.

use thiserror::Error;

mod app_config;
pub mod application;
pub mod config;
pub mod makes;
pub mod registry;

pub use app_config::{AppConfig, Environment};
pub use application::{
    max_model_year, MergedFitment, Origin, VehicleApplication, MIN_MODEL_YEAR,
};
pub use registry::{BrandCategory, BrandEntry, BrandRegistry, StrategyId};

/// Errors raised while loading configuration, either from the environment or
/// from the brand registry YAML file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read registry file at {path}: {source}")]
    RegistryFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse registry file: {0}")]
    RegistryFileParse(#[from] serde_yaml::Error),

    #[error("registry validation failed: {0}")]
    Validation(String),
}
