use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Runtime configuration, sourced from `FITDEX_*` environment variables.
/// Every field has a default; the pipeline runs with an empty environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Path to the brand registry YAML.
    pub registry_path: PathBuf,
    /// Path to the persisted fitment cache snapshot.
    pub cache_path: PathBuf,
    /// Worker-pool bound: products resolved concurrently.
    pub max_concurrent_products: usize,
    /// Overall bound on one product's fetch+extract sequence.
    pub product_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub fetch_max_retries: u32,
    pub fetch_backoff_base_secs: u64,
    pub user_agent: String,
    /// Candidate source pages tried per product before giving up.
    pub max_urls_per_product: usize,
}
