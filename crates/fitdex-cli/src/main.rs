mod batch;
mod fetch;
mod report;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fitdex_core::config::load_app_config;
use fitdex_core::registry::load_registry;
use fitdex_core::AppConfig;
use fitdex_engine::cache::FitmentCache;

use crate::batch::{filter_products, load_batch_input, run_batch, RunContext};
use crate::fetch::PageFetcher;
use crate::report::{build_summary, write_report, BatchReport};

#[derive(Debug, Parser)]
#[command(name = "fitdex-cli")]
#[command(about = "Vehicle fitment extraction for parts catalogs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract fitment for a batch of products.
    Run {
        /// Batch input file (JSON).
        #[arg(long)]
        input: PathBuf,
        /// Report output path; prints to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Only process products of this brand (name or alias).
        #[arg(long)]
        brand: Option<String>,
        /// Skip all network fetches; cache and fallback lines only.
        #[arg(long)]
        offline: bool,
    },
    /// Inspect or clear the fitment cache.
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Inspect the brand registry.
    Registry {
        #[command(subcommand)]
        command: RegistryCommands,
    },
}

#[derive(Debug, Subcommand)]
enum CacheCommands {
    /// Mark every cached fitment stale so the next run refetches.
    Clear,
    /// Print entry counts.
    Stats,
}

#[derive(Debug, Subcommand)]
enum RegistryCommands {
    /// List registered brands.
    List {
        /// Only show brands in this category (oem, performance,
        /// distributor, unknown).
        #[arg(long)]
        category: Option<String>,
    },
    /// Load the registry and report whether it validates.
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            input,
            output,
            brand,
            offline,
        } => run(config, &input, output.as_deref(), brand.as_deref(), offline).await,
        Commands::Cache { command } => cache_command(&config, command),
        Commands::Registry { command } => registry_command(&config, command),
    }
}

/// Full batch run: load registry and cache, process every product, persist
/// the cache, and emit the report.
async fn run(
    config: AppConfig,
    input: &Path,
    output: Option<&Path>,
    brand: Option<&str>,
    offline: bool,
) -> anyhow::Result<()> {
    let registry = load_registry(&config.registry_path)?;
    let cache = FitmentCache::load(&config.cache_path)?;
    let fetcher = if offline {
        None
    } else {
        Some(PageFetcher::new(&config)?)
    };

    let input_batch = load_batch_input(input)?;
    let products = filter_products(input_batch.products, &registry, brand);
    if products.is_empty() {
        anyhow::bail!("no products to process after filtering");
    }
    tracing::info!(products = products.len(), offline, "starting batch run");

    let cache_path = config.cache_path.clone();
    let ctx = RunContext {
        config,
        registry,
        cache,
        fetcher,
    };
    let reports = run_batch(&ctx, products).await;
    ctx.cache.persist(&cache_path)?;

    let report = BatchReport {
        generated_at: chrono::Utc::now(),
        summary: build_summary(&reports),
        products: reports,
    };
    tracing::info!(
        products = report.summary.products,
        with_official = report.summary.with_official,
        fallback_only = report.summary.fallback_only,
        no_fitment = report.summary.no_fitment,
        cache_hits = report.summary.cache_hits,
        "batch run complete"
    );
    write_report(&report, output)
}

fn cache_command(config: &AppConfig, command: CacheCommands) -> anyhow::Result<()> {
    let cache = FitmentCache::load(&config.cache_path)?;
    match command {
        CacheCommands::Stats => {
            println!(
                "cache: {} entries ({} live) at {}",
                cache.len(),
                cache.live_len(),
                config.cache_path.display()
            );
        }
        CacheCommands::Clear => {
            let before = cache.live_len();
            cache.invalidate_all();
            cache.persist(&config.cache_path)?;
            println!("invalidated {before} cached fitments");
        }
    }
    Ok(())
}

fn registry_command(config: &AppConfig, command: RegistryCommands) -> anyhow::Result<()> {
    let registry = load_registry(&config.registry_path)?;
    match command {
        RegistryCommands::List { category: wanted } => {
            for entry in registry.all() {
                // Pre-render so column padding applies to the final string.
                let category = entry.category.to_string();
                if let Some(wanted) = &wanted {
                    if !category.eq_ignore_ascii_case(wanted) {
                        continue;
                    }
                }
                let strategy = entry
                    .preferred_strategy
                    .map_or_else(|| "generic".to_owned(), |s| s.to_string());
                println!(
                    "{:<28} {category:<12} authority {:>3}  strategy {strategy}",
                    entry.name, entry.authority
                );
            }
        }
        RegistryCommands::Validate => {
            println!(
                "registry OK: {} brands at {}",
                registry.len(),
                config.registry_path.display()
            );
        }
    }
    Ok(())
}
