//! Lexicache - an offline dictionary browser for the terminal.
//!
//! Dictionaries and page assets are installed into a versioned offline
//! cache; searching and browsing read through that cache and fall back to
//! the network only for what is missing.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lexicache_core::browser::EMPTY_DICTIONARY_PLACEHOLDER;
use lexicache_core::utils::truncate_string;
use lexicache_core::{
    Config, DataLoader, DictionaryBrowser, DiskStorage, HttpFetcher, OfflineCache, SearchOutcome,
};

/// Definitions longer than this are shortened in listings unless `--full`
const DEFINITION_PREVIEW_CHARS: usize = 100;

#[derive(Parser)]
#[command(name = "lexicache", version, about = "Offline dictionary browser")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
    /// Populate the offline cache for the configured version
    Install {
        /// Leave older cache versions in place
        #[arg(long)]
        no_activate: bool,
    },
    /// Delete cache buckets from older versions
    Activate,
    /// Show which assets are cached
    Status,
    /// Prefix search across every dictionary
    Search { query: Vec<String> },
    /// List dictionaries, or every entry of one dictionary
    List {
        dictionary: Option<String>,
        /// Print definitions in full
        #[arg(long)]
        full: bool,
    },
    /// Fetch a URL through the offline cache and write the body to stdout
    Fetch { url: String },
}

type Cache = OfflineCache<DiskStorage, HttpFetcher>;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_config() -> Result<Config> {
    let mut config = Config::load()?;
    config.apply_env_overrides();
    Ok(config)
}

fn build_cache(config: &Config, fresh: bool) -> Result<Cache> {
    let manifest = config.manifest()?;
    let cache_dir = config.cache_dir()?;
    let storage = DiskStorage::new(cache_dir.clone())
        .with_context(|| format!("Failed to open cache directory: {}", cache_dir.display()))?;
    let network = HttpFetcher::with_timeout(config.request_timeout())
        .context("Failed to create HTTP client")?;

    Ok(if fresh {
        OfflineCache::new(manifest, storage, network)
    } else {
        OfflineCache::resume(manifest, storage, network)
    })
}

async fn load_browser(config: &Config) -> Result<DictionaryBrowser> {
    let cache = Arc::new(build_cache(config, false)?);
    let loader =
        DataLoader::new(cache, config.base_url()?).with_timeout(config.request_timeout());
    let dictionaries = loader.load_all(&config.dictionaries).await;
    Ok(DictionaryBrowser::new(dictionaries))
}

fn init(force: bool) -> Result<()> {
    let path = Config::config_path()?;
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default().save()?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}

async fn install(config: &Config, no_activate: bool) -> Result<()> {
    let cache = build_cache(config, true)?;
    eprintln!(
        "Installing {} ({} assets)...",
        cache.version(),
        cache.manifest().len()
    );

    let report = cache.install().await?;
    for failure in &report.failed {
        eprintln!("✗ {}: {}", failure.url, failure.error);
    }
    eprintln!(
        "Cached {} of {} assets",
        report.cached.len(),
        cache.manifest().len()
    );

    if !no_activate {
        report_activation(&cache).await?;
    }
    Ok(())
}

async fn report_activation(cache: &Cache) -> Result<()> {
    let report = cache.activate().await?;
    for bucket in &report.deleted {
        eprintln!("Deleted old cache {}", bucket);
    }
    for bucket in &report.failed {
        eprintln!("✗ Could not delete old cache {}", bucket);
    }
    eprintln!("{} is active", cache.version());
    Ok(())
}

async fn status(config: &Config) -> Result<()> {
    let cache = build_cache(config, false)?;
    let assets = cache.status().await;
    let cached = assets.iter().filter(|a| a.cached.is_some()).count();

    println!("Cache version: {}", cache.version());
    println!("Cache directory: {}", cache.storage().root().display());
    for asset in &assets {
        match &asset.cached {
            Some(age) => println!("✓ {} ({})", asset.url, age),
            None => println!("✗ {}", asset.url),
        }
    }
    println!("{} of {} assets available offline", cached, assets.len());
    Ok(())
}

async fn search(config: &Config, query: &str) -> Result<()> {
    let browser = load_browser(config).await?;
    match browser.search(query) {
        SearchOutcome::Matches(hits) => {
            for hit in hits {
                println!("{}: {}  [{}]", hit.term, hit.definition, hit.dictionary);
            }
        }
        outcome => {
            if let Some(text) = outcome.placeholder() {
                println!("{}", text);
            }
        }
    }
    Ok(())
}

async fn list(config: &Config, dictionary: Option<&str>, full: bool) -> Result<()> {
    let browser = load_browser(config).await?;

    let Some(name) = dictionary else {
        for (name, dict) in browser.dictionaries().iter() {
            println!("{} ({} terms)", name, dict.len());
        }
        return Ok(());
    };

    let entries = browser.list_entries(name);
    println!("{}", name);
    if entries.is_empty() {
        println!("{}", EMPTY_DICTIONARY_PLACEHOLDER);
        return Ok(());
    }
    for entry in entries {
        let definition = if full {
            entry.definition
        } else {
            truncate_string(&entry.definition, DEFINITION_PREVIEW_CHARS)
        };
        println!("{}: {}", entry.term, definition);
    }
    Ok(())
}

async fn fetch(config: &Config, url: &str) -> Result<()> {
    let cache = build_cache(config, false)?;
    let response = match cache.handle_fetch(url).await {
        Ok(response) => response,
        Err(e) if e.is_transport() => {
            anyhow::bail!("{} is not cached and the network is unreachable: {}", url, e)
        }
        Err(e) => return Err(e.into()),
    };
    eprintln!(
        "{} {} ({})",
        response.status,
        response.url,
        response.header("content-type").unwrap_or("no content type")
    );
    io::stdout().write_all(&response.body)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_tracing();
    info!("Lexicache starting");

    match cli.command {
        Command::Init { force } => init(force),
        command => run(command, &load_config()?).await,
    }
}

async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Init { force } => init(force),
        Command::Install { no_activate } => install(config, no_activate).await,
        Command::Activate => report_activation(&build_cache(config, false)?).await,
        Command::Status => status(config).await,
        Command::Search { query } => search(config, &query.join(" ")).await,
        Command::List { dictionary, full } => list(config, dictionary.as_deref(), full).await,
        Command::Fetch { url } => fetch(config, &url).await,
    }
}
