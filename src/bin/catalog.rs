//! Type Catalog CLI
//!
//! Resolves type names against versioned type-registry documents.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use runtime_type_catalog::{
    CatalogConfig, CatalogOptions, RuntimeMetadata, SchemaRegistry, SpecVersion, TypeCatalog,
    Value,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "type-catalog")]
#[command(about = "Resolve runtime type definitions by spec version")]
struct Cli {
    /// Configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Base type-definition document
    #[arg(long)]
    base: Option<PathBuf>,

    /// Network versioned-definition document
    #[arg(long)]
    network: Option<PathBuf>,

    /// Runtime metadata document
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Reject versioning entries that repeat a minimum version
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the node a name resolves to at a version
    Resolve {
        /// Type name
        name: String,
        /// Runtime spec version
        #[arg(short, long)]
        at: SpecVersion,
    },

    /// List overlay versions, or the versions defining a name
    Versions {
        /// Type name
        name: Option<String>,
        /// List every indexed name with its versions
        #[arg(short, long, conflicts_with = "name")]
        all: bool,
    },

    /// Show registry sizes and fingerprints
    Inspect {
        /// Print full fingerprints
        #[arg(long)]
        full: bool,
    },

    /// Build a catalog for every network document under a directory
    Check {
        /// Directory to scan
        dir: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = CatalogConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;
    if cli.base.is_some() {
        config.documents.base = cli.base.clone();
    }
    if cli.network.is_some() {
        config.documents.network = cli.network.clone();
    }
    if cli.metadata.is_some() {
        config.documents.metadata = cli.metadata.clone();
    }
    if cli.strict {
        config.versioning.strict = true;
    }
    let options = config.options()?;

    match cli.command {
        Commands::Resolve { name, at } => resolve(&open_catalog(&config, &options)?, &name, at),
        Commands::Versions { name, all } => {
            versions(&open_catalog(&config, &options)?, name.as_deref(), all)
        }
        Commands::Inspect { full } => inspect(&open_catalog(&config, &options)?, full),
        Commands::Check { dir } => check(&dir, &config, &options),
    }
}

fn read_document(path: &Path) -> anyhow::Result<Value> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Value::from_json_slice(&bytes).with_context(|| format!("failed to parse {}", path.display()))
}

fn read_metadata(path: Option<&Path>) -> anyhow::Result<RuntimeMetadata> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            RuntimeMetadata::from_json_str(&text)
                .with_context(|| format!("failed to parse {}", path.display()))
        }
        None => Ok(RuntimeMetadata::empty()),
    }
}

fn base_document(config: &CatalogConfig) -> anyhow::Result<Value> {
    match &config.documents.base {
        Some(path) => read_document(path),
        None => Ok(Value::Mapping(Vec::new())),
    }
}

fn open_catalog(config: &CatalogConfig, options: &CatalogOptions) -> anyhow::Result<TypeCatalog> {
    let network_path = config
        .documents
        .network
        .as_deref()
        .ok_or_else(|| anyhow!("no network document given (--network or [documents] network)"))?;

    let base = base_document(config)?;
    let network = read_document(network_path)?;
    let metadata = read_metadata(config.documents.metadata.as_deref())?;

    TypeCatalog::from_documents_with(&base, &network, &metadata, options)
        .with_context(|| format!("failed to build catalog from {}", network_path.display()))
}

fn resolve(catalog: &TypeCatalog, name: &str, at: SpecVersion) -> anyhow::Result<()> {
    if let Some(resolution) = catalog.resolve(name, at) {
        let report = serde_json::json!({
            "name": name,
            "version": at,
            "canonical_name": resolution.canonical_name,
            "source": resolution.source,
            "node": &*resolution.node,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let suggestions = suggest(catalog, name, 5);
    if suggestions.is_empty() {
        bail!("no definition of {} at version {}", name, at);
    }
    bail!(
        "no definition of {} at version {} (did you mean: {}?)",
        name,
        at,
        suggestions.join(", ")
    )
}

/// Closest known names by fuzzy score
fn suggest<'a>(catalog: &'a TypeCatalog, query: &str, limit: usize) -> Vec<&'a str> {
    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &str)> = catalog
        .all_names()
        .into_iter()
        .filter_map(|name| matcher.fuzzy_match(name, query).map(|score| (score, name)))
        .collect();

    // Sort by score descending
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.into_iter().take(limit).map(|(_, name)| name).collect()
}

fn versions(catalog: &TypeCatalog, name: Option<&str>, all: bool) -> anyhow::Result<()> {
    if all {
        for (name, versions) in catalog.index().iter() {
            let versions: Vec<String> = versions.iter().map(ToString::to_string).collect();
            println!("{:<40} {}", name, versions.join(", "));
        }
        return Ok(());
    }

    match name {
        Some(name) => {
            let versions = catalog
                .versions_of(name)
                .ok_or_else(|| anyhow!("{} is not defined by any versioning entry", name))?;
            for version in versions {
                println!("{}", version);
            }
        }
        None => {
            for version in catalog.versions() {
                if let Some(registry) = catalog.registry(version) {
                    println!("{:>8}  {} types", version, registry.len());
                }
            }
        }
    }
    Ok(())
}

fn inspect(catalog: &TypeCatalog, full: bool) -> anyhow::Result<()> {
    let fingerprint = |registry: &SchemaRegistry| {
        let checksum = registry.fingerprint();
        if full {
            checksum.as_str().to_string()
        } else {
            checksum.short().to_string()
        }
    };

    println!(
        "base      {:>6} types  {}",
        catalog.base().len(),
        fingerprint(catalog.base())
    );
    for version in catalog.versions() {
        if let Some(registry) = catalog.registry(version) {
            println!(
                "v{:<8} {:>6} types  {}",
                version,
                registry.len(),
                fingerprint(registry)
            );
        }
    }
    println!(
        "runtime   {:>6} types  {}",
        catalog.runtime().len(),
        fingerprint(catalog.runtime())
    );
    println!("indexed   {:>6} names", catalog.index().len());
    Ok(())
}

fn check(dir: &Path, config: &CatalogConfig, options: &CatalogOptions) -> anyhow::Result<()> {
    let base = base_document(config)?;
    let metadata = read_metadata(config.documents.metadata.as_deref())?;

    let mut checked = 0usize;
    let mut failures = 0usize;

    for entry in walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || path.extension().map(|e| e != "json").unwrap_or(true) {
            continue;
        }

        let network = match read_document(path) {
            Ok(document) => document,
            Err(e) => {
                println!("❌ {} - {:#}", path.display(), e);
                failures += 1;
                continue;
            }
        };
        // Only network documents carry versioning entries
        if network.get("versioning").is_none() {
            continue;
        }

        checked += 1;
        match TypeCatalog::from_documents_with(&base, &network, &metadata, options) {
            Ok(catalog) => println!(
                "✅ {} - {} versions, {} indexed names",
                path.display(),
                catalog.versions().count(),
                catalog.index().len()
            ),
            Err(e) => {
                println!("❌ {} - {}", path.display(), e);
                failures += 1;
            }
        }
    }

    println!();
    println!("{} network documents checked, {} failed", checked, failures);
    if failures > 0 {
        bail!("{} documents failed", failures);
    }
    Ok(())
}
