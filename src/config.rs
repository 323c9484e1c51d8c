//! Configuration management for the type catalog
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (catalog.toml)
//! - Environment variables (CATALOG__*)
//!
//! ## Example config file (catalog.toml):
//! ```toml
//! [documents]
//! base = "definitions/default.json"
//! network = "definitions/polkadot.json"
//! metadata = "metadata/polkadot-9430.json"
//!
//! [versioning]
//! strict = false
//!
//! [resolver.aliases]
//! Amount = "Balance"
//!
//! [[resolver.patterns]]
//! pattern = "^Raw"
//! replacement = ""
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::builder::CatalogOptions;
use crate::error::Result;
use crate::resolver::NormalizationRule;

/// Main configuration for the type catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Document locations
    #[serde(default)]
    pub documents: DocumentsConfig,

    /// Versioning policy
    #[serde(default)]
    pub versioning: VersioningConfig,

    /// Name resolution tweaks
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Where the CLI finds its input documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// Base type-definition document
    #[serde(default)]
    pub base: Option<PathBuf>,

    /// Network versioned-definition document
    #[serde(default)]
    pub network: Option<PathBuf>,

    /// Live runtime metadata (optional; an empty registry is used without it)
    #[serde(default)]
    pub metadata: Option<PathBuf>,
}

/// Versioning configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersioningConfig {
    /// Fail on repeated minimum versions instead of merging them
    #[serde(default)]
    pub strict: bool,
}

/// Resolver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Extra alias → canonical renames
    #[serde(default)]
    pub aliases: HashMap<String, String>,

    /// Extra normalization rules
    #[serde(default)]
    pub patterns: Vec<PatternConfig>,
}

/// A single normalization rewrite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

impl CatalogConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["catalog.toml", ".catalog.toml", "config/catalog.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "type-catalog") {
            let xdg_config = config_dir.config_dir().join("catalog.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (CATALOG__*)
        builder = builder.add_source(
            Environment::with_prefix("CATALOG")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Construction options; fails on an invalid normalization pattern
    pub fn options(&self) -> Result<CatalogOptions> {
        let rules = self
            .resolver
            .patterns
            .iter()
            .map(|p| NormalizationRule::new(&p.pattern, p.replacement.clone()))
            .collect::<Result<Vec<_>>>()?;

        Ok(CatalogOptions {
            strict_versioning: self.versioning.strict,
            aliases: self.resolver.aliases.clone(),
            rules,
        })
    }
}
