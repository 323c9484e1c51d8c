//! Error types for the type catalog

use thiserror::Error;

use crate::version::SpecVersion;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Catalog construction errors
///
/// Query-time misses are not errors: `TypeCatalog::node` returns `None`.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Versioned document has no \"versioning\" list")]
    MissingVersioning,

    #[error("Versioning declares minimum version {version} more than once")]
    DuplicatedVersioning { version: SpecVersion },

    #[error("Invalid document format: {0}")]
    InvalidFormat(String),

    #[error("Invalid type definition for {name}: {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("Invalid normalization pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl CatalogError {
    pub(crate) fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat(message.into())
    }

    pub(crate) fn invalid_definition(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
