//! Runtime Type Catalog
//!
//! A version-aware registry of type definitions for a blockchain runtime whose
//! type system changes across runtime upgrades. Given a type name and a runtime
//! spec version, the catalog answers with the definition that applied at that
//! version.
//!
//! ## Features
//!
//! - **Versioned Overlays**: Per-version definitions layered over a base registry
//! - **Name Resolution**: Case-insensitive, rename-table and normalizing fallbacks
//! - **Live Metadata Fallback**: Types missing from the documents come from runtime metadata
//! - **Checksums**: SHA256 fingerprints of every registry
//!
//! ## Architecture
//!
//! ```text
//! base document ──────────────► SchemaRegistry (base)
//! network document
//!   └── versioning[] ─────────► SchemaRegistry per minimum version
//!                                 └── VersionedTypeIndex (name → versions)
//! runtime metadata ───────────► SchemaRegistry (runtime)
//!
//! TypeCatalog::node(name, version)
//!   1. index lookup, else ResolverChain → canonical name
//!   2. newest version ≤ requested → overlay, else base
//!   3. miss → runtime registry
//! ```

pub mod builder;
pub mod catalog;
pub mod checksum;
pub mod config;
pub mod definition;
pub mod error;
pub mod index;
pub mod metadata;
pub mod node;
pub mod registry;
pub mod resolver;
pub mod value;
pub mod version;

pub use builder::CatalogOptions;
pub use catalog::{NodeSource, Resolution, TypeCatalog};
pub use checksum::Checksum;
pub use config::CatalogConfig;
pub use error::{CatalogError, Result};
pub use index::VersionedTypeIndex;
pub use metadata::RuntimeMetadata;
pub use node::{Node, Primitive};
pub use registry::SchemaRegistry;
pub use resolver::{KnownNames, NameResolver, ResolverChain};
pub use value::Value;
pub use version::SpecVersion;
