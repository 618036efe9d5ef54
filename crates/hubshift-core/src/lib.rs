//! Hubshift Core Library
//!
//! This crate provides the core functionality for Hubshift:
//! - Typed decoding of encoded field payloads
//! - Schema registry of field definitions per entity type and bundle
//! - Dynamic entities with typed and type-inferred accessors
//! - Mapping profiles that turn entities into hub records
//! - Entity sources and hub record sinks
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Source    │────▶│   Dynamic   │────▶│   Profile   │────▶│    Sink     │
//! │  (JSONL)    │     │   Entity    │     │   Mapping   │     │ (JSONL/CSV) │
//! └─────────────┘     └──────┬──────┘     └─────────────┘     └─────────────┘
//!                            │
//!                     ┌──────▼──────┐
//!                     │   Schema    │
//!                     │  Registry   │
//!                     └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use hubshift_core::{DynamicEntity, SchemaRegistry};
//!
//! let registry = SchemaRegistry::load("./schema.yaml")?;
//! let mut entity = DynamicEntity::new("node", "article");
//! entity.set_field("title", br#"[{"value":"Hello"}]"#.to_vec());
//! entity.attach_registry(&registry)?;
//! assert_eq!(entity.get_text("title"), "Hello");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod decode;
pub mod entity;
pub mod error;
pub mod mapping;
pub mod profile;
pub mod registry;
pub mod sinks;
pub mod sources;
pub mod value;

pub use config::Config;
pub use entity::DynamicEntity;
pub use error::{Error, Result};
pub use profile::Profile;
pub use registry::{FieldDefinition, FieldType, Multiplicity, SchemaRegistry};
pub use value::{FieldValue, Link, Reference};
