//! Error types for hubshift-core
//!
//! Field decoding never produces these: absent or malformed payloads degrade
//! to zero values. Errors cover configuration, registration and I/O.

use thiserror::Error;

/// Result type alias for hubshift-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in hubshift-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be found
    #[error("configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched
        path: String,
    },

    /// Failed to parse YAML configuration
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Invalid configuration value
    #[error("invalid configuration: {message}")]
    ConfigInvalid {
        /// Description of what's invalid
        message: String,
    },

    /// The same field was registered twice for one bundle
    #[error("field '{name}' is already registered for {entity_type}/{bundle}")]
    DuplicateField {
        /// Entity type of the duplicate registration
        entity_type: String,
        /// Bundle of the duplicate registration
        bundle: String,
        /// Field name
        name: String,
    },

    /// A schema registry was attached to an entity that already has one
    #[error("entity {entity_type}/{bundle} already has a schema registry attached")]
    RegistryAlreadyAttached {
        /// Entity type
        entity_type: String,
        /// Bundle
        bundle: String,
    },

    /// Strict mapping found required fields absent on an entity
    #[error("entity {entity_type}/{bundle} is missing required fields: {}", fields.join(", "))]
    MissingRequired {
        /// Entity type
        entity_type: String,
        /// Bundle
        bundle: String,
        /// Names of the missing fields, in registration order
        fields: Vec<String>,
    },

    /// An input record could not be read as an entity
    #[error("invalid record at line {line}: {message}")]
    InvalidRecord {
        /// 1-based line number in the input
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
