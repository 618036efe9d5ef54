//! Schema registry
//!
//! Field definitions keyed by entity type, bundle and field name. The
//! registry knows nothing about entity instances; entities borrow it to
//! dispatch type-inferred reads and to validate required fields.
//!
//! # Schema Files
//!
//! Registries are usually bulk-loaded from a YAML export of the source
//! system's field configuration:
//!
//! ```yaml
//! fields:
//!   - entity_type: node
//!     bundle: article
//!     name: title
//!     type: text
//!     required: true
//!     source_type: string
//!   - entity_type: node
//!     bundle: article
//!     name: field_tags
//!     type: reference
//!     cardinality: -1
//!     source_type: entity_reference
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Declared semantic type of a field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// Plain text
    Text,
    /// Integer number
    Integer,
    /// Boolean flag
    Boolean,
    /// Date or timestamp
    Date,
    /// Reference to entities of a fixed type
    Reference,
    /// Reference whose target type is recorded per value
    TypedReference,
    /// Hyperlink with optional title
    Link,
    /// Rich text with raw and processed forms
    FormattedText,
    /// Any type this crate has no decoder for; read with generic decoding
    Other(String),
}

impl FieldType {
    /// The canonical name used in schema files
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Reference => "reference",
            Self::TypedReference => "typed_reference",
            Self::Link => "link",
            Self::FormattedText => "formatted_text",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        match name {
            "text" => Self::Text,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "reference" => Self::Reference,
            "typed_reference" => Self::TypedReference,
            "link" => Self::Link,
            "formatted_text" => Self::FormattedText,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a field holds at most one value or any number
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    /// At most one value
    #[default]
    Single,
    /// Any number of values
    Multiple,
}

impl Multiplicity {
    /// Map a source-system cardinality to a multiplicity.
    ///
    /// `1` is single-valued; any other value, including the unlimited
    /// marker `-1`, is multi-valued.
    pub fn from_cardinality(cardinality: i64) -> Self {
        if cardinality == 1 {
            Self::Single
        } else {
            Self::Multiple
        }
    }
}

/// The contract of one field within a bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Declared semantic type
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Single or multi-value
    #[serde(default)]
    pub multiplicity: Multiplicity,

    /// Whether the field must be present on every entity of the bundle
    #[serde(default)]
    pub required: bool,

    /// Field type name in the originating system, for diagnostics only
    #[serde(default)]
    pub source_type: String,
}

impl FieldDefinition {
    /// An optional, single-valued field of the given type
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            multiplicity: Multiplicity::Single,
            required: false,
            source_type: String::new(),
        }
    }

    /// Mark the field multi-valued
    pub fn multiple(mut self) -> Self {
        self.multiplicity = Multiplicity::Multiple;
        self
    }

    /// Mark the field required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Record the originating system's type name
    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = source_type.into();
        self
    }

    /// Whether the field is multi-valued
    pub fn is_multiple(&self) -> bool {
        self.multiplicity == Multiplicity::Multiple
    }
}

/// One entry of a schema file
#[derive(Debug, Clone, Deserialize)]
pub struct FieldRegistration {
    /// Entity type the field belongs to
    pub entity_type: String,

    /// Bundle the field belongs to
    pub bundle: String,

    /// Field name
    pub name: String,

    /// Declared semantic type
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Explicit multiplicity
    #[serde(default)]
    pub multiplicity: Option<Multiplicity>,

    /// Source-system cardinality, as an alternative to `multiplicity`
    #[serde(default)]
    pub cardinality: Option<i64>,

    /// Whether the field is required
    #[serde(default)]
    pub required: bool,

    /// Field type name in the originating system
    #[serde(default)]
    pub source_type: String,
}

impl FieldRegistration {
    fn into_definition(self) -> Result<(String, String, String, FieldDefinition)> {
        let multiplicity = match (self.multiplicity, self.cardinality) {
            (Some(_), Some(_)) => {
                return Err(Error::ConfigInvalid {
                    message: format!(
                        "field '{}' on {}/{} sets both multiplicity and cardinality",
                        self.name, self.entity_type, self.bundle
                    ),
                });
            }
            (Some(m), None) => m,
            (None, Some(c)) => Multiplicity::from_cardinality(c),
            (None, None) => Multiplicity::Single,
        };
        let definition = FieldDefinition {
            field_type: self.field_type,
            multiplicity,
            required: self.required,
            source_type: self.source_type,
        };
        Ok((self.entity_type, self.bundle, self.name, definition))
    }
}

#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    fields: Vec<FieldRegistration>,
}

/// Fields of one bundle, in registration order
#[derive(Debug, Default)]
struct BundleSchema {
    fields: Vec<(String, FieldDefinition)>,
    positions: HashMap<String, usize>,
}

/// Store of field definitions keyed by (entity type, bundle, field name).
///
/// Lookups are exact: there is no inheritance or fallback between bundles.
/// Definitions cannot be replaced once registered, so a built registry can
/// be shared by reference across entities and threads.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    bundles: HashMap<String, HashMap<String, BundleSchema>>,
    len: usize,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a sequence of registrations, in order
    pub fn from_registrations<I>(registrations: I) -> Result<Self>
    where
        I: IntoIterator<Item = FieldRegistration>,
    {
        let mut registry = Self::new();
        for registration in registrations {
            let (entity_type, bundle, name, definition) = registration.into_definition()?;
            registry.register(entity_type, bundle, name, definition)?;
        }
        Ok(registry)
    }

    /// Parse a YAML schema document
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let file: SchemaFile = serde_yaml::from_str(contents)?;
        Self::from_registrations(file.fields)
    }

    /// Load a YAML schema file
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let registry = SchemaRegistry::load("./schema.yaml")?;
    /// println!("{} fields registered", registry.len());
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        let registry = Self::from_yaml_str(&contents)?;
        tracing::debug!(
            "Loaded {} field definitions from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Register a field definition.
    ///
    /// Fails with [`Error::DuplicateField`] if the triple is already known.
    pub fn register(
        &mut self,
        entity_type: impl Into<String>,
        bundle: impl Into<String>,
        name: impl Into<String>,
        definition: FieldDefinition,
    ) -> Result<()> {
        let (entity_type, bundle, name) = (entity_type.into(), bundle.into(), name.into());
        let schema = self
            .bundles
            .entry(entity_type.clone())
            .or_default()
            .entry(bundle.clone())
            .or_default();

        if schema.positions.contains_key(&name) {
            return Err(Error::DuplicateField {
                entity_type,
                bundle,
                name,
            });
        }

        schema.positions.insert(name.clone(), schema.fields.len());
        schema.fields.push((name, definition));
        self.len += 1;
        Ok(())
    }

    /// Look up one field's definition
    pub fn get_field(
        &self,
        entity_type: &str,
        bundle: &str,
        name: &str,
    ) -> Option<&FieldDefinition> {
        let schema = self.bundle(entity_type, bundle)?;
        let position = *schema.positions.get(name)?;
        schema.fields.get(position).map(|(_, definition)| definition)
    }

    /// Look up one field's source-system type name
    pub fn get_source_type(&self, entity_type: &str, bundle: &str, name: &str) -> Option<&str> {
        self.get_field(entity_type, bundle, name)
            .map(|definition| definition.source_type.as_str())
    }

    /// Names of required fields of a bundle for which `has_field` is false.
    ///
    /// Only presence is checked. Names come back in registration order.
    pub fn validate<F>(&self, entity_type: &str, bundle: &str, has_field: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let Some(schema) = self.bundle(entity_type, bundle) else {
            return Vec::new();
        };
        schema
            .fields
            .iter()
            .filter(|(name, definition)| definition.required && !has_field(name.as_str()))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Fields registered for a bundle, in registration order
    pub fn fields(
        &self,
        entity_type: &str,
        bundle: &str,
    ) -> impl Iterator<Item = (&str, &FieldDefinition)> {
        self.bundle(entity_type, bundle)
            .into_iter()
            .flat_map(|schema| schema.fields.iter())
            .map(|(name, definition)| (name.as_str(), definition))
    }

    /// Total number of registered fields
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn bundle(&self, entity_type: &str, bundle: &str) -> Option<&BundleSchema> {
        self.bundles.get(entity_type)?.get(bundle)
    }
}
