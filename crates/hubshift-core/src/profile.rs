//! Mapping profile configuration
//!
//! A profile says which source fields feed which hub fields, and
//! optionally which decoder reads each source field. Profiles are parsed
//! here and applied by [`crate::mapping`].
//!
//! # Example
//!
//! ```yaml
//! name: articles
//! entity_type: node
//! bundle: article
//! strict: false
//! fields:
//!   - source: title
//!     target: headline
//!
//!   - source: field_tags
//!     target: tags
//!     as: refs
//!     resolve: normalize
//!     limit: 10
//!
//!   - source: body
//!     target: body_html
//!     as: formatted_text
//!     processed: true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::decode::{RefOptions, ResolveMode, TextOptions};
use crate::entity::DynamicEntity;
use crate::error::{Error, Result};
use crate::registry::{FieldDefinition, FieldType};

/// Hub record columns every record carries; targets may not reuse them
pub const RESERVED_TARGETS: [&str; 2] = ["entity_type", "bundle"];

/// Type-requested decoder for a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeAs {
    /// First textual value
    Text,
    /// All textual values
    Texts,
    /// First value as an integer
    Int,
    /// First value as a boolean
    Bool,
    /// References with an implicit target type
    Refs,
    /// References carrying their own target type
    TypedRefs,
    /// Dates
    Dates,
    /// Links
    Links,
    /// Formatted text
    FormattedText,
    /// Shape-based decoding, ignoring the registry
    Generic,
}

impl DecodeAs {
    /// The decoder the type-inferred read uses for a declared field
    pub fn for_definition(definition: &FieldDefinition) -> Self {
        match &definition.field_type {
            FieldType::Text if definition.is_multiple() => Self::Texts,
            FieldType::Text => Self::Text,
            FieldType::Integer => Self::Int,
            FieldType::Boolean => Self::Bool,
            FieldType::Date => Self::Dates,
            FieldType::Reference => Self::Refs,
            FieldType::TypedReference => Self::TypedRefs,
            FieldType::Link => Self::Links,
            FieldType::FormattedText => Self::FormattedText,
            FieldType::Other(_) => Self::Generic,
        }
    }

    /// Mapping options this decoder honors
    pub fn options(self) -> &'static [&'static str] {
        match self {
            Self::Text => &["locale", "trim"],
            Self::Texts => &["limit", "locale", "trim"],
            Self::Refs | Self::TypedRefs => &["limit", "resolve"],
            Self::FormattedText => &["processed"],
            Self::Int | Self::Bool | Self::Dates | Self::Links | Self::Generic => &[],
        }
    }
}

/// One source field to hub field mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Source field name on the entity
    pub source: String,

    /// Hub field name in the output record
    pub target: String,

    /// Decoder to use. When absent the registry's declared type decides.
    #[serde(default, rename = "as", skip_serializing_if = "Option::is_none")]
    pub decode_as: Option<DecodeAs>,

    /// Keep at most this many values (texts and references)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Locale filter (texts)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Trim whitespace (texts)
    #[serde(default)]
    pub trim: bool,

    /// Identifier handling (references)
    #[serde(default)]
    pub resolve: ResolveMode,

    /// Prefer the processed form (formatted text)
    #[serde(default = "default_processed")]
    pub processed: bool,
}

fn default_processed() -> bool {
    true
}

impl FieldMapping {
    /// A mapping that uses type-inferred decoding
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            decode_as: None,
            limit: None,
            locale: None,
            trim: false,
            resolve: ResolveMode::AsIs,
            processed: default_processed(),
        }
    }

    /// Request a specific decoder
    pub fn decode_as(mut self, decode_as: DecodeAs) -> Self {
        self.decode_as = Some(decode_as);
        self
    }

    /// Text decoding options carried by this mapping
    pub fn text_options(&self) -> TextOptions {
        TextOptions {
            limit: self.limit,
            locale: self.locale.clone(),
            trim: self.trim,
        }
    }

    /// Names of the decoder options this mapping sets
    pub fn set_options(&self) -> Vec<&'static str> {
        let mut set = Vec::new();
        if self.limit.is_some() {
            set.push("limit");
        }
        if self.locale.is_some() {
            set.push("locale");
        }
        if self.trim {
            set.push("trim");
        }
        if self.resolve != ResolveMode::AsIs {
            set.push("resolve");
        }
        if !self.processed {
            set.push("processed");
        }
        set
    }

    /// Reference decoding options carried by this mapping
    pub fn ref_options(&self) -> RefOptions {
        RefOptions {
            resolve: self.resolve,
            limit: self.limit,
        }
    }
}

/// A mapping profile from `profiles/*.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Profile name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Only map entities of this type
    #[serde(default)]
    pub entity_type: Option<String>,

    /// Only map entities of this bundle
    #[serde(default)]
    pub bundle: Option<String>,

    /// Reject entities that are missing required fields
    #[serde(default)]
    pub strict: bool,

    /// Field mappings, in output column order
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
}

impl Profile {
    /// Parse and check a YAML profile document
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let profile: Profile = serde_yaml::from_str(contents)?;
        profile.check()?;
        Ok(profile)
    }

    /// Load a YAML profile file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Whether an entity falls within this profile's type and bundle filter
    pub fn matches(&self, entity: &DynamicEntity<'_>) -> bool {
        self.entity_type
            .as_deref()
            .is_none_or(|t| t == entity.entity_type())
            && self.bundle.as_deref().is_none_or(|b| b == entity.bundle())
    }

    /// Hub field names, in mapping order
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|m| m.target.as_str())
    }

    fn check(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for mapping in &self.fields {
            if mapping.source.is_empty() || mapping.target.is_empty() {
                return Err(self.invalid("mappings need a non-empty source and target"));
            }
            if RESERVED_TARGETS.contains(&mapping.target.as_str()) {
                return Err(self.invalid(&format!("target '{}' is reserved", mapping.target)));
            }
            if !seen.insert(mapping.target.as_str()) {
                return Err(self.invalid(&format!("target '{}' is mapped twice", mapping.target)));
            }
            self.check_options(mapping)?;
        }
        Ok(())
    }

    fn check_options(&self, mapping: &FieldMapping) -> Result<()> {
        let set = mapping.set_options();
        match mapping.decode_as {
            Some(decode_as) => {
                let allowed = decode_as.options();
                if let Some(option) = set.iter().find(|o| !allowed.contains(*o)) {
                    return Err(self.invalid(&format!(
                        "option '{}' on target '{}' does not apply to {:?} decoding",
                        option, mapping.target, decode_as
                    )));
                }
            }
            // Inferred: the declared type picks the decoder, so text-only
            // and reference-only options cannot both apply.
            None => {
                let text_only = set.iter().any(|o| matches!(*o, "locale" | "trim"));
                let ref_only = set.contains(&"resolve");
                if text_only && ref_only {
                    return Err(self.invalid(&format!(
                        "target '{}' mixes text options with 'resolve'",
                        mapping.target
                    )));
                }
            }
        }
        Ok(())
    }

    fn invalid(&self, message: &str) -> Error {
        Error::ConfigInvalid {
            message: format!("profile '{}': {}", self.name, message),
        }
    }
}
