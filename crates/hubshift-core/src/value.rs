//! Decoded field values
//!
//! These are the outputs of decoding. They are never stored on an entity;
//! the entity keeps the encoded payload and decodes on every read.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// A reference to another entity.
///
/// Plain references leave `target_type` empty because the field fixes the
/// target type. Typed (polymorphic) references record it per entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Identifier of the referenced entity
    pub target_id: String,

    /// Entity type of the referenced entity, when recorded per entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
}

impl Reference {
    /// Create a reference with an implicit target type
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            target_type: None,
        }
    }

    /// Create a reference that carries its own target type
    pub fn typed(target_id: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            target_type: Some(target_type.into()),
        }
    }
}

/// A hyperlink with an optional display title
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Link target
    pub url: String,

    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A decoded field value.
///
/// Returned by the type-inferred accessor and by generic decoding. Serializes
/// untagged, so `Text` becomes a JSON string, `Texts` an array of strings,
/// and `Empty` becomes `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// No value present
    Empty,
    /// A single string
    Text(String),
    /// Ordered strings, in source repetition order
    Texts(Vec<String>),
    /// An integer
    Integer(i64),
    /// A boolean
    Boolean(bool),
    /// Ordered timestamps
    Dates(Vec<DateTime<Utc>>),
    /// Ordered references
    References(Vec<Reference>),
    /// Ordered links
    Links(Vec<Link>),
    /// Ordered property maps, for structured payloads without a known type
    Maps(Vec<Map<String, Value>>),
}

impl FieldValue {
    /// Whether this value carries no data.
    ///
    /// Empty strings and empty sequences count as empty; `Integer(0)` and
    /// `Boolean(false)` do not.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::Texts(v) => v.is_empty(),
            Self::Integer(_) | Self::Boolean(_) => false,
            Self::Dates(v) => v.is_empty(),
            Self::References(v) => v.is_empty(),
            Self::Links(v) => v.is_empty(),
            Self::Maps(v) => v.is_empty(),
        }
    }

    /// Convert into a JSON value for hub records.
    ///
    /// Same shape as the `Serialize` output; dates keep their sub-second
    /// precision.
    pub fn into_json(self) -> Value {
        serde_json::to_value(&self).unwrap_or_default()
    }
}
