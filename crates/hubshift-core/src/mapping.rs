//! Profile mapping
//!
//! Applies a [`Profile`] to a [`DynamicEntity`], producing a [`HubRecord`].
//! Field values never fail to decode; the only error is a strict profile
//! meeting an entity that lacks required fields.

use serde_json::{Map, Value};

use crate::decode;
use crate::entity::DynamicEntity;
use crate::error::{Error, Result};
use crate::profile::{DecodeAs, FieldMapping, Profile};
use crate::value::FieldValue;

/// One entity converted to the hub schema
#[derive(Debug, Clone, PartialEq)]
pub struct HubRecord {
    /// Source entity type
    pub entity_type: String,

    /// Source bundle
    pub bundle: String,

    /// Hub fields, in profile order
    pub fields: Vec<(String, Value)>,
}

impl HubRecord {
    /// Column names: `entity_type`, `bundle`, then the hub fields
    pub fn columns(&self) -> Vec<&str> {
        ["entity_type", "bundle"]
            .into_iter()
            .chain(self.fields.iter().map(|(name, _)| name.as_str()))
            .collect()
    }

    /// Look up a hub field
    pub fn get(&self, name: &str) -> Option<&Value> {
        match name {
            "entity_type" | "bundle" => None,
            _ => self
                .fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
        }
    }

    /// Flatten into a single JSON object, keys in column order
    pub fn into_json(self) -> Value {
        let mut obj = Map::new();
        obj.insert("entity_type".to_string(), Value::String(self.entity_type));
        obj.insert("bundle".to_string(), Value::String(self.bundle));
        for (name, value) in self.fields {
            obj.insert(name, value);
        }
        Value::Object(obj)
    }
}

/// Decode one source field as a mapping directs.
///
/// Without `as`, the registry's declared type picks the decoder and the
/// mapping's options apply to it. Fields the registry does not declare are
/// decoded generically.
pub fn extract(entity: &DynamicEntity<'_>, mapping: &FieldMapping) -> FieldValue {
    let name = mapping.source.as_str();
    let decode_as = mapping
        .decode_as
        .or_else(|| entity.get_field_schema(name).map(DecodeAs::for_definition))
        .unwrap_or(DecodeAs::Generic);
    match decode_as {
        DecodeAs::Text => FieldValue::Text(entity.get_text_with(name, &mapping.text_options())),
        DecodeAs::Texts => FieldValue::Texts(entity.get_texts(name, &mapping.text_options())),
        DecodeAs::Int => FieldValue::Integer(entity.get_int(name)),
        DecodeAs::Bool => FieldValue::Boolean(entity.get_bool(name)),
        DecodeAs::Refs => FieldValue::References(entity.get_refs(name, &mapping.ref_options())),
        DecodeAs::TypedRefs => {
            FieldValue::References(entity.get_typed_refs(name, &mapping.ref_options()))
        }
        DecodeAs::Dates => FieldValue::Dates(entity.get_dates(name)),
        DecodeAs::Links => FieldValue::Links(entity.get_links(name)),
        DecodeAs::FormattedText => {
            FieldValue::Text(entity.get_formatted_text(name, mapping.processed))
        }
        DecodeAs::Generic => decode::decode_generic(entity.raw(name)),
    }
}

/// Apply a profile to an entity.
///
/// Returns `Ok(None)` when the entity is outside the profile's type and
/// bundle filter. Missing required fields fail a strict profile with
/// [`Error::MissingRequired`]; a lenient profile logs them and maps anyway.
pub fn apply_profile(profile: &Profile, entity: &DynamicEntity<'_>) -> Result<Option<HubRecord>> {
    if !profile.matches(entity) {
        return Ok(None);
    }

    let missing = entity.validate();
    if !missing.is_empty() {
        if profile.strict {
            return Err(Error::MissingRequired {
                entity_type: entity.entity_type().to_string(),
                bundle: entity.bundle().to_string(),
                fields: missing,
            });
        }
        tracing::warn!(
            profile = %profile.name,
            entity_type = %entity.entity_type(),
            bundle = %entity.bundle(),
            "Missing required fields: {}",
            missing.join(", ")
        );
    }

    let fields = profile
        .fields
        .iter()
        .map(|mapping| (mapping.target.clone(), extract(entity, mapping).into_json()))
        .collect();

    Ok(Some(HubRecord {
        entity_type: entity.entity_type().to_string(),
        bundle: entity.bundle().to_string(),
        fields,
    }))
}
