//! Dynamic entities
//!
//! A [`DynamicEntity`] is one migrated record: an entity type, a bundle and
//! a map of field name to still-encoded payload. Payloads are decoded on
//! every read and never modified by reads, so accessors are idempotent.
//!
//! An entity is either unregistered (no schema registry) or registered. In
//! the unregistered state only raw access and the type-requested accessors
//! (`get_text`, `get_refs`, ...) are meaningful; [`DynamicEntity::get`]
//! falls back to generic decoding, [`DynamicEntity::get_field_schema`]
//! returns `None` and [`DynamicEntity::validate`] reports nothing.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::decode::{self, RefOptions, TextOptions};
use crate::error::{Error, Result};
use crate::registry::{FieldDefinition, FieldType, SchemaRegistry};
use crate::value::{FieldValue, Link, Reference};

/// One record with dynamically-typed fields
#[derive(Debug, Clone)]
pub struct DynamicEntity<'r> {
    entity_type: String,
    bundle: String,
    fields: HashMap<String, Vec<u8>>,
    registry: Option<&'r SchemaRegistry>,
}

impl<'r> DynamicEntity<'r> {
    /// Create an entity with no fields and no registry
    pub fn new(entity_type: impl Into<String>, bundle: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            bundle: bundle.into(),
            fields: HashMap::new(),
            registry: None,
        }
    }

    /// Entity type, e.g. `node`
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Bundle within the entity type, e.g. `article`
    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    /// Store a field's encoded payload, replacing any previous payload
    /// under the same name.
    pub fn set_field(&mut self, name: impl Into<String>, payload: impl Into<Vec<u8>>) {
        let name = name.into();
        let payload = payload.into();
        if decode::is_malformed(&payload) {
            tracing::debug!(
                entity_type = %self.entity_type,
                bundle = %self.bundle,
                field = %name,
                "Field payload is not valid JSON; reads will return zero values"
            );
        }
        self.fields.insert(name, payload);
    }

    /// Attach the schema registry that types this entity's fields.
    ///
    /// A registry can be attached once; a second attach fails with
    /// [`Error::RegistryAlreadyAttached`] and leaves the first in place.
    pub fn attach_registry(&mut self, registry: &'r SchemaRegistry) -> Result<()> {
        if self.registry.is_some() {
            return Err(Error::RegistryAlreadyAttached {
                entity_type: self.entity_type.clone(),
                bundle: self.bundle.clone(),
            });
        }
        self.registry = Some(registry);
        Ok(())
    }

    /// The attached registry, if any
    pub fn registry(&self) -> Option<&'r SchemaRegistry> {
        self.registry
    }

    /// Whether a field is present, regardless of any registry
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Names of all present fields, in no particular order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of present fields
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// The encoded payload of a field, or an empty slice if absent
    pub fn raw(&self, name: &str) -> &[u8] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// The registry's definition of a field.
    ///
    /// Always `None` without a registry, even for present fields.
    pub fn get_field_schema(&self, name: &str) -> Option<&'r FieldDefinition> {
        self.registry?
            .get_field(&self.entity_type, &self.bundle, name)
    }

    /// Required fields the registry declares for this bundle that are absent.
    ///
    /// Empty without a registry.
    pub fn validate(&self) -> Vec<String> {
        match self.registry {
            Some(registry) => {
                registry.validate(&self.entity_type, &self.bundle, |name| self.has_field(name))
            }
            None => Vec::new(),
        }
    }

    /// First repetition as text, or `""`
    pub fn get_text(&self, name: &str) -> String {
        decode::decode_text(self.raw(name))
    }

    /// First repetition in the requested locale as text, trimmed on request
    pub fn get_text_with(&self, name: &str, options: &TextOptions) -> String {
        decode::decode_text_with(self.raw(name), options)
    }

    /// All textual values in source order
    pub fn get_texts(&self, name: &str, options: &TextOptions) -> Vec<String> {
        decode::decode_texts(self.raw(name), options)
    }

    /// First value as an integer, or `0`
    pub fn get_int(&self, name: &str) -> i64 {
        decode::decode_int(self.raw(name))
    }

    /// First value as a boolean, or `false`
    pub fn get_bool(&self, name: &str) -> bool {
        decode::decode_bool(self.raw(name))
    }

    /// References with an implicit target type
    pub fn get_refs(&self, name: &str, options: &RefOptions) -> Vec<Reference> {
        decode::decode_refs(self.raw(name), options)
    }

    /// References that each carry their own target type
    pub fn get_typed_refs(&self, name: &str, options: &RefOptions) -> Vec<Reference> {
        decode::decode_typed_refs(self.raw(name), options)
    }

    /// Parsed dates; unparseable repetitions are dropped and logged
    pub fn get_dates(&self, name: &str) -> Vec<DateTime<Utc>> {
        let (dates, dropped) = decode::parse_dates(self.raw(name));
        if dropped > 0 {
            tracing::debug!(
                entity_type = %self.entity_type,
                bundle = %self.bundle,
                field = %name,
                dropped,
                "Dropped unparseable date values"
            );
        }
        dates
    }

    /// Links with optional titles
    pub fn get_links(&self, name: &str) -> Vec<Link> {
        decode::decode_links(self.raw(name))
    }

    /// Formatted text, processed form when requested and available
    pub fn get_formatted_text(&self, name: &str, use_processed: bool) -> String {
        decode::decode_formatted_text(self.raw(name), use_processed)
    }

    /// Type-inferred read.
    ///
    /// With a registry that declares the field, decodes by the declared
    /// type and multiplicity. Otherwise decodes generically by shape.
    pub fn get(&self, name: &str) -> FieldValue {
        match self.get_field_schema(name) {
            Some(definition) => self.decode_declared(name, definition),
            None => decode::decode_generic(self.raw(name)),
        }
    }

    fn decode_declared(&self, name: &str, definition: &FieldDefinition) -> FieldValue {
        match &definition.field_type {
            FieldType::Text if definition.is_multiple() => {
                FieldValue::Texts(self.get_texts(name, &TextOptions::default()))
            }
            FieldType::Text => FieldValue::Text(self.get_text(name)),
            FieldType::Integer => FieldValue::Integer(self.get_int(name)),
            FieldType::Boolean => FieldValue::Boolean(self.get_bool(name)),
            FieldType::Date => FieldValue::Dates(self.get_dates(name)),
            FieldType::Reference => {
                FieldValue::References(self.get_refs(name, &RefOptions::default()))
            }
            FieldType::TypedReference => {
                FieldValue::References(self.get_typed_refs(name, &RefOptions::default()))
            }
            FieldType::Link => FieldValue::Links(self.get_links(name)),
            FieldType::FormattedText => FieldValue::Text(self.get_formatted_text(name, true)),
            FieldType::Other(_) => decode::decode_generic(self.raw(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article_registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        let fields = [
            ("title", FieldDefinition::new(FieldType::Text).required()),
            ("date", FieldDefinition::new(FieldType::Date).required()),
            ("tags", FieldDefinition::new(FieldType::Text).multiple()),
            ("subtitle", FieldDefinition::new(FieldType::Text)),
            ("weight", FieldDefinition::new(FieldType::Integer)),
            ("promoted", FieldDefinition::new(FieldType::Boolean)),
            ("authors", FieldDefinition::new(FieldType::TypedReference).multiple()),
            ("category", FieldDefinition::new(FieldType::Reference)),
            ("body", FieldDefinition::new(FieldType::FormattedText)),
            ("website", FieldDefinition::new(FieldType::Link)),
            ("location", FieldDefinition::new(FieldType::Other("geofield".into()))),
        ];
        for (name, definition) in fields {
            registry.register("node", "article", name, definition).unwrap();
        }
        registry
    }

    #[test]
    fn test_absent_field_zero_values() {
        let entity = DynamicEntity::new("node", "article");
        assert!(!entity.has_field("nonexistent"));
        assert!(entity.raw("nonexistent").is_empty());
        assert_eq!(entity.get_text("nonexistent"), "");
        assert!(entity.get_texts("nonexistent", &TextOptions::new()).is_empty());
        assert_eq!(entity.get_int("nonexistent"), 0);
        assert!(!entity.get_bool("nonexistent"));
        assert!(entity.get_refs("nonexistent", &RefOptions::new()).is_empty());
        assert!(entity.get_typed_refs("nonexistent", &RefOptions::new()).is_empty());
        assert!(entity.get_dates("nonexistent").is_empty());
        assert!(entity.get_links("nonexistent").is_empty());
        assert_eq!(entity.get_formatted_text("nonexistent", true), "");
        assert_eq!(entity.get("nonexistent"), FieldValue::Empty);
    }

    #[test]
    fn test_multiplicity_fidelity() {
        let mut entity = DynamicEntity::new("node", "article");
        entity.set_field("letters", r#"["a","b","c"]"#);
        assert_eq!(
            entity.get_texts("letters", &TextOptions::new()),
            vec!["a", "b", "c"]
        );
        assert_eq!(entity.get_text("letters"), "a");
    }

    #[test]
    fn test_accessors_are_idempotent() {
        let mut entity = DynamicEntity::new("node", "article");
        entity.set_field("tags", r#"[{"value":"x"},{"value":"y"}]"#);
        let before = entity.raw("tags").to_vec();
        let first = entity.get("tags");
        let second = entity.get("tags");
        assert_eq!(first, second);
        assert_eq!(entity.get_text("tags"), entity.get_text("tags"));
        assert_eq!(entity.raw("tags"), before.as_slice());
    }

    #[test]
    fn test_type_inferred_multi_value_text() {
        let registry = article_registry();
        let mut entity = DynamicEntity::new("node", "article");
        entity.set_field("tags", r#"["x","y"]"#);
        entity.attach_registry(&registry).unwrap();

        let inferred = entity.get("tags");
        assert_eq!(
            inferred,
            FieldValue::Texts(entity.get_texts("tags", &TextOptions::default()))
        );
        assert_ne!(inferred, FieldValue::Text(entity.get_text("tags")));
    }

    #[test]
    fn test_type_inferred_single_value_text() {
        let registry = article_registry();
        let mut entity = DynamicEntity::new("node", "article");
        entity.set_field("subtitle", r#"["first","second"]"#);
        entity.attach_registry(&registry).unwrap();
        assert_eq!(entity.get("subtitle"), FieldValue::Text("first".into()));
    }

    #[test]
    fn test_type_inferred_dispatch_table() {
        let registry = article_registry();
        let mut entity = DynamicEntity::new("node", "article");
        entity.set_field("weight", r#"[{"value":"12"}]"#);
        entity.set_field("promoted", r#"[{"value":"1"}]"#);
        entity.set_field(
            "authors",
            r#"[{"target_id":1,"target_type":"user"},{"target_id":"x","target_type":"group"}]"#,
        );
        entity.set_field("category", r#"[{"target_id":4,"target_type":"taxonomy_term"}]"#);
        entity.set_field("body", r#"[{"value":"*hi*","processed":"<em>hi</em>"}]"#);
        entity.set_field("website", r#"[{"uri":"https://example.com","title":"Home"}]"#);
        entity.set_field("date", r#"[{"value":"2024-05-01"}]"#);
        entity.set_field("location", r#"[{"lat":1.5,"lon":2.5}]"#);
        entity.attach_registry(&registry).unwrap();

        assert_eq!(entity.get("weight"), FieldValue::Integer(12));
        assert_eq!(entity.get("promoted"), FieldValue::Boolean(true));
        assert_eq!(
            entity.get("authors"),
            FieldValue::References(vec![
                Reference::typed("1", "user"),
                Reference::typed("x", "group"),
            ])
        );
        assert_eq!(
            entity.get("category"),
            FieldValue::References(vec![Reference::new("4")])
        );
        assert_eq!(entity.get("body"), FieldValue::Text("<em>hi</em>".into()));
        assert_eq!(
            entity.get("website"),
            FieldValue::Links(vec![Link {
                url: "https://example.com".into(),
                title: Some("Home".into()),
            }])
        );
        let FieldValue::Dates(dates) = entity.get("date") else {
            panic!("Expected dates");
        };
        assert_eq!(dates.len(), 1);
        assert!(matches!(entity.get("location"), FieldValue::Maps(m) if m[0]["lat"] == 1.5));
    }

    #[test]
    fn test_undeclared_field_falls_back_to_generic() {
        let registry = article_registry();
        let mut entity = DynamicEntity::new("node", "article");
        entity.set_field("field_extra", r#"["p","q"]"#);
        entity.attach_registry(&registry).unwrap();
        assert!(entity.get_field_schema("field_extra").is_none());
        assert_eq!(
            entity.get("field_extra"),
            FieldValue::Texts(vec!["p".into(), "q".into()])
        );
    }

    #[test]
    fn test_no_registry_fallback() {
        let mut entity = DynamicEntity::new("node", "article");
        entity.set_field("title", r#"[{"value":"Hello"}]"#);
        assert!(entity.registry().is_none());
        assert!(entity.get_field_schema("title").is_none());
        assert!(entity.get_field_schema("anything").is_none());
        assert!(entity.validate().is_empty());
        assert!(matches!(entity.get("title"), FieldValue::Maps(_)));
        assert_eq!(entity.get_text("title"), "Hello");
    }

    #[test]
    fn test_validate_reports_missing_required() {
        let registry = article_registry();
        let mut entity = DynamicEntity::new("node", "article");
        entity.set_field("title", r#""Hello""#);
        entity.attach_registry(&registry).unwrap();
        assert_eq!(entity.validate(), vec!["date"]);
    }

    #[test]
    fn test_validate_is_presence_only() {
        let registry = article_registry();
        let mut entity = DynamicEntity::new("node", "article");
        entity.set_field("title", "");
        entity.set_field("date", "null");
        entity.attach_registry(&registry).unwrap();
        assert!(entity.validate().is_empty());
    }

    #[test]
    fn test_attach_registry_only_once() {
        let registry = article_registry();
        let other = SchemaRegistry::new();
        let mut entity = DynamicEntity::new("node", "article");
        entity.attach_registry(&registry).unwrap();
        let err = entity.attach_registry(&other).unwrap_err();
        assert!(matches!(err, Error::RegistryAlreadyAttached { .. }));
        assert!(entity.get_field_schema("title").is_some());
    }

    #[test]
    fn test_field_names_and_replacement() {
        let mut entity = DynamicEntity::new("node", "article");
        entity.set_field("a", "1");
        entity.set_field("b", "2");
        entity.set_field("a", "3");
        let mut names: Vec<&str> = entity.field_names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(entity.field_count(), 2);
        assert_eq!(entity.get_int("a"), 3);
    }

    #[test]
    fn test_malformed_payload_degrades() {
        let registry = article_registry();
        let mut entity = DynamicEntity::new("node", "article");
        entity.set_field("weight", "{broken");
        entity.attach_registry(&registry).unwrap();
        assert!(entity.has_field("weight"));
        assert_eq!(entity.raw("weight"), b"{broken");
        assert_eq!(entity.get("weight"), FieldValue::Integer(0));
    }

    #[test]
    fn test_registry_shared_by_many_entities() {
        let registry = article_registry();
        let entities: Vec<DynamicEntity<'_>> = (0..3)
            .map(|i| {
                let mut entity = DynamicEntity::new("node", "article");
                entity.set_field("weight", i.to_string());
                entity.attach_registry(&registry).unwrap();
                entity
            })
            .collect();
        let weights: Vec<FieldValue> = entities.iter().map(|e| e.get("weight")).collect();
        assert_eq!(
            weights,
            vec![
                FieldValue::Integer(0),
                FieldValue::Integer(1),
                FieldValue::Integer(2)
            ]
        );
    }
}
