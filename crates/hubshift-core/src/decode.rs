//! Field payload decoders
//!
//! One decoder per semantic type. Every decoder takes the still-encoded JSON
//! payload of a field and returns a typed value. Decoders are total: an
//! absent, empty or malformed payload yields the type's zero value
//! (`""`, `0`, `false`, an empty `Vec`) and nothing is logged here.
//!
//! # Payload shapes
//!
//! A field may arrive in any of these shapes, and all decoders accept all
//! of them:
//!
//! ```text
//! (empty)                                  zero repetitions
//! null                                     zero repetitions
//! "hello"                                  one repetition (bare scalar)
//! {"value": "hello"}                       one repetition (structured)
//! [{"value": "a"}, {"value": "b"}, "c"]    three repetitions
//! ```
//!
//! Scalar decoders read the first repetition; sequence decoders return every
//! repetition in source order.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::value::{FieldValue, Link, Reference};

/// Options for [`decode_texts`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextOptions {
    /// Keep at most this many values
    #[serde(default)]
    pub limit: Option<usize>,

    /// Keep only values tagged with this locale. Untagged values are kept.
    #[serde(default)]
    pub locale: Option<String>,

    /// Strip surrounding whitespace from each value
    #[serde(default)]
    pub trim: bool,
}

impl TextOptions {
    /// Options that keep every value untouched
    pub fn new() -> Self {
        Self::default()
    }

    /// Truncate to the first `limit` values
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Filter tagged values to one locale
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Trim surrounding whitespace
    pub fn trimmed(mut self) -> Self {
        self.trim = true;
        self
    }
}

/// How reference identifiers are passed on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMode {
    /// Identifiers are returned exactly as encoded
    #[default]
    AsIs,
    /// Identifiers are trimmed, UUIDs lowercased and hyphenated, and
    /// leading zeros stripped from numeric ids. Blank ids are dropped.
    Normalize,
}

/// Options for [`decode_refs`] and [`decode_typed_refs`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefOptions {
    /// Identifier handling
    #[serde(default)]
    pub resolve: ResolveMode,

    /// Keep at most this many references
    #[serde(default)]
    pub limit: Option<usize>,
}

impl RefOptions {
    /// Options that keep every reference as encoded
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier handling
    pub fn with_resolve(mut self, resolve: ResolveMode) -> Self {
        self.resolve = resolve;
        self
    }

    /// Truncate to the first `limit` references
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Decode the first repetition as text, or `""`.
///
/// Like every scalar decoder this reads only the first repetition; a first
/// repetition without a scalar value yields `""`.
pub fn decode_text(raw: &[u8]) -> String {
    decode_text_with(raw, &TextOptions::default())
}

/// Decode the first repetition matching `options.locale` as text.
///
/// `trim` applies to the result; `limit` has no effect on a single value.
pub fn decode_text_with(raw: &[u8], options: &TextOptions) -> String {
    let Some(value) = parse(raw) else {
        return String::new();
    };
    let text = repetitions(&value)
        .into_iter()
        .find(|rep| locale_matches(rep, options.locale.as_deref()))
        .and_then(scalar_text)
        .unwrap_or_default();
    if options.trim {
        text.trim().to_string()
    } else {
        text
    }
}

/// Decode every textual value in source order.
pub fn decode_texts(raw: &[u8], options: &TextOptions) -> Vec<String> {
    let Some(value) = parse(raw) else {
        return Vec::new();
    };
    repetitions(&value)
        .into_iter()
        .filter(|rep| locale_matches(rep, options.locale.as_deref()))
        .filter_map(scalar_text)
        .map(|s| if options.trim { s.trim().to_string() } else { s })
        .take(options.limit.unwrap_or(usize::MAX))
        .collect()
}

/// Decode the first value as an integer, or `0`.
pub fn decode_int(raw: &[u8]) -> i64 {
    first_primitive(raw).and_then(|v| int_of(&v)).unwrap_or(0)
}

/// Decode the first value as a boolean, or `false`.
///
/// Accepts JSON booleans, numbers (non-zero is true) and the strings
/// `1`, `true`, `yes`, `on` in any case.
pub fn decode_bool(raw: &[u8]) -> bool {
    first_primitive(raw).is_some_and(|v| bool_of(&v))
}

/// Decode every repetition as a reference with an implicit target type.
pub fn decode_refs(raw: &[u8], options: &RefOptions) -> Vec<Reference> {
    collect_refs(raw, options, false)
}

/// Decode every repetition as a reference carrying its own target type.
pub fn decode_typed_refs(raw: &[u8], options: &RefOptions) -> Vec<Reference> {
    collect_refs(raw, options, true)
}

/// Decode every repetition as a UTC timestamp. Unparseable entries are dropped.
pub fn decode_dates(raw: &[u8]) -> Vec<DateTime<Utc>> {
    parse_dates(raw).0
}

/// Decode every repetition as a link.
pub fn decode_links(raw: &[u8]) -> Vec<Link> {
    let Some(value) = parse(raw) else {
        return Vec::new();
    };
    repetitions(&value).into_iter().filter_map(link_of).collect()
}

/// Decode the first repetition of a formatted text field.
///
/// Returns the processed (rendered) form when `use_processed` is set and the
/// payload carries a non-empty one, otherwise the raw form.
pub fn decode_formatted_text(raw: &[u8], use_processed: bool) -> String {
    let Some(value) = parse(raw) else {
        return String::new();
    };
    let Some(first) = repetitions(&value).into_iter().next() else {
        return String::new();
    };
    match first {
        Value::Object(obj) => {
            if use_processed {
                let processed = obj
                    .get("processed")
                    .and_then(Value::as_str)
                    .filter(|p| !p.is_empty());
                if let Some(p) = processed {
                    return p.to_string();
                }
            }
            obj.get("value").and_then(primitive_text).unwrap_or_default()
        }
        other => primitive_text(other).unwrap_or_default(),
    }
}

/// Decode by payload shape alone, without semantic typing.
///
/// | payload                         | result          |
/// |---------------------------------|-----------------|
/// | absent, `null`, `[]`, malformed | `Empty`         |
/// | scalar                          | `Text`          |
/// | array of scalars                | `Texts`         |
/// | object, or array with objects   | `Maps`          |
pub fn decode_generic(raw: &[u8]) -> FieldValue {
    let Some(value) = parse(raw) else {
        return FieldValue::Empty;
    };
    match value {
        Value::Null => FieldValue::Empty,
        Value::Object(obj) => FieldValue::Maps(vec![obj]),
        Value::Array(items) => {
            let items: Vec<Value> = items.into_iter().filter(|v| !v.is_null()).collect();
            if items.is_empty() {
                FieldValue::Empty
            } else if items.iter().any(|v| v.is_object() || v.is_array()) {
                FieldValue::Maps(items.into_iter().map(into_map).collect())
            } else {
                FieldValue::Texts(items.iter().filter_map(primitive_text).collect())
            }
        }
        scalar => FieldValue::Text(primitive_text(&scalar).unwrap_or_default()),
    }
}

/// Whether a payload is present but not valid JSON.
pub(crate) fn is_malformed(raw: &[u8]) -> bool {
    !is_blank(raw) && serde_json::from_slice::<Value>(raw).is_err()
}

/// Decode dates, also reporting how many repetitions failed to parse.
pub(crate) fn parse_dates(raw: &[u8]) -> (Vec<DateTime<Utc>>, usize) {
    let Some(value) = parse(raw) else {
        return (Vec::new(), 0);
    };
    let mut dates = Vec::new();
    let mut dropped = 0;
    for rep in repetitions(&value) {
        match primitive(rep).and_then(date_of) {
            Some(date) => dates.push(date),
            None => dropped += 1,
        }
    }
    (dates, dropped)
}

fn is_blank(raw: &[u8]) -> bool {
    raw.iter().all(u8::is_ascii_whitespace)
}

fn parse(raw: &[u8]) -> Option<Value> {
    if is_blank(raw) {
        return None;
    }
    serde_json::from_slice(raw).ok()
}

fn repetitions(value: &Value) -> Vec<&Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().filter(|v| !v.is_null()).collect(),
        other => vec![other],
    }
}

/// The scalar a repetition stands for: itself, or its `value` property.
fn primitive(rep: &Value) -> Option<&Value> {
    let v = match rep {
        Value::Object(obj) => obj.get("value")?,
        other => other,
    };
    match v {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Some(v),
        _ => None,
    }
}

fn first_primitive(raw: &[u8]) -> Option<Value> {
    let value = parse(raw)?;
    let first = repetitions(&value).into_iter().next()?;
    primitive(first).cloned()
}

fn primitive_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar_text(rep: &Value) -> Option<String> {
    primitive(rep).and_then(primitive_text)
}

fn locale_matches(rep: &Value, locale: Option<&str>) -> bool {
    let Some(locale) = locale else {
        return true;
    };
    let tag = rep.as_object().and_then(|obj| {
        obj.get("langcode")
            .or_else(|| obj.get("locale"))
            .and_then(Value::as_str)
    });
    tag.is_none_or(|t| t == locale)
}

fn int_of(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .filter(|f| *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn bool_of(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        _ => false,
    }
}

fn collect_refs(raw: &[u8], options: &RefOptions, typed: bool) -> Vec<Reference> {
    let Some(value) = parse(raw) else {
        return Vec::new();
    };
    repetitions(&value)
        .into_iter()
        .filter_map(|rep| {
            let id = reference_id(rep)?;
            let target_id = match options.resolve {
                ResolveMode::AsIs => id,
                ResolveMode::Normalize => normalize_id(&id)?,
            };
            let target_type = if typed { reference_type(rep) } else { None };
            Some(Reference {
                target_id,
                target_type,
            })
        })
        .take(options.limit.unwrap_or(usize::MAX))
        .collect()
}

fn reference_id(rep: &Value) -> Option<String> {
    let id = match rep {
        Value::Object(obj) => obj.get("target_id").or_else(|| obj.get("id"))?,
        other => other,
    };
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn reference_type(rep: &Value) -> Option<String> {
    let obj = rep.as_object()?;
    obj.get("target_type")
        .or_else(|| obj.get("type"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn normalize_id(id: &str) -> Option<String> {
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    // Digits first: a 32-digit id would otherwise parse as a simple-form UUID.
    if id.bytes().all(|b| b.is_ascii_digit()) {
        let stripped = id.trim_start_matches('0');
        return Some(if stripped.is_empty() { "0" } else { stripped }.to_string());
    }
    if let Ok(uuid) = Uuid::parse_str(id) {
        return Some(uuid.hyphenated().to_string());
    }
    Some(id.to_string())
}

fn date_of(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::Number(n) => n.as_i64().and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return day.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    let digits = s.strip_prefix('-').unwrap_or(s);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return s
            .parse::<i64>()
            .ok()
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single());
    }
    None
}

fn link_of(rep: &Value) -> Option<Link> {
    match rep {
        Value::String(url) if !url.is_empty() => Some(Link {
            url: url.clone(),
            title: None,
        }),
        Value::Object(obj) => {
            let url = obj
                .get("uri")
                .or_else(|| obj.get("url"))
                .and_then(Value::as_str)
                .filter(|u| !u.is_empty())?;
            let title = obj
                .get("title")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            Some(Link {
                url: url.to_string(),
                title,
            })
        }
        _ => None,
    }
}

fn into_map(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(obj) => obj,
        other => {
            let mut obj = Map::new();
            obj.insert("value".to_string(), other);
            obj
        }
    }
}
