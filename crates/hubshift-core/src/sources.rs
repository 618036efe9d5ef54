//! Entity sources
//!
//! Sources read exported records and populate [`DynamicEntity`] values.
//! Field payloads are kept encoded exactly as they appear in the export;
//! decoding happens later through the entity's accessors.
//!
//! # Record format
//!
//! One JSON object per line:
//!
//! ```text
//! {"entity_type":"node","bundle":"article","fields":{"title":[{"value":"Hello"}]}}
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::value::RawValue;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::entity::DynamicEntity;
use crate::error::{Error, Result};

/// Trait for entity sources
#[async_trait]
pub trait EntitySource: Send {
    /// Pull the next entity, or `None` when the source is exhausted
    async fn pull(&mut self) -> Result<Option<DynamicEntity<'static>>>;
}

#[derive(Deserialize)]
struct EntityRecord {
    entity_type: String,
    bundle: String,
    #[serde(default)]
    fields: HashMap<String, Box<RawValue>>,
}

/// Build an entity from one exported JSON record.
///
/// Each field's payload is stored byte-for-byte as it appears in `record`.
pub fn entity_from_json(record: &str) -> serde_json::Result<DynamicEntity<'static>> {
    let record: EntityRecord = serde_json::from_str(record)?;
    let mut entity = DynamicEntity::new(record.entity_type, record.bundle);
    for (name, payload) in record.fields {
        entity.set_field(name, payload.get().as_bytes());
    }
    Ok(entity)
}

/// JSONL file source, one entity per line
pub struct JsonlEntitySource {
    path: PathBuf,
    reader: BufReader<File>,
    line_number: usize,
}

impl JsonlEntitySource {
    /// Open a JSONL export
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self {
            path,
            reader: BufReader::new(file),
            line_number: 0,
        })
    }

    /// Path being read
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EntitySource for JsonlEntitySource {
    async fn pull(&mut self) -> Result<Option<DynamicEntity<'static>>> {
        let mut line = String::new();
        loop {
            line.clear();
            let bytes_read = self.reader.read_line(&mut line)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let entity = entity_from_json(trimmed).map_err(|e| Error::InvalidRecord {
                line: self.line_number,
                message: e.to_string(),
            })?;
            tracing::trace!(
                line = self.line_number,
                entity_type = %entity.entity_type(),
                bundle = %entity.bundle(),
                fields = entity.field_count(),
                "Loaded entity"
            );
            return Ok(Some(entity));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_entity_from_json_keeps_payloads_encoded() {
        let entity = entity_from_json(
            r#"{"entity_type":"node","bundle":"article","fields":{"title":[{"value":"Hi"}],"n":5}}"#,
        )
        .unwrap();
        assert_eq!(entity.entity_type(), "node");
        assert_eq!(entity.bundle(), "article");
        assert_eq!(entity.raw("title"), br#"[{"value":"Hi"}]"#);
        assert_eq!(entity.raw("n"), b"5");
        assert_eq!(entity.get_text("title"), "Hi");
    }

    #[test]
    fn test_entity_from_json_without_fields() {
        let entity = entity_from_json(r#"{"entity_type":"user","bundle":"user"}"#).unwrap();
        assert_eq!(entity.field_count(), 0);
    }

    #[test]
    fn test_entity_from_json_requires_identity() {
        assert!(entity_from_json(r#"{"bundle":"article"}"#).is_err());
    }

    #[tokio::test]
    async fn test_jsonl_source_reads_all_and_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"entity_type":"node","bundle":"article","fields":{{}}}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"entity_type":"node","bundle":"page","fields":{{}}}}"#).unwrap();
        file.flush().unwrap();

        let mut source = JsonlEntitySource::open(file.path()).unwrap();
        let first = source.pull().await.unwrap().unwrap();
        let second = source.pull().await.unwrap().unwrap();
        assert_eq!(first.bundle(), "article");
        assert_eq!(second.bundle(), "page");
        assert!(source.pull().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_jsonl_source_reports_bad_line_number() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"entity_type":"node","bundle":"article"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "not json").unwrap();
        file.flush().unwrap();

        let mut source = JsonlEntitySource::open(file.path()).unwrap();
        assert!(source.pull().await.unwrap().is_some());
        match source.pull().await {
            Err(Error::InvalidRecord { line, .. }) => assert_eq!(line, 3),
            other => panic!("Expected invalid record, got {:?}", other.map(|e| e.is_some())),
        }
    }

    #[test]
    fn test_open_missing_file() {
        let result = JsonlEntitySource::open("/nonexistent/hubshift/export.jsonl");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
