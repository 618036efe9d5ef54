//! Hub record sinks
//!
//! Sinks write mapped [`HubRecord`]s out as reports: JSONL for further
//! processing, CSV for review in a spreadsheet.

use async_trait::async_trait;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::mapping::HubRecord;

/// Separator between values of a multi-value field in a CSV cell
pub const CSV_VALUE_SEPARATOR: &str = "|";

/// Trait for hub record sinks
#[async_trait]
pub trait RecordSink: Send {
    /// Write one record
    async fn push(&mut self, record: HubRecord) -> Result<()>;

    /// Flush any buffered records
    async fn flush(&mut self) -> Result<()>;
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

// ============================================================================
// JSONL
// ============================================================================

/// Writes one JSON object per record per line
pub struct JsonlSink {
    writer: BufWriter<File>,
}

impl JsonlSink {
    /// Create (or truncate) the output file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = create_file(path.as_ref())?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

#[async_trait]
impl RecordSink for JsonlSink {
    async fn push(&mut self, record: HubRecord) -> Result<()> {
        let line = serde_json::to_string(&record.into_json())?;
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

// ============================================================================
// CSV
// ============================================================================

/// Writes records as CSV rows.
///
/// The header comes from the first record. Later records are written in
/// that column order; columns they lack are left blank and extra columns
/// are ignored.
pub struct CsvSink {
    writer: csv::Writer<File>,
    header: Option<Vec<String>>,
}

impl CsvSink {
    /// Create (or truncate) the output file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = create_file(path.as_ref())?;
        Ok(Self {
            writer: csv::Writer::from_writer(file),
            header: None,
        })
    }
}

#[async_trait]
impl RecordSink for CsvSink {
    async fn push(&mut self, record: HubRecord) -> Result<()> {
        let header = match &self.header {
            Some(header) => header.clone(),
            None => {
                let header: Vec<String> =
                    record.columns().into_iter().map(str::to_string).collect();
                self.writer.write_record(&header)?;
                self.header = Some(header.clone());
                header
            }
        };

        let row: Vec<String> = header
            .iter()
            .map(|column| match column.as_str() {
                "entity_type" => record.entity_type.clone(),
                "bundle" => record.bundle.clone(),
                name => record.get(name).map(cell).unwrap_or_default(),
            })
            .collect();
        self.writer.write_record(&row)?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Render a hub value as a single CSV cell
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(cell)
            .collect::<Vec<_>>()
            .join(CSV_VALUE_SEPARATOR),
        Value::Object(obj) => {
            if let Some(id) = obj.get("target_id") {
                match obj.get("target_type") {
                    Some(target_type) => format!("{}:{}", cell(target_type), cell(id)),
                    None => cell(id),
                }
            } else if let Some(url) = obj.get("url") {
                cell(url)
            } else {
                value.to_string()
            }
        }
    }
}
