//! Configuration parsing and validation
//!
//! This module handles loading Hubshift project configuration files.
//!
//! # Configuration Files
//!
//! - `hubshift.yaml` - Project root configuration
//! - `schema.yaml` - Field definitions for the schema registry (see [`crate::registry`])
//! - `profiles/*.yaml` - Mapping profiles (see [`crate::profile`])
//!
//! # Example
//!
//! ```yaml
//! name: blog-migration
//! schema: schema.yaml
//! profile: profiles/articles.yaml
//! input:
//!   path: data/export.jsonl
//! output:
//!   path: out/articles.csv
//!   format: csv
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::profile::Profile;
use crate::registry::SchemaRegistry;
use crate::sinks::{CsvSink, JsonlSink, RecordSink};
use crate::sources::JsonlEntitySource;

/// Root project configuration from `hubshift.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Project version
    #[serde(default = "default_version")]
    pub version: String,

    /// Schema file path, relative to the project directory
    #[serde(default)]
    pub schema: Option<String>,

    /// Mapping profile path, relative to the project directory
    #[serde(default)]
    pub profile: Option<String>,

    /// Entity input
    pub input: InputConfig,

    /// Hub record output
    #[serde(default)]
    pub output: Option<OutputConfig>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Entity input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// JSONL export path, one entity per line
    pub path: String,
}

/// Hub record output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output file path
    pub path: String,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output file format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Jsonl,
    /// Comma-separated values with a header row
    Csv,
}

/// Main configuration container
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Base path of the project
    pub base_path: PathBuf,
}

impl Config {
    /// Load configuration from a directory
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the project directory or hubshift.yaml file
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = Config::load("./my-migration")?;
    /// println!("Project: {}", config.project.name);
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let (config_path, base_path) = if path.is_dir() {
            (path.join("hubshift.yaml"), path.to_path_buf())
        } else {
            (
                path.to_path_buf(),
                path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            )
        };

        if !config_path.exists() {
            return Err(Error::ConfigNotFound {
                path: config_path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let project: ProjectConfig = serde_yaml::from_str(&contents)?;

        if project.input.path.trim().is_empty() {
            return Err(Error::ConfigInvalid {
                message: "input.path must not be empty".to_string(),
            });
        }

        Ok(Self { project, base_path })
    }

    /// Resolve a project-relative path. Absolute paths are returned as-is.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    /// Load the schema registry, if the project names a schema file
    pub fn load_registry(&self) -> Result<Option<SchemaRegistry>> {
        self.project
            .schema
            .as_deref()
            .map(|schema| SchemaRegistry::load(self.resolve_path(schema)))
            .transpose()
    }

    /// Load the mapping profile, if the project names one
    pub fn load_profile(&self) -> Result<Option<Profile>> {
        self.project
            .profile
            .as_deref()
            .map(|profile| Profile::load(self.resolve_path(profile)))
            .transpose()
    }

    /// Open the configured entity input
    pub fn open_source(&self) -> Result<JsonlEntitySource> {
        JsonlEntitySource::open(self.resolve_path(&self.project.input.path))
    }

    /// Open the configured output sink
    pub fn open_sink(&self) -> Result<Box<dyn RecordSink>> {
        let output = self.project.output.as_ref().ok_or_else(|| Error::ConfigInvalid {
            message: format!("project '{}' has no output configured", self.project.name),
        })?;
        let path = self.resolve_path(&output.path);
        let sink: Box<dyn RecordSink> = match output.format {
            OutputFormat::Jsonl => Box::new(JsonlSink::create(path)?),
            OutputFormat::Csv => Box::new(CsvSink::create(path)?),
        };
        Ok(sink)
    }
}
