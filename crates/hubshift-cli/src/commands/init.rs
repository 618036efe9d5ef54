//! Initialize a new Hubshift project

use anyhow::Result;
use std::fs;
use std::path::Path;

/// Run the init command
pub async fn run(path: &str, name: Option<&str>) -> Result<()> {
    let project_dir = Path::new(path);

    if !project_dir.exists() {
        fs::create_dir_all(project_dir)?;
    }

    let abs_path = project_dir.canonicalize()?;

    // Derive project name from directory name if not provided
    let project_name = match name {
        Some(n) => n.to_string(),
        None => abs_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("Could not determine project name from path"))?,
    };

    if project_dir.join("hubshift.yaml").exists() {
        anyhow::bail!(
            "Directory '{}' already contains a hubshift.yaml",
            project_dir.display()
        );
    }

    tracing::info!("Creating new Hubshift project: {}", project_name);

    fs::create_dir_all(project_dir.join("profiles"))?;
    fs::create_dir_all(project_dir.join("data"))?;

    let config = format!(
        r#"# Hubshift Project Configuration
name: {project_name}
version: "0.1.0"

schema: schema.yaml
profile: profiles/articles.yaml

input:
  path: data/export.jsonl

output:
  path: out/articles.jsonl
  format: jsonl
"#
    );
    fs::write(project_dir.join("hubshift.yaml"), config)?;

    let schema = r#"# Field definitions exported from the source site
fields:
  - entity_type: node
    bundle: article
    name: title
    type: text
    required: true
    source_type: string

  - entity_type: node
    bundle: article
    name: created
    type: date
    required: true
    source_type: created

  - entity_type: node
    bundle: article
    name: body
    type: formatted_text
    source_type: text_with_summary

  - entity_type: node
    bundle: article
    name: field_tags
    type: reference
    cardinality: -1
    source_type: entity_reference

  - entity_type: node
    bundle: article
    name: field_links
    type: link
    cardinality: -1
    source_type: link
"#;
    fs::write(project_dir.join("schema.yaml"), schema)?;

    let profile = r#"# Maps article nodes to hub records
name: articles
description: Published articles
entity_type: node
bundle: article
strict: false

fields:
  - source: title
    target: headline

  - source: created
    target: published

  - source: body
    target: body_html

  - source: field_tags
    target: tags
    as: refs
    resolve: normalize

  - source: field_links
    target: links
"#;
    fs::write(project_dir.join("profiles/articles.yaml"), profile)?;

    let export = r#"{"entity_type":"node","bundle":"article","fields":{"title":[{"value":"Hello world"}],"created":[{"value":"1700000000"}],"body":[{"value":"Hi","processed":"<p>Hi</p>"}],"field_tags":[{"target_id":"007"},{"target_id":"12"}],"field_links":[{"uri":"https://example.com","title":"Example"}]}}
{"entity_type":"node","bundle":"article","fields":{"title":[{"value":"Second post"}],"created":[{"value":"2024-01-15T09:30:00Z"}],"field_tags":[]}}
{"entity_type":"node","bundle":"article","fields":{"title":[{"value":"Draft without a date"}]}}
{"entity_type":"node","bundle":"page","fields":{"title":[{"value":"About"}]}}
"#;
    fs::write(project_dir.join("data/export.jsonl"), export)?;

    let gitignore = r#"# Hubshift output
/out/
"#;
    fs::write(project_dir.join(".gitignore"), gitignore)?;

    tracing::info!("✓ Created hubshift.yaml");
    tracing::info!("✓ Created schema.yaml");
    tracing::info!("✓ Created profiles/articles.yaml");
    tracing::info!("✓ Created data/export.jsonl");
    tracing::info!("✓ Created .gitignore");
    tracing::info!("");
    tracing::info!("Next steps:");
    if path != "." {
        tracing::info!("  cd {}", path);
    }
    tracing::info!("  hubshift validate");
    tracing::info!("  hubshift extract");

    Ok(())
}
