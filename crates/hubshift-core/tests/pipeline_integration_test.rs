//! Integration tests for the complete extraction pipeline
//!
//! Tests use temporary directories with real file fixtures to verify:
//! - Project config loading with schema and profile files
//! - Registry attachment and required-field validation
//! - Type-inferred and requested decoding through a profile
//! - JSONL and CSV output

use hubshift_core::mapping::apply_profile;
use hubshift_core::sources::EntitySource;
use hubshift_core::{Config, Error, FieldValue};
use tempfile::TempDir;

const SCHEMA: &str = r#"
fields:
  - {entity_type: node, bundle: article, name: title, type: text, required: true}
  - {entity_type: node, bundle: article, name: field_keywords, type: text, cardinality: -1}
  - {entity_type: node, bundle: article, name: field_author, type: reference, required: true}
  - {entity_type: node, bundle: article, name: field_related, type: typed_reference, cardinality: -1}
  - {entity_type: node, bundle: article, name: promote, type: boolean}
  - {entity_type: node, bundle: article, name: field_geo, type: geofield}
"#;

const EXPORT: &str = r#"{"entity_type":"node","bundle":"article","fields":{"title":[{"value":"One"}],"field_keywords":[{"value":"rust"},{"value":"cms"}],"field_author":[{"target_id":"3"}],"field_related":[{"target_id":"9","target_type":"media"}],"promote":[{"value":"1"}],"field_geo":[{"lat":1.5,"lon":2.5}]}}
{"entity_type":"node","bundle":"article","fields":{"title":"Two","field_keywords":null,"field_related":[]}}
{"entity_type":"user","bundle":"user","fields":{"name":[{"value":"admin"}]}}
"#;

/// Helper to create a temporary project with the given profile and output.
fn setup_project(profile: &str, output: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("profiles")).unwrap();
    std::fs::create_dir_all(dir.path().join("data")).unwrap();

    std::fs::write(
        dir.path().join("hubshift.yaml"),
        format!(
            r#"
name: pipeline
schema: schema.yaml
profile: profiles/articles.yaml
input:
  path: data/export.jsonl
output:
{output}
"#
        ),
    )
    .unwrap();
    std::fs::write(dir.path().join("schema.yaml"), SCHEMA).unwrap();
    std::fs::write(dir.path().join("profiles/articles.yaml"), profile).unwrap();
    std::fs::write(dir.path().join("data/export.jsonl"), EXPORT).unwrap();
    dir
}

/// Run the whole pipeline, returning how many records were written.
async fn run(config: &Config) -> hubshift_core::Result<usize> {
    let registry = config.load_registry()?.unwrap();
    let profile = config.load_profile()?.unwrap();
    let mut source = config.open_source()?;
    let mut sink = config.open_sink()?;

    let mut written = 0;
    while let Some(mut entity) = source.pull().await? {
        entity.attach_registry(&registry)?;
        if let Some(record) = apply_profile(&profile, &entity)? {
            sink.push(record).await?;
            written += 1;
        }
    }
    sink.flush().await?;
    Ok(written)
}

// =============================================================================
// Complete Pipeline Tests
// =============================================================================

#[tokio::test]
async fn test_pipeline_to_jsonl() {
    let profile = r#"
name: articles
entity_type: node
fields:
  - {source: title, target: title}
  - {source: field_keywords, target: keywords}
  - {source: field_author, target: author}
  - {source: field_related, target: related}
  - {source: promote, target: promoted}
  - {source: field_geo, target: geo}
"#;
    let dir = setup_project(profile, "  path: out/records.jsonl");
    let config = Config::load(dir.path()).unwrap();

    assert_eq!(run(&config).await.unwrap(), 2);

    let output = std::fs::read_to_string(dir.path().join("out/records.jsonl")).unwrap();
    let lines: Vec<serde_json::Value> = output
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(
        lines[0],
        serde_json::json!({
            "entity_type": "node",
            "bundle": "article",
            "title": "One",
            "keywords": ["rust", "cms"],
            "author": [{"target_id": "3"}],
            "related": [{"target_id": "9", "target_type": "media"}],
            "promoted": true,
            "geo": [{"lat": 1.5, "lon": 2.5}],
        })
    );

    // Scalar title, null and empty repetitions
    assert_eq!(lines[1]["title"], "Two");
    assert_eq!(lines[1]["keywords"], serde_json::json!([]));
    assert_eq!(lines[1]["author"], serde_json::json!([]));
    assert_eq!(lines[1]["promoted"], false);
    assert_eq!(lines[1]["geo"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_pipeline_to_csv() {
    let profile = r#"
name: articles
entity_type: node
bundle: article
fields:
  - {source: title, target: title}
  - {source: field_keywords, target: keywords}
  - {source: field_related, target: related}
"#;
    let dir = setup_project(profile, "  path: out/records.csv\n  format: csv");
    let config = Config::load(dir.path()).unwrap();

    assert_eq!(run(&config).await.unwrap(), 2);

    let output = std::fs::read_to_string(dir.path().join("out/records.csv")).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines,
        vec![
            "entity_type,bundle,title,keywords,related",
            "node,article,One,rust|cms,media:9",
            "node,article,Two,,",
        ]
    );
}

#[tokio::test]
async fn test_strict_profile_stops_on_missing_required() {
    let profile = r#"
name: articles
entity_type: node
strict: true
fields:
  - {source: title, target: title}
"#;
    let dir = setup_project(profile, "  path: out/records.jsonl");
    let config = Config::load(dir.path()).unwrap();

    match run(&config).await {
        Err(Error::MissingRequired { fields, bundle, .. }) => {
            assert_eq!(bundle, "article");
            assert_eq!(fields, vec!["field_author"]);
        }
        other => panic!("Expected MissingRequired, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_entities_decode_from_loaded_registry() {
    let dir = setup_project("name: articles\n", "  path: out/records.jsonl");
    let config = Config::load(dir.path()).unwrap();
    let registry = config.load_registry().unwrap().unwrap();
    let mut source = config.open_source().unwrap();

    let mut first = source.pull().await.unwrap().unwrap();
    first.attach_registry(&registry).unwrap();
    assert!(first.validate().is_empty());
    assert_eq!(
        first.get("field_keywords"),
        FieldValue::Texts(vec!["rust".into(), "cms".into()])
    );
    assert!(matches!(
        first.attach_registry(&registry),
        Err(Error::RegistryAlreadyAttached { .. })
    ));

    let mut second = source.pull().await.unwrap().unwrap();
    second.attach_registry(&registry).unwrap();
    assert_eq!(second.validate(), vec!["field_author"]);

    // No schema for users: nothing is required
    let mut user = source.pull().await.unwrap().unwrap();
    user.attach_registry(&registry).unwrap();
    assert!(user.validate().is_empty());
    assert_eq!(user.get_text("name"), "admin");

    assert!(source.pull().await.unwrap().is_none());
}
