//! List the fields present in the input

use anyhow::{Context, Result};
use hubshift_core::Config;
use hubshift_core::sources::EntitySource;
use std::collections::BTreeMap;

/// Run the fields command
pub async fn run(config_path: &str) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    let registry = config.load_registry().context("Failed to load schema")?;
    let mut source = config.open_source().context("Failed to open input")?;

    let mut counts: BTreeMap<(String, String, String), usize> = BTreeMap::new();
    while let Some(entity) = source.pull().await? {
        for name in entity.field_names() {
            let key = (
                entity.entity_type().to_string(),
                entity.bundle().to_string(),
                name.to_string(),
            );
            *counts.entry(key).or_default() += 1;
        }
    }

    if counts.is_empty() {
        println!("No fields found.");
        return Ok(());
    }

    println!("Fields in {}:", config.project.input.path);
    println!();
    for ((entity_type, bundle, name), count) in &counts {
        let source_type = registry
            .as_ref()
            .and_then(|r| r.get_source_type(entity_type, bundle, name))
            .unwrap_or("(undeclared)");
        println!(
            "  {}/{}.{}  {}  x{}",
            entity_type, bundle, name, source_type, count
        );
    }

    Ok(())
}
