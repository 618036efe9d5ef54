//! Validate entities against the schema registry

use anyhow::{Context, Result};
use hubshift_core::Config;
use hubshift_core::sources::EntitySource;

/// Run the validate command
pub async fn run(config_path: &str, strict: bool) -> Result<()> {
    tracing::info!("Validating entities: {}", config_path);

    let config = Config::load(config_path).context("Failed to load configuration")?;
    tracing::info!("✓ Project: {}", config.project.name);

    let Some(registry) = config.load_registry().context("Failed to load schema")? else {
        tracing::warn!("No schema configured, nothing to validate");
        return Ok(());
    };
    tracing::info!("✓ Schema: {} fields", registry.len());

    let mut source = config.open_source().context("Failed to open input")?;

    let mut total = 0usize;
    let mut invalid = 0usize;
    while let Some(mut entity) = source.pull().await? {
        total += 1;
        entity.attach_registry(&registry)?;

        let missing = entity.validate();
        if !missing.is_empty() {
            invalid += 1;
            println!(
                "#{} {}/{}: missing {}",
                total,
                entity.entity_type(),
                entity.bundle(),
                missing.join(", ")
            );
        }
    }

    if invalid == 0 {
        tracing::info!("✓ {} entities valid", total);
        return Ok(());
    }

    tracing::warn!("{} of {} entities are missing required fields", invalid, total);
    if strict {
        anyhow::bail!("{} entities failed validation", invalid);
    }
    Ok(())
}
