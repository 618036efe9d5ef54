//! Map entities through the profile and write hub records

use anyhow::{Context, Result};
use hubshift_core::Config;
use hubshift_core::mapping::apply_profile;
use hubshift_core::sources::EntitySource;

/// Run the extract command
pub async fn run(config_path: &str) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    tracing::info!("Extracting project: {}", config.project.name);

    let registry = config.load_registry().context("Failed to load schema")?;
    let profile = config
        .load_profile()
        .context("Failed to load profile")?
        .ok_or_else(|| anyhow::anyhow!("No profile configured in hubshift.yaml"))?;

    let mut source = config.open_source().context("Failed to open input")?;
    let mut sink = config.open_sink().context("Failed to open output")?;

    let mut read = 0usize;
    let mut written = 0usize;
    while let Some(mut entity) = source.pull().await? {
        read += 1;
        if let Some(registry) = &registry {
            entity.attach_registry(registry)?;
        }

        let Some(record) = apply_profile(&profile, &entity)
            .with_context(|| format!("Entity #{} rejected by profile '{}'", read, profile.name))?
        else {
            continue;
        };
        sink.push(record).await?;
        written += 1;
    }
    sink.flush().await?;

    tracing::info!(
        "✓ Wrote {} records ({} entities read, {} skipped)",
        written,
        read,
        read - written
    );
    Ok(())
}
