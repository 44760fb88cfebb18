//! Database management commands.

use std::path::Path;

use console::style;
use serde::Deserialize;

use crate::config::Settings;
use crate::models::CameraRange;
use crate::repository::util::redact_url_password;
use crate::service::RangeEntry;

/// Create the camera range table.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    println!(
        "{} Initializing {}",
        style("→").cyan(),
        redact_url_password(&settings.database_url())
    );

    let ctx = settings.create_db_context()?;
    ctx.init_schema().await?;

    println!("{} Camera range table ready", style("✓").green());
    Ok(())
}

/// Load ranges from a JSON file.
pub async fn cmd_import(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;
    let ranges = parse_import(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", file.display(), e))?;

    println!(
        "{} Importing {} camera ranges from {}",
        style("→").cyan(),
        ranges.len(),
        file.display()
    );

    settings.ensure_directories()?;
    let ctx = settings.create_db_context()?;
    ctx.init_schema().await?;
    let report = ctx.importer().import(&ranges).await?;

    for (a, b) in &report.overlaps {
        println!(
            "  {} Ranges {} and {} overlap across different models",
            style("!").yellow(),
            a,
            b
        );
    }
    println!(
        "{} Imported {} camera ranges",
        style("✓").green(),
        report.written
    );

    Ok(())
}

/// Accepted import layouts.
#[derive(Deserialize)]
#[serde(untagged)]
enum ImportFile {
    Plain(Vec<CameraRange>),
    Envelope { data: Vec<RangeEntry> },
}

fn parse_import(contents: &str) -> Result<Vec<CameraRange>, serde_json::Error> {
    let ranges = match serde_json::from_str(contents)? {
        ImportFile::Plain(ranges) => ranges,
        ImportFile::Envelope { data } => data.into_iter().map(CameraRange::from).collect(),
    };
    Ok(ranges)
}
