//! Read commands: list, show and lookup.

use std::sync::Arc;

use console::style;

use crate::config::Settings;
use crate::service::{LookupError, LookupService, RangeEntry};

fn open_service(settings: &Settings) -> anyhow::Result<LookupService> {
    let ctx = settings.create_db_context()?;
    Ok(LookupService::new(Arc::new(ctx.ranges()))
        .with_query_timeout(settings.database.query_timeout))
}

/// List every camera range.
pub async fn cmd_list(settings: &Settings) -> anyhow::Result<()> {
    let service = open_service(settings)?;
    let result = service.list_all().await?;
    let entries = result.entries();

    if entries.is_empty() {
        println!("{} No camera ranges. Run 'rolleilookup db import <file>'.", style("!").yellow());
        return Ok(());
    }

    println!(
        "{:>5}  {:>9}  {:>9}  {:<6}  {}",
        style("ID").bold(),
        style("FROM").bold(),
        style("TO").bold(),
        style("YEAR").bold(),
        style("MODEL").bold()
    );
    for entry in entries {
        let attrs = &entry.attributes;
        let year = attrs
            .year_produced
            .map(|y| y.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>5}  {:>9}  {:>9}  {:<6}  {}",
            entry.id, attrs.serial_start, attrs.serial_end, year, attrs.model_name
        );
    }
    println!("\n{} ranges", entries.len());

    Ok(())
}

/// Show one camera range by id.
pub async fn cmd_show(settings: &Settings, id: &str) -> anyhow::Result<()> {
    let service = open_service(settings)?;
    match service.find_by_id(id).await {
        Ok(result) => {
            result.entries().iter().for_each(print_entry);
            Ok(())
        }
        Err(LookupError::NotFound) => anyhow::bail!("No camera range with id {}", id),
        Err(e) => Err(e.into()),
    }
}

/// Find the camera range containing a serial number.
pub async fn cmd_lookup(settings: &Settings, serial: &str) -> anyhow::Result<()> {
    let service = open_service(settings)?;
    match service.find_by_serial(serial).await {
        Ok(result) => {
            println!("{} Serial {}", style("✓").green(), serial);
            result.entries().iter().for_each(print_entry);
            Ok(())
        }
        Err(LookupError::NotFound) => anyhow::bail!("No camera range contains serial {}", serial),
        Err(e) => Err(e.into()),
    }
}

fn print_entry(entry: &RangeEntry) {
    let attrs = &entry.attributes;
    println!("  {}", style(&attrs.model_name).bold());
    println!("  Range:        {} - {}", attrs.serial_start, attrs.serial_end);
    if let Some(year) = attrs.year_produced {
        println!("  Produced:     {}", year);
    }
    if let Some(ref lens) = attrs.taking_lens {
        println!("  Taking lens:  {}", lens);
    }
    if let Some(ref lens) = attrs.looking_lens {
        println!("  Viewing lens: {}", lens);
    }
    if let Some(ref description) = attrs.description {
        println!("  {}", style(description).dim());
    }
    println!("  {}", style(format!("id {}", entry.id)).dim());
}
