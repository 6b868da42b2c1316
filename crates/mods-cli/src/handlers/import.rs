use crate::output::print_json;
use crate::types::OutputFormat;
use anyhow::{Context, Result};
use mods_index::{SqliteStore, StoreDump};
use std::path::Path;

pub fn handle(store: &SqliteStore, file: &Path, format: OutputFormat) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let dump: StoreDump = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid store dump", file.display()))?;

    let foreign = dump
        .calls
        .iter()
        .map(|c| c.project_id.as_str())
        .chain(dump.objects.iter().map(|o| o.project_id.as_str()))
        .filter(|p| *p != store.project_id())
        .count();
    if foreign > 0 {
        tracing::warn!(
            records = foreign,
            project = store.project_id(),
            "dump contains records for other projects; they will not show up in queries for this project"
        );
    }

    let summary = store.import(&dump)?;
    match format {
        OutputFormat::Json => print_json(&summary)?,
        _ => println!(
            "Imported {} calls and {} objects into {}",
            summary.calls,
            summary.objects,
            store.project_id()
        ),
    }
    Ok(())
}
