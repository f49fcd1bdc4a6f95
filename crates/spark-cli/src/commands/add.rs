//! `spark add` handler: register devices in the cache.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use spark_core::{CacheEntry, DeviceCollection, DeviceSession};
use tabled::Tabled;

use crate::cli::{AddArgs, GlobalOpts, OutputFormat};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled, Serialize)]
struct SavedRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl From<&CacheEntry> for SavedRow {
    fn from(e: &CacheEntry) -> Self {
        Self {
            name: e.name.clone(),
            id: e.id.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: AddArgs, resolved: &Resolved, global: &GlobalOpts) -> Result<(), CliError> {
    let cloud = resolved.cloud.client(SecretString::from(args.token))?;

    let saved = if let Some(id) = args.id {
        let session = DeviceSession::open(cloud, id).await?;
        let entry = CacheEntry {
            name: session.name().unwrap_or_else(|| session.id()).to_owned(),
            id: session.id().to_owned(),
            token: session.token().expose_secret().to_owned(),
        };

        // A single device joins whatever is already cached.
        let mut file = resolved.cache.load()?.unwrap_or_default();
        file.insert(entry.clone());
        resolved.cache.save(&file)?;
        vec![entry]
    } else {
        let collection = DeviceCollection::connect(cloud).await?;
        for failure in collection.failures() {
            eprintln!(
                "{}skipped {} ({}): {}",
                output::error_prefix(output::should_color(global.color)),
                failure.name.as_deref().unwrap_or("unnamed"),
                failure.id,
                failure.error
            );
        }
        collection.persist(&resolved.cache)?;
        collection.cache_entries()
    };

    let rows: Vec<SavedRow> = saved.iter().map(SavedRow::from).collect();
    let rendered = match global.output {
        OutputFormat::Plain => format!(
            "{}\n{}",
            output::heading(
                "The following cores were found and saved: ",
                output::should_color(global.color)
            ),
            output::render_table(&rows)
        ),
        OutputFormat::Json => serde_json::to_string_pretty(&rows)?,
        OutputFormat::JsonCompact => serde_json::to_string(&rows)?,
    };
    output::print_output(&rendered, global.quiet);
    Ok(())
}
