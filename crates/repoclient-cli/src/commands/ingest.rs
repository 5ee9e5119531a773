//! `repoclient ingest` command implementation
//!
//! Registers and transfers one or more directories, reporting the
//! aggregated outcome.

use crate::api::RepositoryClient;
use crate::error::Result;
use crate::ingest::IngestionCoordinator;
use crate::outcome::CommandResult;
use crate::plugin::PluginRegistry;
use crate::progress;
use crate::settings::Scope;
use crate::transfer::HttpTransferBackend;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

/// Ingest directories into the repository
pub async fn run(directories: Vec<PathBuf>, note: String) -> Result<CommandResult> {
    let settings = super::validated_settings(&Scope::ORDER).await?;

    let client = Arc::new(RepositoryClient::from_settings(&settings)?);
    let backend = Arc::new(HttpTransferBackend::from_settings(&settings)?);
    // No external plugins are bundled; the registry hands out the no-op
    // identity plugin until one is registered.
    let plugins = PluginRegistry::new();
    let coordinator = IngestionCoordinator::new(client, backend)
        .with_plugin(plugins.active())
        .with_cancellation(super::cancellation_channel());

    println!(
        "{} Ingesting {} directory(ies)...",
        "→".cyan(),
        directories.len()
    );
    let spinner = progress::create_spinner("Registering and transferring...");
    let result = coordinator.ingest_all(&directories, &note, &settings).await?;
    spinner.finish_and_clear();

    for item in result.items() {
        match (&item.identifier, &item.error) {
            (Some(identifier), None) => {
                println!("{} {} -> {}", "✓".green(), item.directory.display(), identifier);
            }
            (_, Some(error)) => {
                println!("{} {}: {}", "✗".red(), item.directory.display(), error);
            }
            _ => {}
        }
    }

    Ok(result)
}
