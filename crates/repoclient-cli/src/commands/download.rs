//! `repoclient download` command implementation
//!
//! Retrieves a previously ingested digital object into a local
//! directory. Without an object id the object is picked interactively.

use crate::api::RepositoryClient;
use crate::error::{CliError, Result};
use crate::outcome::{CommandResult, ItemOutcome};
use crate::progress;
use crate::settings::{Scope, SettingsKey};
use crate::transfer::{HttpTransferBackend, TransferController};
use colored::Colorize;
use inquire::Select;
use std::path::PathBuf;
use std::sync::Arc;

/// Download one digital object into `output_dir`
pub async fn run(
    output_dir: PathBuf,
    object_id: Option<String>,
    interactive: bool,
) -> Result<CommandResult> {
    let settings = super::validated_settings(&Scope::ORDER).await?;
    let group = settings.require(SettingsKey::UserGroup)?.to_string();
    let access_point = settings.require(SettingsKey::AccessPoint)?.to_string();

    let client = Arc::new(RepositoryClient::from_settings(&settings)?);
    let backend = Arc::new(HttpTransferBackend::from_settings(&settings)?);

    let object_id = match object_id {
        Some(id) if !interactive => {
            // A bad identifier should fail here, not after a transfer
            // request was already created.
            client.get_digital_object(&id, &group).await?;
            id
        }
        _ => select_object(&client, &group).await?,
    };

    println!("{} Downloading '{}'...", "→".cyan(), object_id);
    let spinner = progress::create_spinner("Waiting for the staging area...");
    let controller = TransferController::new(client, backend)
        .with_cancellation(super::cancellation_channel());
    let outcome = controller
        .run_download(&object_id, &access_point, &group, &output_dir)
        .await;
    spinner.finish_and_clear();

    let item = match outcome {
        Ok(written) => {
            println!("{} {} -> {}", "✓".green(), object_id, written.display());
            ItemOutcome::succeeded(written, object_id)
        }
        Err(error) => {
            println!("{} {}: {}", "✗".red(), object_id, error);
            ItemOutcome::failed(output_dir, error)
        }
    };
    Ok(CommandResult::aggregate("download", vec![item]))
}

/// Let the user pick one of the group's digital objects
async fn select_object(client: &RepositoryClient, group: &str) -> Result<String> {
    let objects = client.list_digital_objects(group).await?;
    if objects.is_empty() {
        return Err(CliError::api(format!(
            "Group '{}' has no digital objects to download",
            group
        )));
    }

    let options: Vec<String> = objects
        .iter()
        .map(|o| {
            format!(
                "{} - {}",
                o.identifier.as_deref().unwrap_or("<unregistered>"),
                o.label
            )
        })
        .collect();
    let picked = Select::new("Select a digital object:", options)
        .raw_prompt()
        .map_err(|e| CliError::config(format!("prompt aborted: {}", e)))?;

    objects[picked.index]
        .identifier
        .clone()
        .ok_or_else(|| CliError::api("Selected digital object carries no identifier"))
}
