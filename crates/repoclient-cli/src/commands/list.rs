//! `repoclient list` command implementation
//!
//! Shows the group's ingest requests with their remote status.

use crate::api::{RepositoryClient, TransferKind};
use crate::error::Result;
use crate::outcome::CommandResult;
use crate::settings::{Scope, SettingsKey};
use colored::Colorize;

/// List ingest requests of the configured group
pub async fn run(failed_only: bool) -> Result<CommandResult> {
    let settings =
        super::validated_settings(&[Scope::ServerBase, Scope::Authentication, Scope::Context])
            .await?;
    let group = settings.require(SettingsKey::UserGroup)?;

    let client = RepositoryClient::from_settings(&settings)?;
    let transfers = client.list_transfers(TransferKind::Ingest, group).await?;

    let mut shown = 0usize;
    for transfer in &transfers {
        let status = transfer.status();
        if failed_only && !status.is_failure() {
            continue;
        }
        let status_label = if status.is_failure() {
            status.to_string().red().to_string()
        } else {
            status.to_string().green().to_string()
        };
        println!(
            "{:>6}  {:<20}  {}",
            transfer.id, status_label, transfer.object_id
        );
        shown += 1;
    }

    if shown == 0 {
        let what = if failed_only { "failed ingests" } else { "ingests" };
        println!("No {} for group '{}'", what, group);
    }

    Ok(CommandResult::success())
}
