//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function returning
//! the aggregated `CommandResult` whose exit code the binary reports.

pub mod download;
pub mod ingest;
pub mod init;
pub mod list;

use crate::error::Result;
use crate::settings::{NoRepair, ResolveMode, Resolver, Scope, SettingsBundle};
use tokio::sync::watch;

/// Load the settings and validate the scopes a command needs. Commands
/// never repair; a failed scope tells the user to run `repoclient init`.
pub(crate) async fn validated_settings(scopes: &[Scope]) -> Result<SettingsBundle> {
    let bundle = SettingsBundle::load()?;
    Resolver::new(NoRepair)
        .resolve(bundle, scopes, ResolveMode::Test)
        .await
}

/// Cancellation channel wired to Ctrl-C
pub(crate) fn cancellation_channel() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(true);
        }
    });
    rx
}
