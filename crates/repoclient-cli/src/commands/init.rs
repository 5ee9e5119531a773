//! `repoclient init` command implementation
//!
//! Validates the settings scope by scope against the Repository
//! Service, prompting for repairs unless `--test-only` is given.

use crate::error::Result;
use crate::outcome::CommandResult;
use crate::settings::{
    InteractiveRepair, NoRepair, ResolveMode, Resolver, Scope, SettingsBundle,
};
use colored::Colorize;

/// Which scopes to validate; no flag set means all of them
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeSelection {
    pub base: bool,
    pub authentication: bool,
    pub context: bool,
    pub access_point: bool,
    pub transfer_credentials: bool,
}

impl ScopeSelection {
    fn scopes(self) -> Vec<Scope> {
        let picked = [
            (self.base, Scope::ServerBase),
            (self.authentication, Scope::Authentication),
            (self.context, Scope::Context),
            (self.access_point, Scope::AccessPoint),
            (self.transfer_credentials, Scope::TransferCredentials),
        ];
        let selected: Vec<Scope> = picked
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, scope)| *scope)
            .collect();
        if selected.is_empty() {
            Scope::ORDER.to_vec()
        } else {
            selected
        }
    }
}

/// Validate (and, unless `test_only`, repair) the client settings
pub async fn run(selection: ScopeSelection, test_only: bool) -> Result<CommandResult> {
    let bundle = SettingsBundle::load()?;
    let scopes = selection.scopes();

    let settings = if test_only {
        Resolver::new(NoRepair)
            .resolve(bundle, &scopes, ResolveMode::Test)
            .await?
    } else {
        Resolver::new(InteractiveRepair)
            .resolve(bundle, &scopes, ResolveMode::Query)
            .await?
    };

    for scope in Scope::ordered(&scopes) {
        println!("{} {} settings valid", "✓".green(), scope);
    }
    println!("Settings file: {}", settings.user_file().display());

    Ok(CommandResult::success())
}
