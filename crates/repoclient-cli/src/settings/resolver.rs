//! Scope-by-scope settings validation against the Repository Service.
//!
//! `inspect_scope` is the pure check: it reads from the service and the
//! bundle and reports a `ScopeStatus` without prompting or mutating
//! anything. `Resolver` drives the checks in dependency order and, in
//! query mode, feeds failures to its repair strategy until each scope
//! validates.

use crate::api::RepositoryClient;
use crate::error::{CliError, Result};
use crate::settings::bundle::{SettingsBundle, SettingsKey, SourceRank};
use crate::settings::repair::RepairStrategy;
use crate::settings::Scope;
use tracing::{debug, info, warn};

/// How validation failures are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Fail on the first invalid scope
    Test,
    /// Ask the repair strategy for replacement values until the scope
    /// validates
    Query,
}

/// One valid value for a settings key, as reported by the service
#[derive(Debug, Clone)]
pub struct Choice {
    pub value: String,
    pub description: Option<String>,
}

impl Choice {
    fn new(value: impl Into<String>, description: Option<String>) -> Self {
        Self {
            value: value.into(),
            description,
        }
    }
}

/// Outcome of inspecting one scope
#[derive(Debug, Clone)]
pub enum ScopeStatus {
    Valid,
    /// A key of the scope has no value at all
    Missing { key: SettingsKey },
    /// A key has a value the service does not accept; `choices` lists
    /// the accepted values where the service can enumerate them
    Invalid {
        key: SettingsKey,
        choices: Vec<Choice>,
    },
}

impl ScopeStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, ScopeStatus::Valid)
    }
}

/// Check one scope against the Repository Service without mutating the
/// bundle. Earlier scopes in `Scope::ORDER` are assumed valid; a broken
/// prerequisite surfaces as a request error.
pub async fn inspect_scope(
    client: &RepositoryClient,
    bundle: &SettingsBundle,
    scope: Scope,
) -> Result<ScopeStatus> {
    match scope {
        Scope::ServerBase => {
            if client.check_service().await? {
                Ok(ScopeStatus::Valid)
            } else {
                Ok(ScopeStatus::Invalid {
                    key: SettingsKey::ServerUrl,
                    choices: Vec::new(),
                })
            }
        }
        Scope::Authentication => {
            for key in [SettingsKey::AccessKey, SettingsKey::AccessSecret] {
                if bundle.get(key).is_none() {
                    return Ok(ScopeStatus::Missing { key });
                }
            }
            match client.group_count().await {
                Ok(count) if count >= 1 => Ok(ScopeStatus::Valid),
                Ok(_) => Err(CliError::api(
                    "Service reports no groups; the repository is not initialized",
                )),
                Err(err) => {
                    debug!(error = %err, "Credential check failed");
                    Ok(ScopeStatus::Invalid {
                        key: SettingsKey::AccessKey,
                        choices: Vec::new(),
                    })
                }
            }
        }
        Scope::Context => {
            let groups = client.list_groups().await?;
            if groups.is_empty() {
                return Err(CliError::api(
                    "Service reports no groups; the repository is not initialized",
                ));
            }
            let group_choices: Vec<Choice> = groups
                .iter()
                .map(|g| Choice::new(&g.group_id, g.group_name.clone()))
                .collect();
            let group = match bundle.get(SettingsKey::UserGroup) {
                Some(group) if group_choices.iter().any(|c| c.value == group) => group,
                Some(_) | None => {
                    return Ok(ScopeStatus::Invalid {
                        key: SettingsKey::UserGroup,
                        choices: group_choices,
                    })
                }
            };

            let investigations = client.list_investigations(group).await?;
            if investigations.is_empty() {
                return Err(CliError::config(format!(
                    "No investigation exists for group '{}'; create one in the repository first",
                    group
                )));
            }
            let inv_choices: Vec<Choice> = investigations
                .iter()
                .map(|i| Choice::new(i.investigation_id.to_string(), i.topic.clone()))
                .collect();
            match bundle.get(SettingsKey::Investigation) {
                Some(inv) if inv_choices.iter().any(|c| c.value == inv) => Ok(ScopeStatus::Valid),
                Some(_) | None => Ok(ScopeStatus::Invalid {
                    key: SettingsKey::Investigation,
                    choices: inv_choices,
                }),
            }
        }
        Scope::AccessPoint => {
            let group = bundle.require(SettingsKey::UserGroup)?;
            let access_points = client.list_access_points(group).await?;
            if access_points.is_empty() {
                return Err(CliError::config(format!(
                    "No access point is defined for group '{}'; configure one in the repository first",
                    group
                )));
            }
            let choices: Vec<Choice> = access_points
                .iter()
                .map(|ap| Choice::new(&ap.unique_identifier, ap.description.clone()))
                .collect();
            match bundle.get(SettingsKey::AccessPoint) {
                Some(ap) if choices.iter().any(|c| c.value == ap) => Ok(ScopeStatus::Valid),
                Some(_) | None => Ok(ScopeStatus::Invalid {
                    key: SettingsKey::AccessPoint,
                    choices,
                }),
            }
        }
        Scope::TransferCredentials => {
            for key in [SettingsKey::TransferUsername, SettingsKey::TransferPassword] {
                if bundle.get(key).is_none() {
                    return Ok(ScopeStatus::Missing { key });
                }
            }
            Ok(ScopeStatus::Valid)
        }
    }
}

/// Walks the requested scopes in dependency order and brings the bundle
/// into a validated state.
pub struct Resolver<R: RepairStrategy> {
    repair: R,
}

impl<R: RepairStrategy> Resolver<R> {
    pub fn new(repair: R) -> Self {
        Self { repair }
    }

    /// Validate `scopes` and return the (possibly repaired) bundle.
    ///
    /// In `Test` mode the first invalid scope fails with
    /// [`CliError::InvalidSettings`]. In `Query` mode each failure is
    /// routed through the repair strategy and the scope re-checked until
    /// it validates; repaired values are persisted only after the
    /// strategy confirms the save.
    pub async fn resolve(
        &self,
        mut bundle: SettingsBundle,
        scopes: &[Scope],
        mode: ResolveMode,
    ) -> Result<SettingsBundle> {
        let mut changed = false;
        for scope in Scope::ordered(scopes) {
            self.resolve_scope(&mut bundle, scope, mode, &mut changed)
                .await?;
            debug!(%scope, "Scope validated");
        }
        if changed {
            if self.repair.confirm_save()? {
                bundle.save()?;
                info!(path = %bundle.user_file().display(), "Settings saved");
            } else {
                warn!("Repaired settings were not saved and apply to this run only");
            }
        }
        Ok(bundle)
    }

    async fn resolve_scope(
        &self,
        bundle: &mut SettingsBundle,
        scope: Scope,
        mode: ResolveMode,
        changed: &mut bool,
    ) -> Result<()> {
        loop {
            let client = client_for(bundle)?;
            let status = inspect_scope(&client, bundle, scope).await?;
            match status {
                ScopeStatus::Valid => {
                    self.adopt_server_identity(&client, bundle, scope, changed)
                        .await?;
                    for key in scope.keys() {
                        bundle.mark_validated(*key);
                    }
                    return Ok(());
                }
                ScopeStatus::Missing { key } | ScopeStatus::Invalid { key, choices: _ }
                    if mode == ResolveMode::Test =>
                {
                    warn!(%scope, key = %key, "Scope validation failed");
                    return Err(CliError::InvalidSettings { scope });
                }
                ScopeStatus::Missing { key } => {
                    let value = self.repair.supply(key, bundle.get(key), &[])?;
                    bundle.set(key, value, SourceRank::Repaired);
                    *changed = true;
                }
                ScopeStatus::Invalid { key, choices } => {
                    let value = self.repair.supply(key, bundle.get(key), &choices)?;
                    bundle.set(key, value, SourceRank::Repaired);
                    *changed = true;
                }
            }
        }
    }

    /// Once authentication validates, align the stored user id with the
    /// identity the service reports for the credentials.
    async fn adopt_server_identity(
        &self,
        client: &RepositoryClient,
        bundle: &mut SettingsBundle,
        scope: Scope,
        changed: &mut bool,
    ) -> Result<()> {
        if scope != Scope::Authentication {
            return Ok(());
        }
        let user = client.get_current_user().await?;
        let stored = bundle.get(SettingsKey::UserId);
        if stored != Some(user.distinguished_name.as_str()) {
            if let Some(stored) = stored {
                warn!(
                    stored = %stored,
                    reported = %user.distinguished_name,
                    "Stored user id does not match the credentials, adopting the reported identity"
                );
            }
            bundle.set(
                SettingsKey::UserId,
                user.distinguished_name,
                SourceRank::Repaired,
            );
            *changed = true;
        }
        Ok(())
    }
}

/// Build a client from whatever the bundle currently holds. Credentials
/// may still be unvalidated here; requests then fail and surface as an
/// invalid scope.
fn client_for(bundle: &SettingsBundle) -> Result<RepositoryClient> {
    RepositoryClient::new(
        bundle.require(SettingsKey::ServerUrl)?,
        bundle.get(SettingsKey::AccessKey).unwrap_or_default(),
        bundle.get(SettingsKey::AccessSecret).unwrap_or_default(),
    )
}
