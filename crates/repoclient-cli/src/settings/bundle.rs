//! Settings bundle: the connection/authentication/context values needed
//! before any remote call can be made.
//!
//! Values are merged from three sources in increasing precedence:
//! bundled defaults, the per-user settings file and an optional override
//! file named by the `REPOCLIENT_SETTINGS` environment variable. After
//! resolution the bundle is read-only and safe to share across parallel
//! pipelines.

use crate::error::{CliError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an override settings file
pub const SETTINGS_ENV_VAR: &str = "REPOCLIENT_SETTINGS";

/// Default server URL shipped as a bundled default
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// File name of the per-user settings file
const SETTINGS_FILE: &str = "settings.toml";

/// Directory under the user's home holding the settings file
const SETTINGS_DIR: &str = ".repoclient";

/// The keys a bundle can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsKey {
    ServerUrl,
    AccessKey,
    AccessSecret,
    UserId,
    UserGroup,
    Investigation,
    AccessPoint,
    TransferUsername,
    TransferPassword,
}

impl SettingsKey {
    pub const ALL: [SettingsKey; 9] = [
        SettingsKey::ServerUrl,
        SettingsKey::AccessKey,
        SettingsKey::AccessSecret,
        SettingsKey::UserId,
        SettingsKey::UserGroup,
        SettingsKey::Investigation,
        SettingsKey::AccessPoint,
        SettingsKey::TransferUsername,
        SettingsKey::TransferPassword,
    ];

    /// Key name as stored in the settings file
    pub fn key(self) -> &'static str {
        match self {
            SettingsKey::ServerUrl => "RestServer",
            SettingsKey::AccessKey => "accessKey",
            SettingsKey::AccessSecret => "accessSecret",
            SettingsKey::UserId => "userId",
            SettingsKey::UserGroup => "group",
            SettingsKey::Investigation => "investigation",
            SettingsKey::AccessPoint => "AccessPoint",
            SettingsKey::TransferUsername => "Username",
            SettingsKey::TransferPassword => "Password",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SettingsKey::ServerUrl => "URL of the repository REST server",
            SettingsKey::AccessKey => "Credentials (key) for accessing the repository",
            SettingsKey::AccessSecret => "Credentials (secret) for accessing the repository",
            SettingsKey::UserId => "User id of the uploading user",
            SettingsKey::UserGroup => "Group the ingest/access belongs to",
            SettingsKey::Investigation => "Investigation the ingest/access belongs to",
            SettingsKey::AccessPoint => "Access point for ingest to/download from the repository",
            SettingsKey::TransferUsername => "Username for the transfer backend",
            SettingsKey::TransferPassword => "Password for the transfer backend",
        }
    }

    /// Secrets get a masked prompt during interactive repair
    pub fn is_secret(self) -> bool {
        matches!(
            self,
            SettingsKey::AccessSecret | SettingsKey::TransferPassword
        )
    }

    /// Look a key up by its settings-file name
    pub fn from_key(name: &str) -> Option<SettingsKey> {
        SettingsKey::ALL.iter().copied().find(|k| k.key() == name)
    }
}

impl std::fmt::Display for SettingsKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Where a value came from; later sources overwrite earlier ones.
/// `Repaired` outranks every file source so a repair accepted during
/// validation always takes effect, even over an override-file value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourceRank {
    BundledDefault,
    UserFile,
    OverrideFile,
    Repaired,
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    rank: SourceRank,
    validated: bool,
}

/// Merged settings with per-key source rank and validated flag
#[derive(Debug, Clone)]
pub struct SettingsBundle {
    entries: HashMap<SettingsKey, Entry>,
    user_file: PathBuf,
}

impl SettingsBundle {
    /// Load settings from the default locations: bundled defaults, then
    /// `~/.repoclient/settings.toml`, then the file named by
    /// `REPOCLIENT_SETTINGS` (if set).
    pub fn load() -> Result<Self> {
        let user_file = default_user_file()?;
        let override_file = std::env::var(SETTINGS_ENV_VAR).ok().map(PathBuf::from);
        Self::load_from(user_file, override_file)
    }

    /// Load settings from explicit locations (used by `load` and tests)
    pub fn load_from(user_file: PathBuf, override_file: Option<PathBuf>) -> Result<Self> {
        let mut bundle = Self {
            entries: HashMap::new(),
            user_file,
        };

        bundle.set(
            SettingsKey::ServerUrl,
            DEFAULT_SERVER_URL,
            SourceRank::BundledDefault,
        );

        let user_file = bundle.user_file.clone();
        if user_file.is_file() {
            bundle.merge_file(&user_file, SourceRank::UserFile)?;
        }

        if let Some(path) = override_file {
            if path.is_file() {
                bundle.merge_file(&path, SourceRank::OverrideFile)?;
            } else {
                warn!(path = %path.display(), "Override settings file does not exist, ignoring");
            }
        }

        Ok(bundle)
    }

    fn merge_file(&mut self, path: &Path, rank: SourceRank) -> Result<()> {
        debug!(path = %path.display(), ?rank, "Loading settings file");
        let text = std::fs::read_to_string(path)?;
        let table: toml::Table = text.parse()?;
        for (name, value) in table {
            let Some(key) = SettingsKey::from_key(&name) else {
                warn!(key = %name, path = %path.display(), "Unknown settings key, ignoring");
                continue;
            };
            match value {
                toml::Value::String(s) => self.set(key, s, rank),
                other => self.set(key, other.to_string(), rank),
            }
        }
        Ok(())
    }

    /// Get a value if present
    pub fn get(&self, key: SettingsKey) -> Option<&str> {
        self.entries.get(&key).map(|e| e.value.as_str())
    }

    /// Get a value or fail with a configuration error
    pub fn require(&self, key: SettingsKey) -> Result<&str> {
        self.get(key).ok_or_else(|| {
            CliError::config(format!(
                "required setting '{}' ({}) is not configured",
                key.key(),
                key.description()
            ))
        })
    }

    /// Set a value. An existing value is only replaced by an equal or
    /// higher source rank; setting clears the validated flag.
    pub fn set(&mut self, key: SettingsKey, value: impl Into<String>, rank: SourceRank) {
        let value = value.into();
        match self.entries.get(&key) {
            Some(existing) if existing.rank > rank => {}
            _ => {
                self.entries.insert(
                    key,
                    Entry {
                        value,
                        rank,
                        validated: false,
                    },
                );
            }
        }
    }

    /// Source rank of a present value
    pub fn source(&self, key: SettingsKey) -> Option<SourceRank> {
        self.entries.get(&key).map(|e| e.rank)
    }

    /// Mark a key as validated against the Repository Service
    pub fn mark_validated(&mut self, key: SettingsKey) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.validated = true;
        }
    }

    pub fn is_validated(&self, key: SettingsKey) -> bool {
        self.entries.get(&key).is_some_and(|e| e.validated)
    }

    /// Path of the per-user settings file this bundle persists to
    pub fn user_file(&self) -> &Path {
        &self.user_file
    }

    /// Persist the current values to the per-user settings file.
    /// Callers must obtain explicit confirmation before calling this.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.user_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut table = toml::Table::new();
        for key in SettingsKey::ALL {
            if let Some(value) = self.get(key) {
                table.insert(
                    key.key().to_string(),
                    toml::Value::String(value.to_string()),
                );
            }
        }
        let body = toml::to_string_pretty(&table)
            .map_err(|e| CliError::config(format!("could not serialize settings: {}", e)))?;
        let text = format!(
            "# Settings for the repository client.\n# Generated by 'repoclient init'; edit by hand or rerun init.\n\n{}",
            body
        );
        std::fs::write(&self.user_file, text)?;
        debug!(path = %self.user_file.display(), "Settings saved");
        Ok(())
    }
}

fn default_user_file() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CliError::config("could not determine the home directory"))?;
    Ok(home.join(SETTINGS_DIR).join(SETTINGS_FILE))
}
