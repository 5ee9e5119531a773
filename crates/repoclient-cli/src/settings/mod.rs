//! Client settings: merged bundle, scope validation and repair.
//!
//! `SettingsBundle` holds the merged key/value state, `resolver`
//! validates it scope by scope against the Repository Service and
//! `repair` supplies replacement values when validation fails.

pub mod bundle;
pub mod repair;
pub mod resolver;

pub use bundle::{SettingsBundle, SettingsKey, SourceRank, SETTINGS_ENV_VAR};
pub use repair::{InteractiveRepair, NoRepair, RepairStrategy};
pub use resolver::{inspect_scope, Choice, ResolveMode, Resolver, ScopeStatus};

/// A validation scope: a group of settings keys checked together against
/// the Repository Service. Scopes depend on each other, so validation
/// always walks them in the canonical order below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Server URL, checked by probing the service
    ServerBase,
    /// Access key/secret and the resolved user id
    Authentication,
    /// Group and investigation membership
    Context,
    /// Access point availability for the chosen group
    AccessPoint,
    /// Username/password for the transfer backend (checked for presence
    /// only, the backend is not contacted)
    TransferCredentials,
}

impl Scope {
    /// Canonical validation order; each scope may rely on the previous
    /// ones already being valid.
    pub const ORDER: [Scope; 5] = [
        Scope::ServerBase,
        Scope::Authentication,
        Scope::Context,
        Scope::AccessPoint,
        Scope::TransferCredentials,
    ];

    /// The keys this scope validates
    pub fn keys(self) -> &'static [SettingsKey] {
        match self {
            Scope::ServerBase => &[SettingsKey::ServerUrl],
            Scope::Authentication => &[
                SettingsKey::AccessKey,
                SettingsKey::AccessSecret,
                SettingsKey::UserId,
            ],
            Scope::Context => &[SettingsKey::UserGroup, SettingsKey::Investigation],
            Scope::AccessPoint => &[SettingsKey::AccessPoint],
            Scope::TransferCredentials => &[
                SettingsKey::TransferUsername,
                SettingsKey::TransferPassword,
            ],
        }
    }

    /// Filter the canonical order down to the requested scopes, keeping
    /// dependency order regardless of how the request was phrased.
    pub fn ordered(requested: &[Scope]) -> Vec<Scope> {
        Scope::ORDER
            .iter()
            .copied()
            .filter(|s| requested.contains(s))
            .collect()
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Scope::ServerBase => "server base",
            Scope::Authentication => "authentication",
            Scope::Context => "context",
            Scope::AccessPoint => "access point",
            Scope::TransferCredentials => "transfer credentials",
        };
        write!(f, "{}", label)
    }
}
