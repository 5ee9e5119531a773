//! Ingest plugin hooks.
//!
//! A plugin may rewrite the metadata record before registration and run
//! a preparation step after registration but before the transfer request
//! is created. Exactly one plugin is honored per run; the registry keeps
//! the first registration and warns about the rest so behavior stays
//! deterministic.

use crate::api::DigitalObjectRecord;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Hooks into the ingest pipeline; both hooks default to no-ops
#[async_trait]
pub trait IngestPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Rewrite or reject the metadata record before registration. An
    /// error aborts the item before any remote call.
    async fn modify_metadata(
        &self,
        _source_dir: &Path,
        _record: &mut DigitalObjectRecord,
    ) -> Result<()> {
        Ok(())
    }

    /// Runs after registration and strictly before the transfer request
    /// is created. An error aborts the transfer; the registration is
    /// not rolled back.
    async fn pre_transfer(&self, _source_dir: &Path, _identifier: &str) -> Result<()> {
        Ok(())
    }
}

/// Identity plugin used when nothing is registered
pub struct NoopPlugin;

#[async_trait]
impl IngestPlugin for NoopPlugin {
    fn name(&self) -> &str {
        "noop"
    }
}

/// Holds the single honored plugin
pub struct PluginRegistry {
    active: Arc<dyn IngestPlugin>,
    registered: bool,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            active: Arc::new(NoopPlugin),
            registered: false,
        }
    }

    /// Register a plugin. The first registration wins; later candidates
    /// are ignored with a warning.
    pub fn register(&mut self, plugin: Arc<dyn IngestPlugin>) {
        if self.registered {
            warn!(
                kept = self.active.name(),
                ignored = plugin.name(),
                "A plugin is already registered, keeping the first"
            );
            return;
        }
        info!(plugin = plugin.name(), "Ingest plugin registered");
        self.active = plugin;
        self.registered = true;
    }

    pub fn active(&self) -> Arc<dyn IngestPlugin> {
        Arc::clone(&self.active)
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
