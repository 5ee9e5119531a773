//! Metadata registration for one source directory.
//!
//! Builds the default `DigitalObjectRecord` from the directory content,
//! lets the plugin adjust it, registers it with the Repository Service
//! and runs the plugin's pre-transfer hook. The record is immutable once
//! the service has assigned its identifier.

use crate::api::{DigitalObjectRecord, RepositoryClient};
use crate::error::{CliError, Result};
use crate::plugin::IngestPlugin;
use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Build the default record for a directory: the measurement interval
/// is spanned by the oldest and newest file modification time, with the
/// end forced at least one second past the start so the interval is
/// never empty. The label encodes the start timestamp.
pub fn build_record(
    source_dir: &Path,
    note: &str,
    uploader_id: i64,
    investigation_id: i64,
) -> Result<DigitalObjectRecord> {
    if !source_dir.is_dir() {
        return Err(CliError::InvalidDirectory(source_dir.to_path_buf()));
    }

    let mut oldest: Option<DateTime<Utc>> = None;
    let mut newest: Option<DateTime<Utc>> = None;
    for entry in WalkDir::new(source_dir) {
        let entry = entry
            .map_err(|e| CliError::metadata(format!("Could not scan '{}': {}", source_dir.display(), e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let meta = entry.metadata().map_err(|e| {
            CliError::metadata(format!("Could not stat '{}': {}", entry.path().display(), e))
        })?;
        let modified: DateTime<Utc> = meta
            .modified()
            .map_err(|e| {
                CliError::metadata(format!(
                    "No modification time for '{}': {}",
                    entry.path().display(),
                    e
                ))
            })?
            .into();
        oldest = Some(oldest.map_or(modified, |t| t.min(modified)));
        newest = Some(newest.map_or(modified, |t| t.max(modified)));
    }

    // An empty directory still gets a well-formed interval.
    let now = Utc::now();
    let start = oldest.unwrap_or(now);
    let mut end = newest.unwrap_or(now);
    if end < start + Duration::seconds(1) {
        end = start + Duration::seconds(1);
    }

    Ok(DigitalObjectRecord {
        base_id: None,
        identifier: None,
        label: format!("DigitalObject_{}", start.format("%Y_%m_%dT%H_%M")),
        note: note.to_string(),
        start_date: start,
        end_date: end,
        upload_date: now,
        uploader_id,
        investigation_id,
    })
}

/// Registers the metadata of one directory with the Repository Service
pub struct RegistrationPipeline {
    client: Arc<RepositoryClient>,
    plugin: Arc<dyn IngestPlugin>,
}

impl RegistrationPipeline {
    pub fn new(client: Arc<RepositoryClient>, plugin: Arc<dyn IngestPlugin>) -> Self {
        Self { client, plugin }
    }

    /// Build, adjust, register and prepare. The plugin may abort before
    /// any remote call (`modify_metadata`) or after registration but
    /// before the transfer request exists (`pre_transfer`).
    pub async fn register(
        &self,
        source_dir: &Path,
        note: &str,
        uploader_id: i64,
        investigation_id: i64,
        group: &str,
    ) -> Result<DigitalObjectRecord> {
        let mut record = build_record(source_dir, note, uploader_id, investigation_id)?;
        debug!(dir = %source_dir.display(), label = %record.label, "Built metadata record");

        self.plugin
            .modify_metadata(source_dir, &mut record)
            .await
            .map_err(|e| {
                CliError::metadata(format!(
                    "Plugin '{}' rejected the metadata for '{}': {}",
                    self.plugin.name(),
                    source_dir.display(),
                    e
                ))
            })?;

        let registered = self
            .client
            .register_digital_object(investigation_id, &record, group)
            .await?;
        let identifier = registered
            .identifier
            .clone()
            .ok_or_else(|| CliError::api("Registered digital object carries no identifier"))?;
        info!(dir = %source_dir.display(), identifier = %identifier, "Digital object registered");

        self.plugin.pre_transfer(source_dir, &identifier).await?;
        Ok(registered)
    }
}
