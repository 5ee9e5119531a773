//! Parallel ingest over a set of input directories.
//!
//! The coordinator resolves the authenticated user once, spawns one
//! pipeline task per directory and aggregates the per-item outcomes.
//! Directories are independent; one failing never affects its siblings.

pub mod metadata;

pub use metadata::{build_record, RegistrationPipeline};

use crate::api::RepositoryClient;
use crate::error::{CliError, Result};
use crate::outcome::{CommandResult, ItemOutcome};
use crate::plugin::{IngestPlugin, NoopPlugin};
use crate::settings::{SettingsBundle, SettingsKey};
use crate::transfer::{PollPolicy, TransferBackend, TransferController};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Fans ingest pipelines out over input directories
pub struct IngestionCoordinator {
    client: Arc<RepositoryClient>,
    backend: Arc<dyn TransferBackend>,
    plugin: Arc<dyn IngestPlugin>,
    poll: PollPolicy,
    cancel: Option<watch::Receiver<bool>>,
}

impl IngestionCoordinator {
    pub fn new(client: Arc<RepositoryClient>, backend: Arc<dyn TransferBackend>) -> Self {
        Self {
            client,
            backend,
            plugin: Arc::new(NoopPlugin),
            poll: PollPolicy::default(),
            cancel: None,
        }
    }

    pub fn with_plugin(mut self, plugin: Arc<dyn IngestPlugin>) -> Self {
        self.plugin = plugin;
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Ingest every directory and aggregate the outcomes. The settings
    /// bundle must already be validated; it is only read here.
    pub async fn ingest_all(
        &self,
        directories: &[PathBuf],
        note: &str,
        settings: &SettingsBundle,
    ) -> Result<CommandResult> {
        let group = settings.require(SettingsKey::UserGroup)?.to_string();
        let access_point = settings.require(SettingsKey::AccessPoint)?.to_string();
        let investigation_id: i64 = settings
            .require(SettingsKey::Investigation)?
            .parse()
            .map_err(|_| CliError::config("setting 'investigation' is not a numeric id"))?;

        // One identity for the whole run, stamped on every record.
        let user = self.client.get_current_user().await?;
        info!(
            user = %user.distinguished_name,
            directories = directories.len(),
            "Starting ingest"
        );

        let mut tasks = JoinSet::new();
        for dir in directories {
            let dir = dir.clone();
            let note = note.to_string();
            let group = group.clone();
            let access_point = access_point.clone();
            let uploader_id = user.user_id;
            let pipeline =
                RegistrationPipeline::new(Arc::clone(&self.client), Arc::clone(&self.plugin));
            let mut controller =
                TransferController::new(Arc::clone(&self.client), Arc::clone(&self.backend))
                    .with_poll_policy(self.poll);
            if let Some(cancel) = &self.cancel {
                controller = controller.with_cancellation(cancel.clone());
            }

            tasks.spawn(async move {
                let outcome = ingest_one(
                    &pipeline,
                    &controller,
                    &dir,
                    &note,
                    uploader_id,
                    investigation_id,
                    &group,
                    &access_point,
                )
                .await;
                match outcome {
                    Ok(identifier) => ItemOutcome::succeeded(dir, identifier),
                    Err(err) => {
                        error!(dir = %dir.display(), error = %err, "Ingest failed");
                        ItemOutcome::failed(dir, err)
                    }
                }
            });
        }

        let mut items = Vec::with_capacity(directories.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(item) => items.push(item),
                Err(err) => items.push(ItemOutcome::failed(
                    PathBuf::new(),
                    CliError::api(format!("Ingest task aborted: {}", err)),
                )),
            }
        }

        Ok(CommandResult::aggregate("ingest", items))
    }
}

/// One directory, start to finish: validate, register, transfer.
#[allow(clippy::too_many_arguments)]
async fn ingest_one(
    pipeline: &RegistrationPipeline,
    controller: &TransferController,
    dir: &std::path::Path,
    note: &str,
    uploader_id: i64,
    investigation_id: i64,
    group: &str,
    access_point: &str,
) -> Result<String> {
    if !dir.is_dir() {
        return Err(CliError::InvalidDirectory(dir.to_path_buf()));
    }

    let record = pipeline
        .register(dir, note, uploader_id, investigation_id, group)
        .await?;
    let identifier = record
        .identifier
        .ok_or_else(|| CliError::api("Registered digital object carries no identifier"))?;

    controller
        .run_ingest(&identifier, access_point, group, dir)
        .await?;
    Ok(identifier)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::settings::SourceRank;
    use crate::transfer::TransferBackend;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct CountingBackend {
        uploads: AtomicUsize,
    }

    #[async_trait]
    impl TransferBackend for CountingBackend {
        async fn upload(&self, _source_dir: &Path, _staging_url: &str) -> Result<usize> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        }

        async fn download(&self, _staging_url: &str, target_dir: &Path) -> Result<PathBuf> {
            Ok(target_dir.join("downloaded"))
        }
    }

    async fn mock_ingest_service() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/usergroup/users/-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1,
                "entities": [{"userId": 7, "distinguishedName": "uploader@example.org"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/rest/basemetadata/investigations/12/digitalobjects$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1,
                "entities": [{
                    "baseId": 1, "identifier": "obj-1", "label": "DigitalObject_x",
                    "note": "n", "startDate": "2026-01-01T00:00:00Z",
                    "endDate": "2026-01-01T00:00:01Z", "uploadDate": "2026-01-02T00:00:00Z",
                    "uploaderId": 7, "investigationId": 12
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/staging/ingests"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1,
                "entities": [{"id": 1, "objectId": "obj-1", "status": 1}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/staging/ingests/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1,
                "entities": [{"id": 1, "objectId": "obj-1", "status": 8,
                              "stagingUrl": "http://stage/1"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/rest/staging/ingests/1/status"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        server
    }

    fn test_settings(dir: &Path) -> SettingsBundle {
        let mut bundle =
            SettingsBundle::load_from(dir.join("settings.toml"), None).unwrap();
        for (key, value) in [
            (SettingsKey::UserGroup, "USERS"),
            (SettingsKey::Investigation, "12"),
            (SettingsKey::AccessPoint, "webdav"),
        ] {
            bundle.set(key, value, SourceRank::UserFile);
        }
        bundle
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let server = mock_ingest_service().await;
        let work = tempfile::tempdir().unwrap();
        let d1 = work.path().join("d1");
        let d3 = work.path().join("d3");
        std::fs::create_dir(&d1).unwrap();
        std::fs::create_dir(&d3).unwrap();
        std::fs::write(d1.join("a.dat"), b"a").unwrap();
        std::fs::write(d3.join("c.dat"), b"c").unwrap();
        // d2 never exists.
        let d2 = work.path().join("d2");

        let client = Arc::new(RepositoryClient::new(server.uri(), "key", "secret").unwrap());
        let backend = Arc::new(CountingBackend {
            uploads: AtomicUsize::new(0),
        });
        let coordinator = IngestionCoordinator::new(client, backend.clone())
            .with_poll_policy(PollPolicy {
                interval: Duration::from_millis(5),
                max_attempts: 5,
            });

        let settings = test_settings(work.path());
        let result = coordinator
            .ingest_all(&[d1, d2.clone(), d3], "note", &settings)
            .await
            .unwrap();

        assert!(!result.is_success());
        assert_eq!(result.message(), Some("1 of 3 ingest(s) failed!"));
        assert_eq!(backend.uploads.load(Ordering::SeqCst), 2);
        let failed: Vec<_> = result.items().iter().filter(|i| i.is_failure()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].directory, d2);
        assert!(matches!(
            failed[0].error,
            Some(CliError::InvalidDirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_all_directories_succeed() {
        let server = mock_ingest_service().await;
        let work = tempfile::tempdir().unwrap();
        let d1 = work.path().join("d1");
        std::fs::create_dir(&d1).unwrap();
        std::fs::write(d1.join("a.dat"), b"a").unwrap();

        let client = Arc::new(RepositoryClient::new(server.uri(), "key", "secret").unwrap());
        let backend = Arc::new(CountingBackend {
            uploads: AtomicUsize::new(0),
        });
        let coordinator = IngestionCoordinator::new(client, backend).with_poll_policy(PollPolicy {
            interval: Duration::from_millis(5),
            max_attempts: 5,
        });

        let settings = test_settings(work.path());
        let result = coordinator
            .ingest_all(&[d1], "note", &settings)
            .await
            .unwrap();
        assert!(result.is_success());
        assert_eq!(result.exit_code(), 0);
        assert_eq!(result.items()[0].identifier.as_deref(), Some("obj-1"));
    }
}
