//! Transfer backend seam.
//!
//! The controller hands a staging URL and a local path to a
//! `TransferBackend` and only cares about success or failure. The
//! default backend speaks plain HTTP against the staging location with
//! the configured transfer credentials.

use crate::error::{CliError, Result};
use crate::settings::{SettingsBundle, SettingsKey};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Moves bytes between a local path and a staging location
#[async_trait]
pub trait TransferBackend: Send + Sync {
    /// Upload every file under `source_dir` to the staging location.
    /// Returns the number of files transferred.
    async fn upload(&self, source_dir: &Path, staging_url: &str) -> Result<usize>;

    /// Download the staged content into `target_dir` and return the
    /// written path.
    async fn download(&self, staging_url: &str, target_dir: &Path) -> Result<PathBuf>;
}

/// Default backend: HTTP PUT/GET against the staging URL
pub struct HttpTransferBackend {
    client: reqwest::Client,
    username: String,
    password: String,
}

impl HttpTransferBackend {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            username: username.into(),
            password: password.into(),
        })
    }

    pub fn from_settings(settings: &SettingsBundle) -> Result<Self> {
        Self::new(
            settings.require(SettingsKey::TransferUsername)?,
            settings.require(SettingsKey::TransferPassword)?,
        )
    }

    fn target_url(&self, staging_url: &str, relative: &Path) -> Result<String> {
        let mut url = staging_url.trim_end_matches('/').to_string();
        for component in relative.components() {
            url.push('/');
            url.push_str(&component.as_os_str().to_string_lossy());
        }
        Ok(url)
    }
}

#[async_trait]
impl TransferBackend for HttpTransferBackend {
    async fn upload(&self, source_dir: &Path, staging_url: &str) -> Result<usize> {
        let mut transferred = 0usize;
        for entry in WalkDir::new(source_dir) {
            let entry = entry.map_err(|e| {
                CliError::api(format!(
                    "Could not read '{}': {}",
                    source_dir.display(),
                    e
                ))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(source_dir)
                .map_err(|e| CliError::api(format!("Path outside source directory: {}", e)))?;
            let url = self.target_url(staging_url, relative)?;
            let body = tokio::fs::read(entry.path()).await?;
            debug!(url = %url, bytes = body.len(), "Uploading file");
            self.client
                .put(&url)
                .basic_auth(&self.username, Some(&self.password))
                .body(body)
                .send()
                .await?
                .error_for_status()?;
            transferred += 1;
        }
        info!(
            source = %source_dir.display(),
            files = transferred,
            "Upload finished"
        );
        Ok(transferred)
    }

    async fn download(&self, staging_url: &str, target_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(target_dir).await?;
        let name = staging_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("download.dat");
        let target = target_dir.join(name);

        debug!(url = %staging_url, target = %target.display(), "Downloading");
        let response = self
            .client
            .get(staging_url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        tokio::fs::write(&target, &bytes).await?;
        info!(target = %target.display(), bytes = bytes.len(), "Download finished");
        Ok(target)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_upload_puts_every_file() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(201))
            .expect(2)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.dat"), b"aa").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/b.dat"), b"bb").unwrap();

        let backend = HttpTransferBackend::new("user", "pass").unwrap();
        let count = backend
            .upload(dir.path(), &format!("{}/stage/5", server.uri()))
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_download_writes_target_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stage/archive.tar"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let backend = HttpTransferBackend::new("user", "pass").unwrap();
        let written = backend
            .download(
                &format!("{}/stage/archive.tar", server.uri()),
                dir.path(),
            )
            .await
            .unwrap();
        assert_eq!(written.file_name().unwrap(), "archive.tar");
        assert_eq!(std::fs::read(written).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_upload_failure_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(507))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.dat"), b"aa").unwrap();

        let backend = HttpTransferBackend::new("user", "pass").unwrap();
        let result = backend
            .upload(dir.path(), &format!("{}/stage/5", server.uri()))
            .await;
        assert!(matches!(result, Err(CliError::Http(_))));
    }
}
