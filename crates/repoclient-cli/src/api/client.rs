//! HTTP client for the Repository Service
//!
//! Thin wrapper around `reqwest` for the usergroup, basemetadata and
//! staging endpoint families. Every list/detail response is the
//! count-plus-entities wrapper from [`crate::api::types`].

use crate::api::{endpoints, types::*};
use crate::error::{CliError, Result};
use crate::settings::{SettingsBundle, SettingsKey};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Default timeout for API requests in seconds.
/// Can be overridden via the REPOCLIENT_API_TIMEOUT_SECS environment
/// variable. Generous because staging preparation calls can be slow.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 300;

/// Client for the Repository Service metadata and staging APIs.
///
/// Stateless apart from connection parameters; cheap to share behind an
/// `Arc` across parallel pipelines.
pub struct RepositoryClient {
    client: Client,
    base_url: String,
    access_key: String,
    access_secret: String,
}

impl RepositoryClient {
    /// Create a new client for the given server
    pub fn new(
        base_url: impl Into<String>,
        access_key: impl Into<String>,
        access_secret: impl Into<String>,
    ) -> Result<Self> {
        let timeout_secs = std::env::var("REPOCLIENT_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_API_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            access_key: access_key.into(),
            access_secret: access_secret.into(),
        })
    }

    /// Create a client from a resolved settings bundle
    pub fn from_settings(settings: &SettingsBundle) -> Result<Self> {
        Self::new(
            settings.require(SettingsKey::ServerUrl)?,
            settings.require(SettingsKey::AccessKey)?,
            settings.require(SettingsKey::AccessSecret)?,
        )
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_wrapper<T: DeserializeOwned>(&self, url: &str) -> Result<EntityWrapper<T>> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url)
            .basic_auth(&self.access_key, Some(&self.access_secret))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Check that the service answers at all. Network failures report as
    /// "not reachable" rather than an error so callers can treat this as
    /// a probe.
    pub async fn check_service(&self) -> Result<bool> {
        let url = endpoints::group_count_url(&self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success() || response.status().as_u16() == 401),
            Err(_) => Ok(false),
        }
    }

    /// Resolve the authenticated user behind the current credentials
    pub async fn get_current_user(&self) -> Result<UserData> {
        let url = endpoints::current_user_url(&self.base_url);
        let wrapper: EntityWrapper<UserData> = self.get_wrapper(&url).await?;
        wrapper
            .into_first()
            .ok_or_else(|| CliError::api("Service did not return the authenticated user"))
    }

    /// Number of groups visible with the current credentials
    pub async fn group_count(&self) -> Result<i64> {
        let url = endpoints::group_count_url(&self.base_url);
        let wrapper: EntityWrapper<UserGroup> = self.get_wrapper(&url).await?;
        Ok(wrapper.count)
    }

    /// All groups visible with the current credentials
    pub async fn list_groups(&self) -> Result<Vec<UserGroup>> {
        let count = self.group_count().await?;
        let url = endpoints::groups_url(&self.base_url, 0, count.max(1));
        let wrapper: EntityWrapper<UserGroup> = self.get_wrapper(&url).await?;
        Ok(wrapper.entities)
    }

    /// Investigations a group may ingest into
    pub async fn list_investigations(&self, group: &str) -> Result<Vec<Investigation>> {
        let url = endpoints::investigations_url(&self.base_url, group);
        let wrapper: EntityWrapper<Investigation> = self.get_wrapper(&url).await?;
        Ok(wrapper.entities)
    }

    /// Access points available to a group
    pub async fn list_access_points(&self, group: &str) -> Result<Vec<AccessPoint>> {
        let url = endpoints::access_points_url(&self.base_url, group);
        let wrapper: EntityWrapper<AccessPoint> = self.get_wrapper(&url).await?;
        Ok(wrapper.entities)
    }

    /// Register a digital object under an investigation. The service
    /// assigns the permanent identifier and returns the stored record.
    pub async fn register_digital_object(
        &self,
        investigation_id: i64,
        record: &DigitalObjectRecord,
        group: &str,
    ) -> Result<DigitalObjectRecord> {
        let url = endpoints::register_object_url(&self.base_url, investigation_id, group);
        debug!(url = %url, label = %record.label, "Registering digital object");
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.access_key, Some(&self.access_secret))
            .json(record)
            .send()
            .await?
            .error_for_status()?;
        let wrapper: EntityWrapper<DigitalObjectRecord> = response.json().await?;
        wrapper
            .into_first()
            .ok_or_else(|| CliError::api("Registration returned no digital object"))
    }

    /// All digital objects of a group
    pub async fn list_digital_objects(&self, group: &str) -> Result<Vec<DigitalObjectRecord>> {
        let url = endpoints::digital_objects_url(&self.base_url, group);
        let wrapper: EntityWrapper<DigitalObjectRecord> = self.get_wrapper(&url).await?;
        Ok(wrapper.entities)
    }

    /// One digital object by its permanent identifier
    pub async fn get_digital_object(
        &self,
        identifier: &str,
        group: &str,
    ) -> Result<DigitalObjectRecord> {
        let url = endpoints::digital_object_url(&self.base_url, identifier, group);
        let wrapper: EntityWrapper<DigitalObjectRecord> = self.get_wrapper(&url).await?;
        wrapper
            .into_first()
            .ok_or_else(|| CliError::api(format!("No digital object with identifier '{}'", identifier)))
    }

    /// Create an ingest or download transfer request
    pub async fn create_transfer(
        &self,
        kind: TransferKind,
        object_id: &str,
        access_point: &str,
        group: &str,
    ) -> Result<TransferRequest> {
        let url = endpoints::transfers_url(&self.base_url, kind);
        let body = CreateTransferRequest {
            object_id: object_id.to_string(),
            access_point: access_point.to_string(),
            group_id: Some(group.to_string()),
        };
        debug!(url = %url, object_id = %object_id, kind = %kind, "Creating transfer request");
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.access_key, Some(&self.access_secret))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let wrapper: EntityWrapper<TransferRequest> = response.json().await?;
        wrapper
            .into_first()
            .ok_or_else(|| CliError::api(format!("Could not create {} request for '{}'", kind, object_id)))
    }

    /// All transfer requests of a group
    pub async fn list_transfers(
        &self,
        kind: TransferKind,
        group: &str,
    ) -> Result<Vec<TransferRequest>> {
        let url = endpoints::transfers_list_url(&self.base_url, kind, group);
        let wrapper: EntityWrapper<TransferRequest> = self.get_wrapper(&url).await?;
        Ok(wrapper.entities)
    }

    /// Fetch the current state of a transfer request
    pub async fn get_transfer(&self, kind: TransferKind, id: i64) -> Result<TransferRequest> {
        let url = endpoints::transfer_url(&self.base_url, kind, id);
        let wrapper: EntityWrapper<TransferRequest> = self.get_wrapper(&url).await?;
        wrapper
            .into_first()
            .ok_or_else(|| CliError::api(format!("No {} request with id {}", kind, id)))
    }

    /// Push an ingest progress code back to the service
    pub async fn update_ingest_status(&self, id: i64, progress: IngestProgress) -> Result<()> {
        let url = endpoints::transfer_status_url(&self.base_url, TransferKind::Ingest, id);
        debug!(url = %url, code = progress.code(), "Updating ingest status");
        self.client
            .put(&url)
            .basic_auth(&self.access_key, Some(&self.access_secret))
            .json(&UpdateTransferStatus {
                status: progress.code(),
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_creation() {
        let client = RepositoryClient::new("http://localhost:8080", "key", "secret").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_check_service_unreachable() {
        let client = RepositoryClient::new("http://localhost:9", "key", "secret").unwrap();
        assert!(!client.check_service().await.unwrap());
    }

    #[tokio::test]
    async fn test_get_current_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/usergroup/users/-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1,
                "entities": [{"userId": 42, "distinguishedName": "uploader@example.org"}]
            })))
            .mount(&server)
            .await;

        let client = RepositoryClient::new(server.uri(), "key", "secret").unwrap();
        let user = client.get_current_user().await.unwrap();
        assert_eq!(user.user_id, 42);
        assert_eq!(user.distinguished_name, "uploader@example.org");
    }

    #[tokio::test]
    async fn test_list_groups_pages_by_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/usergroup/groups/count"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"count": 2})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/usergroup/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 2,
                "entities": [
                    {"id": 1, "groupId": "USERS"},
                    {"id": 2, "groupId": "NANOSCOPY"}
                ]
            })))
            .mount(&server)
            .await;

        let client = RepositoryClient::new(server.uri(), "key", "secret").unwrap();
        let groups = client.list_groups().await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_id, "USERS");
    }

    #[tokio::test]
    async fn test_get_digital_object_by_identifier() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/basemetadata/digitalobjects/obj-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1,
                "entities": [{
                    "baseId": 1, "identifier": "obj-1", "label": "DigitalObject_x",
                    "note": "n", "startDate": "2026-01-01T00:00:00Z",
                    "endDate": "2026-01-01T00:00:01Z",
                    "uploadDate": "2026-01-02T00:00:00Z",
                    "uploaderId": 7, "investigationId": 12
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/basemetadata/digitalobjects/no-such"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"count": 0, "entities": []})),
            )
            .mount(&server)
            .await;

        let client = RepositoryClient::new(server.uri(), "key", "secret").unwrap();
        let record = client.get_digital_object("obj-1", "USERS").await.unwrap();
        assert_eq!(record.identifier.as_deref(), Some("obj-1"));

        let missing = client.get_digital_object("no-such", "USERS").await;
        assert!(matches!(missing, Err(CliError::Api(_))));
    }

    #[tokio::test]
    async fn test_create_transfer_empty_wrapper_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/staging/ingests"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"count": 0, "entities": []})),
            )
            .mount(&server)
            .await;

        let client = RepositoryClient::new(server.uri(), "key", "secret").unwrap();
        let result = client
            .create_transfer(TransferKind::Ingest, "obj-1", "webdav", "USERS")
            .await;
        assert!(matches!(result, Err(CliError::Api(_))));
    }
}
