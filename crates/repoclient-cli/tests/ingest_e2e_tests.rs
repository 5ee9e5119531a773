//! End-to-end tests for the repoclient binary
//!
//! Each test runs the real binary against a wiremock Repository Service
//! and a settings file injected through the REPOCLIENT_SETTINGS
//! override.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mount the full happy-path Repository Service surface
async fn mock_repository(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/usergroup/groups/count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 1})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/usergroup/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "entities": [{"id": 1, "groupId": "USERS", "groupName": "Default group"}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/usergroup/users/-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "entities": [{"userId": 7, "distinguishedName": "uploader@example.org"}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/basemetadata/investigations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "entities": [{"investigationId": 12, "topic": "Calibration"}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/staging/accesspoints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "entities": [{"id": 1, "uniqueIdentifier": "webdav", "description": "WebDAV"}]
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(
            r"^/rest/basemetadata/investigations/12/digitalobjects$",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "entities": [{
                "baseId": 1, "identifier": "obj-1", "label": "DigitalObject_x",
                "note": "n", "startDate": "2026-01-01T00:00:00Z",
                "endDate": "2026-01-01T00:00:01Z",
                "uploadDate": "2026-01-02T00:00:00Z",
                "uploaderId": 7, "investigationId": 12
            }]
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/staging/ingests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "entities": [{"id": 1, "objectId": "obj-1", "status": 1}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/staging/ingests/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "entities": [{"id": 1, "objectId": "obj-1", "status": 8,
                          "stagingUrl": format!("{}/stage/1", server.uri())}]
        })))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/rest/staging/ingests/1/status"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    // The transfer backend PUTs the data files below the staging URL.
    Mock::given(method("PUT"))
        .and(path_regex(r"^/stage/1/.*$"))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;
}

/// Write a complete settings file pointing at the mock server
fn write_settings(dir: &Path, server_url: &str) -> PathBuf {
    let file = dir.join("override-settings.toml");
    std::fs::write(
        &file,
        format!(
            concat!(
                "RestServer = \"{}\"\n",
                "accessKey = \"key\"\n",
                "accessSecret = \"secret\"\n",
                "userId = \"uploader@example.org\"\n",
                "group = \"USERS\"\n",
                "investigation = \"12\"\n",
                "AccessPoint = \"webdav\"\n",
                "Username = \"tuser\"\n",
                "Password = \"tpass\"\n",
            ),
            server_url
        ),
    )
    .unwrap();
    file
}

fn repoclient(home: &Path, settings: &Path) -> Command {
    let mut cmd = Command::cargo_bin("repoclient").unwrap();
    cmd.env("HOME", home)
        .env("REPOCLIENT_SETTINGS", settings)
        .env_remove("LOG_LEVEL")
        .env_remove("LOG_OUTPUT");
    cmd
}

#[tokio::test]
async fn test_ingest_single_directory_succeeds() {
    let server = MockServer::start().await;
    mock_repository(&server).await;

    let home = tempfile::tempdir().unwrap();
    let settings = write_settings(home.path(), &server.uri());
    let data = home.path().join("run-001");
    std::fs::create_dir(&data).unwrap();
    std::fs::write(data.join("measurement.dat"), b"bytes").unwrap();

    repoclient(home.path(), &settings)
        .arg("ingest")
        .arg(&data)
        .arg("--note")
        .arg("calibration run")
        .assert()
        .success()
        .stdout(predicate::str::contains("obj-1"));
}

#[tokio::test]
async fn test_ingest_partial_failure_sets_exit_code() {
    let server = MockServer::start().await;
    mock_repository(&server).await;

    let home = tempfile::tempdir().unwrap();
    let settings = write_settings(home.path(), &server.uri());
    let good = home.path().join("run-001");
    std::fs::create_dir(&good).unwrap();
    std::fs::write(good.join("measurement.dat"), b"bytes").unwrap();
    let missing = home.path().join("run-002");

    repoclient(home.path(), &settings)
        .arg("ingest")
        .arg(&good)
        .arg(&missing)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("1 of 2 ingest(s) failed!"));
}

#[tokio::test]
async fn test_download_with_object_id_writes_file() {
    let server = MockServer::start().await;
    mock_repository(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/basemetadata/digitalobjects/obj-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
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
    Mock::given(method("POST"))
        .and(path("/rest/staging/downloads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "entities": [{"id": 9, "objectId": "obj-1", "status": 1}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/staging/downloads/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "entities": [{"id": 9, "objectId": "obj-1", "status": 8,
                          "stagingUrl": format!("{}/stage/archive.dat", server.uri())}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stage/archive.dat"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload".to_vec()))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let settings = write_settings(home.path(), &server.uri());
    let target = home.path().join("out");

    repoclient(home.path(), &settings)
        .arg("download")
        .arg(&target)
        .arg("--object-id")
        .arg("obj-1")
        .assert()
        .success()
        .stdout(predicate::str::contains("archive.dat"));

    assert_eq!(std::fs::read(target.join("archive.dat")).unwrap(), b"payload");
}

#[tokio::test]
async fn test_init_test_only_reports_invalid_scope() {
    let server = MockServer::start().await;
    mock_repository(&server).await;

    let home = tempfile::tempdir().unwrap();
    // Only the server URL: the authentication scope cannot validate.
    let settings = home.path().join("override-settings.toml");
    std::fs::write(
        &settings,
        format!("RestServer = \"{}\"\n", server.uri()),
    )
    .unwrap();

    repoclient(home.path(), &settings)
        .arg("init")
        .arg("--test-only")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("authentication"));
}

#[tokio::test]
async fn test_list_shows_group_ingests() {
    let server = MockServer::start().await;
    mock_repository(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/staging/ingests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "entities": [
                {"id": 1, "objectId": "obj-1", "status": 8},
                {"id": 2, "objectId": "obj-2", "status": 4}
            ]
        })))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let settings = write_settings(home.path(), &server.uri());

    repoclient(home.path(), &settings)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("obj-1"))
        .stdout(predicate::str::contains("obj-2"));

    repoclient(home.path(), &settings)
        .arg("list")
        .arg("--failed-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("obj-2"))
        .stdout(predicate::str::contains("obj-1").not());
}
