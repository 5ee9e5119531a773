//! Wire types for the Repository Service
//!
//! Matches the remote API structure: list endpoints return a
//! count-plus-entities wrapper, detail endpoints return the same wrapper
//! with a single entity.

use serde::{Deserialize, Serialize};

/// Standard count-plus-entities wrapper returned by every list/detail call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityWrapper<T> {
    pub count: i64,
    #[serde(default = "Vec::new")]
    pub entities: Vec<T>,
}

impl<T> EntityWrapper<T> {
    /// Take the first entity, or `None` for an empty wrapper
    pub fn into_first(self) -> Option<T> {
        self.entities.into_iter().next()
    }
}

/// A repository user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub user_id: i64,
    pub distinguished_name: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A user group
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroup {
    pub id: i64,
    pub group_id: String,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A study, the top level of the organizational metadata hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Study {
    pub study_id: i64,
    #[serde(default)]
    pub topic: Option<String>,
}

/// An investigation a digital object belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investigation {
    pub investigation_id: i64,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub study: Option<Study>,
}

/// A named remote endpoint configuration used to move bytes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPoint {
    pub id: i64,
    pub unique_identifier: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
}

/// Descriptive record of one archived dataset.
///
/// `identifier` is absent until the Repository Service registers the
/// record; the record is never mutated once the identifier is assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalObjectRecord {
    #[serde(default)]
    pub base_id: Option<i64>,
    /// Permanent identifier, assigned by the Repository Service
    #[serde(default)]
    pub identifier: Option<String>,
    pub label: String,
    pub note: String,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
    pub upload_date: chrono::DateTime<chrono::Utc>,
    pub uploader_id: i64,
    pub investigation_id: i64,
}

/// Which way a transfer moves bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Ingest,
    Download,
}

impl std::fmt::Display for TransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferKind::Ingest => write!(f, "ingest"),
            TransferKind::Download => write!(f, "download"),
        }
    }
}

/// Remote-side status of a transfer request.
///
/// Codes are power-of-two so the remote side can OR progress flags onto
/// them without ambiguity. The happy path is
/// `Scheduled < Preparing < Ready`; everything else is a terminal
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Unknown,
    Scheduled,
    Preparing,
    PreparationFailed,
    Ready,
    Removed,
}

impl TransferStatus {
    /// Map the service's integer code to a status; unrecognized codes
    /// collapse to `Unknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => TransferStatus::Scheduled,
            2 => TransferStatus::Preparing,
            4 => TransferStatus::PreparationFailed,
            8 => TransferStatus::Ready,
            16 => TransferStatus::Removed,
            _ => TransferStatus::Unknown,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            TransferStatus::Unknown => 0,
            TransferStatus::Scheduled => 1,
            TransferStatus::Preparing => 2,
            TransferStatus::PreparationFailed => 4,
            TransferStatus::Ready => 8,
            TransferStatus::Removed => 16,
        }
    }

    /// Position in the happy-path ordering, `None` for failure states.
    pub fn happy_path_rank(self) -> Option<u8> {
        match self {
            TransferStatus::Scheduled => Some(0),
            TransferStatus::Preparing => Some(1),
            TransferStatus::Ready => Some(2),
            _ => None,
        }
    }

    /// True for states with no outgoing transition
    pub fn is_terminal(self) -> bool {
        !matches!(self, TransferStatus::Scheduled | TransferStatus::Preparing)
    }

    /// True for terminal states other than `Ready`
    pub fn is_failure(self) -> bool {
        self.is_terminal() && self != TransferStatus::Ready
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TransferStatus::Unknown => "UNKNOWN",
            TransferStatus::Scheduled => "SCHEDULED",
            TransferStatus::Preparing => "PREPARING",
            TransferStatus::PreparationFailed => "PREPARATION_FAILED",
            TransferStatus::Ready => "READY",
            TransferStatus::Removed => "REMOVED",
        };
        write!(f, "{}", label)
    }
}

/// Ingest progress codes pushed back to the Repository Service once the
/// byte transfer starts, so the remote bookkeeping stays consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestProgress {
    PreIngestRunning,
    PreIngestFinished,
    PreIngestFailed,
}

impl IngestProgress {
    pub fn code(self) -> i32 {
        match self {
            IngestProgress::PreIngestRunning => 32,
            IngestProgress::PreIngestFinished => 64,
            IngestProgress::PreIngestFailed => 128,
        }
    }
}

/// A staging/transfer request tracked by the Repository Service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub id: i64,
    pub object_id: String,
    /// Raw integer status code from the service
    pub status: i32,
    /// Staging location, populated once the status reaches READY
    #[serde(default)]
    pub staging_url: Option<String>,
    #[serde(default)]
    pub access_point: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
}

impl TransferRequest {
    pub fn status(&self) -> TransferStatus {
        TransferStatus::from_code(self.status)
    }
}

/// Body for creating a transfer request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferRequest {
    pub object_id: String,
    pub access_point: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// Body for pushing a status update onto an existing transfer request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTransferStatus {
    pub status: i32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_wrapper_deserialization() {
        let json = r#"{"count": 2, "entities": [{"id": 1, "groupId": "USERS"}, {"id": 2, "groupId": "NANOSCOPY"}]}"#;
        let wrapper: EntityWrapper<UserGroup> = serde_json::from_str(json).unwrap();
        assert_eq!(wrapper.count, 2);
        assert_eq!(wrapper.entities[1].group_id, "NANOSCOPY");
    }

    #[test]
    fn test_entity_wrapper_count_only() {
        // Count endpoints omit the entity list entirely.
        let json = r#"{"count": 7}"#;
        let wrapper: EntityWrapper<UserGroup> = serde_json::from_str(json).unwrap();
        assert_eq!(wrapper.count, 7);
        assert!(wrapper.entities.is_empty());
        assert!(wrapper.into_first().is_none());
    }

    #[test]
    fn test_status_codes_round_trip() {
        for status in [
            TransferStatus::Unknown,
            TransferStatus::Scheduled,
            TransferStatus::Preparing,
            TransferStatus::PreparationFailed,
            TransferStatus::Ready,
            TransferStatus::Removed,
        ] {
            assert_eq!(TransferStatus::from_code(status.code()), status);
        }
        assert_eq!(TransferStatus::from_code(99), TransferStatus::Unknown);
    }

    #[test]
    fn test_happy_path_ordering() {
        let scheduled = TransferStatus::Scheduled.happy_path_rank().unwrap();
        let preparing = TransferStatus::Preparing.happy_path_rank().unwrap();
        let ready = TransferStatus::Ready.happy_path_rank().unwrap();
        assert!(scheduled < preparing && preparing < ready);
        assert!(TransferStatus::PreparationFailed.happy_path_rank().is_none());
    }

    #[test]
    fn test_terminal_classification() {
        assert!(!TransferStatus::Scheduled.is_terminal());
        assert!(!TransferStatus::Preparing.is_terminal());
        assert!(TransferStatus::Ready.is_terminal());
        assert!(!TransferStatus::Ready.is_failure());
        assert!(TransferStatus::Removed.is_failure());
        assert!(TransferStatus::Unknown.is_failure());
    }

    #[test]
    fn test_transfer_request_status_mapping() {
        let json = r#"{"id": 5, "objectId": "abc-123", "status": 8, "stagingUrl": "http://stage/5"}"#;
        let request: TransferRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.status(), TransferStatus::Ready);
        assert_eq!(request.staging_url.as_deref(), Some("http://stage/5"));
    }
}
