//! Repository Service endpoint URL builders
//!
//! All service URLs live under three fixed base path families:
//! `/rest/usergroup/`, `/rest/basemetadata/` and `/rest/staging/`.

use crate::api::types::TransferKind;

/// Normalize the base URL: a trailing slash would double up with the
/// fixed path segments.
fn trim_base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// Current authenticated user (the service treats id -1 as "me")
pub fn current_user_url(base_url: &str) -> String {
    format!("{}/rest/usergroup/users/-1", trim_base(base_url))
}

/// Group count, also used as the service liveness probe
pub fn group_count_url(base_url: &str) -> String {
    format!("{}/rest/usergroup/groups/count", trim_base(base_url))
}

/// All groups, paged
pub fn groups_url(base_url: &str, first: i64, results: i64) -> String {
    format!(
        "{}/rest/usergroup/groups?first={}&results={}",
        trim_base(base_url),
        first,
        results
    )
}

/// Investigations visible to a group
pub fn investigations_url(base_url: &str, group: &str) -> String {
    format!(
        "{}/rest/basemetadata/investigations?groupId={}",
        trim_base(base_url),
        group
    )
}

/// Register a digital object under an investigation
pub fn register_object_url(base_url: &str, investigation_id: i64, group: &str) -> String {
    format!(
        "{}/rest/basemetadata/investigations/{}/digitalobjects?groupId={}",
        trim_base(base_url),
        investigation_id,
        group
    )
}

/// All digital objects of a group
pub fn digital_objects_url(base_url: &str, group: &str) -> String {
    format!(
        "{}/rest/basemetadata/digitalobjects?groupId={}",
        trim_base(base_url),
        group
    )
}

/// One digital object by its permanent identifier
pub fn digital_object_url(base_url: &str, identifier: &str, group: &str) -> String {
    format!(
        "{}/rest/basemetadata/digitalobjects/{}?groupId={}",
        trim_base(base_url),
        identifier,
        group
    )
}

/// Access points usable by a group
pub fn access_points_url(base_url: &str, group: &str) -> String {
    format!(
        "{}/rest/staging/accesspoints?groupId={}",
        trim_base(base_url),
        group
    )
}

/// Transfer request collection (create / list)
pub fn transfers_url(base_url: &str, kind: TransferKind) -> String {
    format!("{}/rest/staging/{}s", trim_base(base_url), kind)
}

/// Transfer requests of a group
pub fn transfers_list_url(base_url: &str, kind: TransferKind, group: &str) -> String {
    format!(
        "{}/rest/staging/{}s?groupId={}",
        trim_base(base_url),
        kind,
        group
    )
}

/// One transfer request by id
pub fn transfer_url(base_url: &str, kind: TransferKind, id: i64) -> String {
    format!("{}/rest/staging/{}s/{}", trim_base(base_url), kind, id)
}

/// Status update for one transfer request
pub fn transfer_status_url(base_url: &str, kind: TransferKind, id: i64) -> String {
    format!("{}/rest/staging/{}s/{}/status", trim_base(base_url), kind, id)
}
