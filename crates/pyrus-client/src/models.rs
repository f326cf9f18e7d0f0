//! Typed views of Pyrus API response bodies.
//!
//! Every field is optional and every struct defaults, so a body that omits
//! fields still reads cleanly. Sequences read element by element: an explicit
//! `null` is an empty sequence and an unreadable element is skipped without
//! losing its siblings. Nested objects that cannot be read become `None`.
//! Dates stay as the ISO strings Pyrus sends; free-form payloads (field
//! values, form steps, catalog cells) stay as JSON.
//!
//! Announcement models are the exception: they read strictly, and the
//! normalizer falls back to the raw payload when they fail.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => {
            debug!(found = %other, "Expected a sequence, reading as empty");
            return Ok(Vec::new());
        }
    };
    Ok(items
        .into_iter()
        .filter_map(|item| {
            T::deserialize(item)
                .map_err(|e| debug!(error = %e, "Skipping unreadable element"))
                .ok()
        })
        .collect())
}

fn lenient_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => Ok(T::deserialize(value)
            .map_err(|e| debug!(error = %e, "Skipping unreadable object"))
            .ok()),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Person {
    pub id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct File {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub size: Option<i64>,
    pub md5: Option<String>,
    pub url: Option<String>,
    pub version: Option<i64>,
    pub root_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FieldValue {
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    pub value: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskComment {
    pub id: Option<i64>,
    pub text: Option<String>,
    #[serde(deserialize_with = "lenient_option")]
    pub author: Option<Person>,
    pub create_date: Option<String>,
    pub action: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub attachments: Vec<File>,
}

/// Task as returned by `GET tasks/{id}`, registries and the calendar.
///
/// Inbox and list endpoints return the same object without comments or fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Task {
    pub id: Option<i64>,
    pub text: Option<String>,
    pub subject: Option<String>,
    #[serde(deserialize_with = "lenient_option")]
    pub author: Option<Person>,
    #[serde(deserialize_with = "lenient_option")]
    pub responsible: Option<Person>,
    pub create_date: Option<String>,
    pub close_date: Option<String>,
    pub due_date: Option<String>,
    pub due: Option<String>,
    pub scheduled_date: Option<String>,
    pub form_id: Option<i64>,
    #[serde(deserialize_with = "lenient_vec")]
    pub fields: Vec<FieldValue>,
    #[serde(deserialize_with = "lenient_vec")]
    pub attachments: Vec<File>,
    #[serde(deserialize_with = "lenient_vec")]
    pub comments: Vec<TaskComment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskGroup {
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FieldInfo {
    pub required_step: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FormFieldTemplate {
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    #[serde(deserialize_with = "lenient_option")]
    pub info: Option<FieldInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Form {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub steps: Option<Value>,
    #[serde(deserialize_with = "lenient_vec")]
    pub fields: Vec<FormFieldTemplate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Role {
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub member_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Organization {
    pub organization_id: Option<i64>,
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub persons: Vec<Person>,
    #[serde(deserialize_with = "lenient_vec")]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnnouncementComment {
    pub id: Option<i64>,
    pub text: Option<String>,
    pub author: Option<Person>,
    pub create_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Announcement {
    pub id: Option<i64>,
    pub text: Option<String>,
    pub author: Option<Person>,
    pub create_date: Option<String>,
    pub comments: Vec<AnnouncementComment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskList {
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub children: Vec<TaskList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogItem {
    pub item_id: Option<i64>,
    #[serde(deserialize_with = "lenient_vec")]
    pub values: Vec<Value>,
}

// ── Response envelopes ──

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileOrganization {
    pub organization_id: Option<i64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileResponse {
    pub person_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub organization_id: Option<i64>,
    #[serde(deserialize_with = "lenient_option")]
    pub organization: Option<ProfileOrganization>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InboxResponse {
    #[serde(deserialize_with = "lenient_vec")]
    pub tasks: Vec<Task>,
    #[serde(deserialize_with = "lenient_vec")]
    pub task_groups: Vec<TaskGroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskResponse {
    #[serde(deserialize_with = "lenient_option")]
    pub task: Option<Task>,
}

/// Shared by registry, calendar and list-task listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TasksResponse {
    #[serde(deserialize_with = "lenient_vec")]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FormsResponse {
    #[serde(deserialize_with = "lenient_vec")]
    pub forms: Vec<Form>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactsResponse {
    #[serde(deserialize_with = "lenient_vec")]
    pub organizations: Vec<Organization>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MembersResponse {
    #[serde(deserialize_with = "lenient_vec")]
    pub members: Vec<Person>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RolesResponse {
    #[serde(deserialize_with = "lenient_vec")]
    pub roles: Vec<Role>,
}

/// Announcement listing. The typed field is unreliable upstream, so it is
/// kept optional to distinguish "absent" from "present but empty".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnnouncementsResponse {
    pub announcements: Option<Vec<Announcement>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnnouncementResponse {
    pub announcement: Option<Announcement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListsResponse {
    #[serde(deserialize_with = "lenient_vec")]
    pub lists: Vec<TaskList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogResponse {
    pub catalog_id: Option<i64>,
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub catalog_headers: Vec<Value>,
    #[serde(deserialize_with = "lenient_vec")]
    pub items: Vec<CatalogItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UploadResponse {
    pub guid: Option<String>,
    pub md5_hash: Option<String>,
}

/// Authentication handshake reply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthResponse {
    pub access_token: Option<String>,
    pub api_url: Option<String>,
    pub files_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_sequences_read_as_empty() {
        let task: Task = serde_json::from_value(json!({
            "id": 7,
            "comments": null,
            "fields": null,
            "attachments": null
        }))
        .unwrap();
        assert_eq!(task.id, Some(7));
        assert!(task.comments.is_empty());
        assert!(task.fields.is_empty());
    }

    #[test]
    fn test_unreadable_element_keeps_siblings() {
        let roles: RolesResponse = serde_json::from_value(json!({
            "roles": [
                {"id": 1, "name": "Ops", "member_ids": [1, "two", 3]},
                {"id": "bad"},
                {"id": 2, "name": "Dev", "member_ids": null}
            ]
        }))
        .unwrap();
        assert_eq!(roles.roles.len(), 2);
        assert_eq!(roles.roles[0].member_ids, vec![1, 3]);
        assert!(roles.roles[1].member_ids.is_empty());
    }

    #[test]
    fn test_unreadable_nested_object_becomes_none() {
        let task: Task = serde_json::from_value(json!({
            "id": 7,
            "author": {"id": "not-a-number"},
            "responsible": {"id": 3, "first_name": "Ann"}
        }))
        .unwrap();
        assert!(task.author.is_none());
        assert_eq!(task.responsible.unwrap().first_name.as_deref(), Some("Ann"));
    }

    #[test]
    fn test_announcements_stay_strict() {
        let parsed = serde_json::from_value::<AnnouncementsResponse>(json!({
            "announcements": [{"id": 1, "comments": [{"id": "c1"}]}]
        }));
        assert!(parsed.is_err());
    }
}
