//! Request bodies for Pyrus write endpoints.
//!
//! Unset options are skipped on the wire so the remote applies its own
//! defaults.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

/// Reference to a person by numeric id or by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PersonRef {
    Id { id: i64 },
    Email { email: String },
}

impl PersonRef {
    /// All-digit strings are person ids, anything else is an email.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(id) if trimmed.chars().all(|c| c.is_ascii_digit()) => Self::Id { id },
            _ => Self::Email {
                email: trimmed.to_string(),
            },
        }
    }

    pub fn parse_all(raw: &[String]) -> Vec<Self> {
        raw.iter().map(|r| Self::parse(r)).collect()
    }
}

/// Attachment reference for task creation and comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl NewFile {
    /// Whether the entry points at any file at all.
    pub fn has_source(&self) -> bool {
        self.guid.is_some() || self.attachment_id.is_some() || self.url.is_some()
    }
}

/// Form field value addressed by id or name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: Value,
}

/// Wire format for date-only values (`due_date`, `scheduled_date`).
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Wire format for `due` (UTC timestamp).
pub fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// `POST tasks` body, used for both simple and form tasks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible: Option<PersonRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<PersonRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<NewFile>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldUpdate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_defaults: Option<bool>,
}

/// `POST tasks/{id}/comments` body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskCommentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reassign_to: Option<PersonRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_list_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_list_ids: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_schedule: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_due: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spent_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribers_added: Option<Vec<PersonRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribers_removed: Option<Vec<PersonRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants_added: Option<Vec<PersonRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants_removed: Option<Vec<PersonRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_updates: Option<Vec<FieldUpdate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<NewFile>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_notification: Option<bool>,
}

/// `POST forms/{id}/register` body.
#[derive(Debug, Clone, Serialize)]
pub struct FormRegisterRequest {
    pub item_count: u32,
    /// Pyrus expects `"y"` to include archived tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_archived: Option<&'static str>,
}

impl FormRegisterRequest {
    pub fn new(item_count: u32, include_archived: bool) -> Self {
        Self {
            item_count,
            include_archived: include_archived.then_some("y"),
        }
    }
}

/// `POST announcements` body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateAnnouncementRequest {
    pub text: String,
}
