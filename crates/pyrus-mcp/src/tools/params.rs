//! Parameter structs for all MCP tools.
//!
//! Every struct derives `Deserialize + JsonSchema` for MCP tool registration.
//! All tools accept an optional `account` selecting the Pyrus account; the
//! default account is used when it is omitted.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

// ── Shared pieces ──

/// Parameters for tools that take nothing but the account selector.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct AccountParams {
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

/// File reference attached to a task or comment.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct AttachmentParam {
    #[schemars(description = "GUID returned by upload_file / upload_file_content")]
    pub guid: Option<String>,
    #[schemars(description = "Id of the file this attachment is a new version of")]
    pub root_id: Option<i64>,
    #[schemars(description = "Id of an existing Pyrus attachment to reuse")]
    pub attachment_id: Option<i64>,
    #[schemars(description = "External URL of the file")]
    pub url: Option<String>,
    #[schemars(description = "Display name of the file")]
    pub name: Option<String>,
}

/// Form field value, addressed by `id` or `name`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FieldValueParam {
    #[schemars(description = "Form field id (use get_form to discover ids)")]
    pub id: Option<i64>,
    #[schemars(description = "Form field name (alternative to id)")]
    pub name: Option<String>,
    #[schemars(description = "New field value; shape depends on the field type")]
    #[serde(default)]
    pub value: Value,
}

// ── Inbox & tasks ──

/// Parameters for the `get_inbox` tool.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct GetInboxParams {
    #[schemars(description = "Maximum number of tasks to return (default 50)")]
    pub limit: Option<u32>,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

/// Parameters for the `get_task` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetTaskParams {
    #[schemars(description = "Id of the task to retrieve")]
    pub task_id: i64,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

/// Parameters for the `create_task` tool.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CreateTaskParams {
    #[schemars(description = "Task description / content")]
    pub text: String,
    #[schemars(description = "Task subject / title")]
    pub subject: Option<String>,
    #[schemars(description = "Email or numeric person id of the responsible person")]
    pub responsible: Option<String>,
    #[schemars(description = "Due date in YYYY-MM-DD format")]
    pub due_date: Option<String>,
    #[schemars(description = "Participant emails or numeric person ids")]
    pub participants: Option<Vec<String>>,
    #[schemars(description = "Attachments; upload first to obtain a guid")]
    pub attachments: Option<Vec<AttachmentParam>>,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

/// Parameters for the `comment_task` tool.
///
/// The main tool for modifying a task: comments, status changes, scheduling,
/// due dates, list membership, people, approvals, field updates and files.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CommentTaskParams {
    #[schemars(description = "Id of the task")]
    pub task_id: i64,
    #[schemars(description = "Comment text")]
    pub text: Option<String>,
    #[schemars(description = "Action to perform: 'finished' or 'reopened'")]
    pub action: Option<String>,
    #[schemars(description = "Email or numeric person id to reassign the task to")]
    pub reassign_to: Option<String>,

    #[schemars(description = "List ids to add the task to (see get_lists)")]
    pub added_list_ids: Option<Vec<i64>>,
    #[schemars(description = "List ids to remove the task from")]
    pub removed_list_ids: Option<Vec<i64>>,

    #[schemars(description = "Schedule date in YYYY-MM-DD format (moves the task to the calendar)")]
    pub scheduled_date: Option<String>,
    #[schemars(description = "Set true to cancel the schedule and return the task to the inbox")]
    pub cancel_schedule: Option<bool>,

    #[schemars(description = "Due date in YYYY-MM-DD format (date only)")]
    pub due_date: Option<String>,
    #[schemars(description = "Due date and time in YYYY-MM-DDTHH:MM format (UTC)")]
    pub due: Option<String>,
    #[schemars(description = "Duration in minutes; only together with 'due'")]
    pub duration: Option<i64>,
    #[schemars(description = "Set true to remove the due date")]
    pub cancel_due: Option<bool>,

    #[schemars(description = "New task subject / title")]
    pub subject: Option<String>,
    #[schemars(description = "Time spent, in minutes")]
    pub spent_minutes: Option<i64>,

    #[schemars(description = "Emails or person ids to add as subscribers")]
    pub subscribers_added: Option<Vec<String>>,
    #[schemars(description = "Emails or person ids to remove from subscribers")]
    pub subscribers_removed: Option<Vec<String>>,
    #[schemars(description = "Emails or person ids to add as participants (simple tasks)")]
    pub participants_added: Option<Vec<String>>,
    #[schemars(description = "Emails or person ids to remove from participants")]
    pub participants_removed: Option<Vec<String>>,

    #[schemars(description = "Form task approval: 'approved', 'rejected' or 'acknowledged'")]
    pub approval_choice: Option<String>,
    #[schemars(description = "Form field updates, each with 'id' or 'name' and 'value'")]
    pub field_updates: Option<Vec<FieldValueParam>>,

    #[schemars(description = "Attachments; upload first to obtain a guid")]
    pub attachments: Option<Vec<AttachmentParam>>,

    #[schemars(description = "Set true to skip sending notifications")]
    pub skip_notification: Option<bool>,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

/// Parameters for `complete_task` and `reopen_task`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TaskActionParams {
    #[schemars(description = "Id of the task")]
    pub task_id: i64,
    #[schemars(description = "Optional comment text to add with the status change")]
    pub text: Option<String>,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

// ── Forms & registry ──

/// Parameters for the `get_form` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetFormParams {
    #[schemars(description = "Id of the form template")]
    pub form_id: i64,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

/// Parameters for the `get_registry` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetRegistryParams {
    #[schemars(description = "Id of the form template")]
    pub form_id: i64,
    #[schemars(description = "Maximum number of tasks to return (default 100)")]
    pub limit: Option<u32>,
    #[schemars(description = "Include archived tasks (default false)")]
    pub include_archived: Option<bool>,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

/// Parameters for the `create_form_task` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateFormTaskParams {
    #[schemars(description = "Id of the form template")]
    pub form_id: i64,
    #[schemars(description = "Field values, each with 'id' or 'name' and 'value'")]
    pub fields: Option<Vec<FieldValueParam>>,
    #[schemars(description = "Fill default values from the form template (default true)")]
    pub fill_defaults: Option<bool>,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

// ── Contacts & organization ──

/// Parameters for the `get_contacts` tool.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct GetContactsParams {
    #[schemars(description = "Include inactive users (default false)")]
    pub include_inactive: Option<bool>,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

// ── Announcements ──

/// Parameters for the `get_announcements` tool.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct GetAnnouncementsParams {
    #[schemars(description = "Maximum number of announcements to return (default 100)")]
    pub limit: Option<u32>,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

/// Parameters for the `create_announcement` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateAnnouncementParams {
    #[schemars(description = "Announcement text")]
    pub text: String,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

// ── Calendar, lists & catalogs ──

/// Parameters for the `get_calendar` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetCalendarParams {
    #[schemars(description = "Start date in YYYY-MM-DD format")]
    pub start_date: String,
    #[schemars(description = "End date in YYYY-MM-DD format (not before start_date)")]
    pub end_date: String,
    #[schemars(description = "Include meetings (default true)")]
    pub include_meetings: Option<bool>,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

/// Parameters for the `get_list_tasks` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetListTasksParams {
    #[schemars(description = "Id of the list (see get_lists)")]
    pub list_id: i64,
    #[schemars(description = "Maximum number of tasks to return (default 200)")]
    pub limit: Option<u32>,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

/// Parameters for the `get_catalog` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetCatalogParams {
    #[schemars(description = "Id of the catalog")]
    pub catalog_id: i64,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

// ── Files ──

/// Parameters for the `download_file` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DownloadFileParams {
    #[schemars(description = "Id of the file (from task or comment attachments)")]
    pub file_id: i64,
    #[schemars(description = "Directory to save into (default ~/Downloads, created if missing)")]
    pub save_dir: Option<String>,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

/// Parameters for the `upload_file` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UploadFileParams {
    #[schemars(description = "Path of the local file to upload (~ is expanded)")]
    pub file_path: String,
    #[schemars(description = "Id of an existing file to create a new version of")]
    pub root_id: Option<i64>,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

/// Parameters for the `upload_file_content` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UploadFileContentParams {
    #[schemars(description = "Base64-encoded file content")]
    pub content_base64: String,
    #[schemars(description = "Name for the uploaded file (e.g. 'report.pdf')")]
    pub filename: String,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}

/// Parameters for the `attach_file_to_task` tool.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct AttachFileParams {
    #[schemars(description = "Id of the task to attach the file to")]
    pub task_id: i64,
    #[schemars(description = "Path of a local file (use this OR content_base64)")]
    pub file_path: Option<String>,
    #[schemars(description = "Base64-encoded content (use this OR file_path)")]
    pub content_base64: Option<String>,
    #[schemars(description = "File name; required with content_base64")]
    pub filename: Option<String>,
    #[schemars(description = "Optional comment text")]
    pub text: Option<String>,
    #[schemars(description = "Id of an existing file to create a new version of")]
    pub root_id: Option<i64>,
    #[schemars(description = "Account key from list_accounts (omit to use the default account)")]
    pub account: Option<String>,
}
