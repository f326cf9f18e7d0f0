//! Inbox and task operations.

use pyrus_client::requests::{
    format_date, format_datetime, CreateTaskRequest, PersonRef, TaskCommentRequest,
};
use pyrus_client::{normalize, normalize_entity, ClientError, ClientResult, SessionManager, Shape};
use serde_json::Value;
use tracing::info;

use super::helpers::{field_updates, new_files, parse_date, parse_datetime, person_refs, require_text};
use super::params::{
    CommentTaskParams, CreateTaskParams, GetInboxParams, GetTaskParams, TaskActionParams,
};

pub const DEFAULT_INBOX_LIMIT: u32 = 50;

const ACTIONS: [&str; 2] = ["finished", "reopened"];
const APPROVAL_CHOICES: [&str; 3] = ["approved", "rejected", "acknowledged"];

pub async fn get_inbox(sessions: &SessionManager, params: GetInboxParams) -> ClientResult<Value> {
    let limit = params.limit.unwrap_or(DEFAULT_INBOX_LIMIT);
    let session = sessions.get(params.account.as_deref()).await?;
    let body = session
        .get("inbox", &[("item_count", limit.to_string())])
        .await?;
    Ok(normalize(&body, Shape::Inbox))
}

pub async fn get_task(sessions: &SessionManager, params: GetTaskParams) -> ClientResult<Value> {
    let session = sessions.get(params.account.as_deref()).await?;
    let body = session.get(&format!("tasks/{}", params.task_id), &[]).await?;
    normalize_entity(&body, Shape::Task)
}

/// Validate `create_task` arguments into a request body.
pub fn build_create_task(params: CreateTaskParams) -> ClientResult<CreateTaskRequest> {
    require_text("text", &params.text)?;
    let due_date = params
        .due_date
        .as_deref()
        .map(|d| parse_date("due_date", d).map(format_date))
        .transpose()?;

    Ok(CreateTaskRequest {
        text: Some(params.text),
        subject: params.subject,
        responsible: params.responsible.as_deref().map(PersonRef::parse),
        due_date,
        participants: person_refs(params.participants),
        attachments: new_files(params.attachments)?,
        ..Default::default()
    })
}

pub async fn create_task(sessions: &SessionManager, params: CreateTaskParams) -> ClientResult<Value> {
    let account = params.account.clone();
    let request = build_create_task(params)?;
    let session = sessions.get(account.as_deref()).await?;
    let body = session.post("tasks", &request).await?;
    let task = normalize_entity(&body, Shape::Task)?;
    info!(account = %session.account_key(), task_id = %task["id"], "Created task");
    Ok(task)
}

fn reject(message: impl Into<String>) -> ClientResult<TaskCommentRequest> {
    Err(ClientError::invalid_argument(message))
}

/// Validate `comment_task` arguments into a request body.
///
/// Every conflicting combination is rejected here, before any remote call.
pub fn build_comment(params: CommentTaskParams) -> ClientResult<TaskCommentRequest> {
    let cancel_schedule = params.cancel_schedule.unwrap_or(false);
    let cancel_due = params.cancel_due.unwrap_or(false);

    if params.scheduled_date.is_some() && cancel_schedule {
        return reject("scheduled_date cannot be combined with cancel_schedule");
    }
    if cancel_due && (params.due_date.is_some() || params.due.is_some()) {
        return reject("due_date/due cannot be combined with cancel_due");
    }
    if params.due_date.is_some() && params.due.is_some() {
        return reject("Provide either due_date or due, not both");
    }
    if params.duration.is_some() && params.due.is_none() {
        return reject("duration is only valid together with due");
    }
    if let Some(action) = params.action.as_deref() {
        if !ACTIONS.contains(&action) {
            return reject(format!(
                "action must be one of {}, got '{}'",
                ACTIONS.join(", "),
                action
            ));
        }
    }
    if let Some(choice) = params.approval_choice.as_deref() {
        if !APPROVAL_CHOICES.contains(&choice) {
            return reject(format!(
                "approval_choice must be one of {}, got '{}'",
                APPROVAL_CHOICES.join(", "),
                choice
            ));
        }
    }
    if let (Some(added), Some(removed)) = (&params.added_list_ids, &params.removed_list_ids) {
        if let Some(id) = added.iter().find(|id| removed.contains(*id)) {
            return reject(format!(
                "List {} appears in both added_list_ids and removed_list_ids",
                id
            ));
        }
    }

    let scheduled_date = params
        .scheduled_date
        .as_deref()
        .map(|d| parse_date("scheduled_date", d).map(format_date))
        .transpose()?;
    let due_date = params
        .due_date
        .as_deref()
        .map(|d| parse_date("due_date", d).map(format_date))
        .transpose()?;
    let due = params
        .due
        .as_deref()
        .map(|d| parse_datetime("due", d).map(format_datetime))
        .transpose()?;

    Ok(TaskCommentRequest {
        text: params.text,
        action: params.action,
        reassign_to: params.reassign_to.as_deref().map(PersonRef::parse),
        added_list_ids: params.added_list_ids,
        removed_list_ids: params.removed_list_ids,
        scheduled_date,
        cancel_schedule: params.cancel_schedule,
        due_date,
        due,
        duration: params.duration,
        cancel_due: params.cancel_due,
        subject: params.subject,
        spent_minutes: params.spent_minutes,
        subscribers_added: person_refs(params.subscribers_added),
        subscribers_removed: person_refs(params.subscribers_removed),
        participants_added: person_refs(params.participants_added),
        participants_removed: person_refs(params.participants_removed),
        approval_choice: params.approval_choice,
        field_updates: field_updates("field_updates", params.field_updates)?,
        attachments: new_files(params.attachments)?,
        skip_notification: params.skip_notification,
    })
}

/// Post an already-validated comment and return the updated task.
pub(crate) async fn post_comment(
    sessions: &SessionManager,
    account: Option<&str>,
    task_id: i64,
    request: &TaskCommentRequest,
) -> ClientResult<Value> {
    let session = sessions.get(account).await?;
    let body = session
        .post(&format!("tasks/{}/comments", task_id), request)
        .await?;
    normalize_entity(&body, Shape::Task)
}

pub async fn comment_task(
    sessions: &SessionManager,
    params: CommentTaskParams,
) -> ClientResult<Value> {
    let account = params.account.clone();
    let task_id = params.task_id;
    let request = build_comment(params)?;
    post_comment(sessions, account.as_deref(), task_id, &request).await
}

async fn change_status(
    sessions: &SessionManager,
    params: TaskActionParams,
    action: &str,
) -> ClientResult<Value> {
    let request = TaskCommentRequest {
        text: params.text,
        action: Some(action.to_string()),
        ..Default::default()
    };
    post_comment(sessions, params.account.as_deref(), params.task_id, &request).await
}

pub async fn complete_task(
    sessions: &SessionManager,
    params: TaskActionParams,
) -> ClientResult<Value> {
    change_status(sessions, params, "finished").await
}

pub async fn reopen_task(sessions: &SessionManager, params: TaskActionParams) -> ClientResult<Value> {
    change_status(sessions, params, "reopened").await
}
