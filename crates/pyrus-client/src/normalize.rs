//! Response normalization and remote error classification.
//!
//! Pyrus bodies are read through the typed models in [`crate::models`] and
//! rendered into canonical JSON shapes that are stable regardless of which
//! optional fields the remote sent. Scalars the remote omitted become `null`,
//! sequences become `[]`.
//!
//! Announcement listings are read on two explicit paths: the typed field when
//! it is present and non-empty, otherwise the raw payload. Upstream listings
//! regularly carry entries the typed model cannot represent.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::models::{
    Announcement, AnnouncementComment, AnnouncementResponse, AnnouncementsResponse,
    CatalogResponse, ContactsResponse, FieldValue, File, Form, FormsResponse, InboxResponse,
    ListsResponse, MembersResponse, Organization, Person, ProfileResponse, Role, RolesResponse,
    Task, TaskComment, TaskList, TaskResponse, TasksResponse,
};

/// Canonical shapes the normalizer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Profile,
    Inbox,
    /// Single task with comments, fields and attachments.
    Task,
    /// Task headers of a list (`GET lists/{id}/tasks`).
    TaskList,
    Form,
    FormList,
    RegistryEntry,
    Contact,
    Member,
    Role,
    /// Single created announcement.
    Announcement,
    AnnouncementList,
    CalendarEntry,
    List,
    Catalog,
}

/// Render a remote response body as the canonical shape.
///
/// Total over well-formed input: never fails, substitutes `null` / `[]` for
/// anything the remote omitted.
pub fn normalize(body: &Value, shape: Shape) -> Value {
    match shape {
        Shape::Profile => profile(&read(body, shape)),
        Shape::Inbox => inbox(&read(body, shape)),
        Shape::Task => {
            let response: TaskResponse = read(body, shape);
            response.task.as_ref().map(task).unwrap_or(Value::Null)
        }
        Shape::TaskList => {
            let response: TasksResponse = read(body, shape);
            response.tasks.iter().map(task_header).collect()
        }
        Shape::RegistryEntry | Shape::CalendarEntry => {
            let response: TasksResponse = read(body, shape);
            response.tasks.iter().map(task).collect()
        }
        Shape::Form => form(&read(body, shape)),
        Shape::FormList => {
            let response: FormsResponse = read(body, shape);
            response
                .forms
                .iter()
                .map(|f| json!({"id": f.id, "name": f.name}))
                .collect()
        }
        Shape::Contact => {
            let response: ContactsResponse = read(body, shape);
            response.organizations.iter().map(organization).collect()
        }
        Shape::Member => {
            let response: MembersResponse = read(body, shape);
            response.members.iter().map(|p| person(Some(p))).collect()
        }
        Shape::Role => {
            let response: RolesResponse = read(body, shape);
            response.roles.iter().map(role).collect()
        }
        Shape::Announcement => match read_typed::<AnnouncementResponse>(body) {
            Ok(AnnouncementResponse {
                announcement: Some(a),
            }) => announcement(&a),
            _ => body
                .get("announcement")
                .filter(|a| a.is_object())
                .map(raw_announcement)
                .unwrap_or(Value::Null),
        },
        Shape::AnnouncementList => {
            let typed = read_typed::<AnnouncementsResponse>(body)
                .map_err(|e| debug!(error = %e, "Typed announcement listing unreadable"))
                .ok()
                .and_then(|r| r.announcements);
            announcement_list(typed, body)
        }
        Shape::List => {
            let response: ListsResponse = read(body, shape);
            response.lists.iter().map(task_list).collect()
        }
        Shape::Catalog => catalog(&read(body, shape)),
    }
}

/// Like [`normalize`] for single-entity shapes, but a body that carries no
/// entity is a remote failure instead of a bare `null`.
pub fn normalize_entity(body: &Value, shape: Shape) -> ClientResult<Value> {
    let entity = normalize(body, shape);
    if entity.is_null() {
        return Err(ClientError::remote(
            "invalid_response",
            format!("Response did not contain a readable {:?}", shape).to_lowercase(),
        ));
    }
    Ok(entity)
}

fn read_typed<T: DeserializeOwned>(body: &Value) -> Result<T, serde_json::Error> {
    T::deserialize(body)
}

fn read<T: DeserializeOwned + Default>(body: &Value, shape: Shape) -> T {
    read_typed(body).unwrap_or_else(|e| {
        warn!(?shape, error = %e, "Response did not match the typed model, treating as empty");
        T::default()
    })
}

// ── Error classification ──

/// Whether a failure indicator value signals an error.
///
/// `null`, `false`, `0`, `""`, `"0"` and empty arrays or objects are falsy.
/// Anything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// The truthy `error_code` of a response body, if any.
pub fn error_indicator(body: &Value) -> Option<&Value> {
    body.get("error_code").filter(|v| is_truthy(v))
}

/// Fail with [`ClientError::RemoteService`] when the body reports an error.
///
/// A present-but-falsy `error_code` is success.
pub fn check_remote_error(body: &Value) -> ClientResult<()> {
    match error_indicator(body) {
        None => Ok(()),
        Some(code) => {
            let code = match code {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| code.clone());
            Err(ClientError::remote(code, message))
        }
    }
}

// ── Shape renderers ──

fn full_name(first: Option<&str>, last: Option<&str>) -> String {
    format!("{} {}", first.unwrap_or(""), last.unwrap_or(""))
        .trim()
        .to_string()
}

fn person(p: Option<&Person>) -> Value {
    match p {
        None => Value::Null,
        Some(p) => json!({
            "id": p.id,
            "name": full_name(p.first_name.as_deref(), p.last_name.as_deref()),
            "email": p.email,
        }),
    }
}

fn file(f: &File) -> Value {
    json!({
        "id": f.id,
        "name": f.name,
        "size": f.size,
        "md5": f.md5,
        "url": f.url,
        "version": f.version,
        "root_id": f.root_id,
    })
}

fn field_value(f: &FieldValue) -> Value {
    json!({
        "id": f.id,
        "name": f.name,
        "type": f.field_type,
        "value": f.value,
    })
}

fn comment(c: &TaskComment) -> Value {
    json!({
        "id": c.id,
        "text": c.text,
        "author": person(c.author.as_ref()),
        "create_date": c.create_date,
        "action": c.action,
        "attachments": c.attachments.iter().map(file).collect::<Vec<_>>(),
    })
}

fn task_header(t: &Task) -> Value {
    json!({
        "id": t.id,
        "text": t.text,
        "author": person(t.author.as_ref()),
        "responsible": person(t.responsible.as_ref()),
        "create_date": t.create_date,
        "due_date": t.due_date,
    })
}

fn task(t: &Task) -> Value {
    let mut result = task_header(t);
    let status = if t.close_date.is_some() { "closed" } else { "open" };
    if let Value::Object(map) = &mut result {
        map.extend([
            ("subject".to_string(), json!(t.subject)),
            ("status".to_string(), json!(status)),
            ("close_date".to_string(), json!(t.close_date)),
            ("due".to_string(), json!(t.due)),
            ("form_id".to_string(), json!(t.form_id)),
            ("scheduled_date".to_string(), json!(t.scheduled_date)),
            (
                "comments".to_string(),
                t.comments.iter().map(comment).collect(),
            ),
            (
                "fields".to_string(),
                t.fields.iter().map(field_value).collect(),
            ),
            (
                "attachments".to_string(),
                t.attachments.iter().map(file).collect(),
            ),
        ]);
    }
    result
}

fn profile(p: &ProfileResponse) -> Value {
    let organization = p
        .organization
        .as_ref()
        .map(|o| json!({"id": o.organization_id, "name": o.name}))
        .unwrap_or(Value::Null);
    json!({
        "person_id": p.person_id,
        "first_name": p.first_name,
        "last_name": p.last_name,
        "email": p.email,
        "organization_id": p.organization_id,
        "organization": organization,
    })
}

fn inbox(r: &InboxResponse) -> Value {
    let groups: Vec<Value> = r
        .task_groups
        .iter()
        .map(|g| {
            json!({
                "id": g.id,
                "name": g.name,
                "tasks": g.tasks.iter().map(task_header).collect::<Vec<_>>(),
            })
        })
        .collect();
    json!({
        "tasks": r.tasks.iter().map(task_header).collect::<Vec<_>>(),
        "groups": groups,
    })
}

fn form(f: &Form) -> Value {
    let fields: Vec<Value> = f
        .fields
        .iter()
        .map(|field| {
            json!({
                "id": field.id,
                "name": field.name,
                "type": field.field_type,
                "required_step": field.info.as_ref().and_then(|i| i.required_step),
            })
        })
        .collect();
    json!({
        "id": f.id,
        "name": f.name,
        "steps": f.steps.clone().unwrap_or(Value::Null),
        "fields": fields,
    })
}

fn role(r: &Role) -> Value {
    json!({"id": r.id, "name": r.name, "member_ids": r.member_ids})
}

fn organization(o: &Organization) -> Value {
    json!({
        "id": o.organization_id,
        "name": o.name,
        "persons": o.persons.iter().map(|p| person(Some(p))).collect::<Vec<_>>(),
        "roles": o.roles.iter().map(role).collect::<Vec<_>>(),
    })
}

fn announcement_comment(c: &AnnouncementComment) -> Value {
    json!({
        "id": c.id,
        "text": c.text,
        "author": person(c.author.as_ref()),
        "create_date": c.create_date,
    })
}

fn announcement(a: &Announcement) -> Value {
    let comments: Vec<Value> = a.comments.iter().map(announcement_comment).collect();
    json!({
        "id": a.id,
        "text": a.text,
        "author": person(a.author.as_ref()),
        "create_date": a.create_date,
        "comments_count": comments.len(),
        "comments": comments,
    })
}

/// Render an announcement listing from whichever path carries data.
///
/// `typed` is the typed `announcements` field; it is used only when present
/// and non-empty. Otherwise `raw` (the untranslated response body) is read.
pub fn announcement_list(typed: Option<Vec<Announcement>>, raw: &Value) -> Value {
    match typed {
        Some(list) if !list.is_empty() => list.iter().map(announcement).collect(),
        _ => {
            let entries = raw
                .get("announcements")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            if !entries.is_empty() {
                debug!(count = entries.len(), "Reading announcements from raw payload");
            }
            entries
                .iter()
                .filter(|e| e.is_object())
                .map(raw_announcement)
                .collect()
        }
    }
}

fn raw_field(entry: &Value, key: &str) -> Value {
    entry.get(key).cloned().unwrap_or(Value::Null)
}

fn raw_person(entry: Option<&Value>) -> Value {
    match entry {
        Some(p) if p.is_object() => json!({
            "id": raw_field(p, "id"),
            "name": full_name(
                p.get("first_name").and_then(Value::as_str),
                p.get("last_name").and_then(Value::as_str),
            ),
            "email": raw_field(p, "email"),
        }),
        _ => Value::Null,
    }
}

fn raw_announcement(entry: &Value) -> Value {
    let comments: Vec<Value> = entry
        .get("comments")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .map(|c| {
                    json!({
                        "id": raw_field(c, "id"),
                        "text": raw_field(c, "text"),
                        "author": raw_person(c.get("author")),
                        "create_date": raw_field(c, "create_date"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    json!({
        "id": raw_field(entry, "id"),
        "text": raw_field(entry, "text"),
        "author": raw_person(entry.get("author")),
        "create_date": raw_field(entry, "create_date"),
        "comments_count": comments.len(),
        "comments": comments,
    })
}

fn task_list(l: &TaskList) -> Value {
    json!({
        "id": l.id,
        "name": l.name,
        "children": l.children.iter().map(task_list).collect::<Vec<_>>(),
    })
}

fn catalog(c: &CatalogResponse) -> Value {
    let items: Vec<Value> = c
        .items
        .iter()
        .map(|i| json!({"item_id": i.item_id, "values": i.values}))
        .collect();
    let mut map = Map::new();
    map.insert("catalog_id".into(), json!(c.catalog_id));
    map.insert("name".into(), json!(c.name));
    map.insert("headers".into(), Value::Array(c.catalog_headers.clone()));
    map.insert("items".into(), Value::Array(items));
    Value::Object(map)
}
