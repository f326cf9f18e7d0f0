//! Shared helper functions for MCP tool implementations.

use chrono::{NaiveDate, NaiveDateTime};
use pyrus_client::requests::{FieldUpdate, NewFile, PersonRef};
use pyrus_client::{ClientError, ClientResult};
use serde_json::Value;
use tracing::warn;

use super::params::{AttachmentParam, FieldValueParam};

/// Build a structured error JSON string that LLMs can parse.
pub fn error_json(error_code: &str, message: &str) -> String {
    serde_json::json!({
        "error": error_code,
        "message": message,
    })
    .to_string()
}

/// Render an operation outcome as the text returned to the MCP caller.
///
/// Success is pretty-printed JSON; failure is the structured error payload.
pub fn render(tool: &str, result: ClientResult<Value>) -> String {
    match result {
        Ok(value) => serde_json::to_string_pretty(&value)
            .unwrap_or_else(|e| error_json("serialization_error", &e.to_string())),
        Err(e) => {
            warn!(tool, kind = e.kind(), error = %e, "Tool call failed");
            serde_json::to_string_pretty(&e.to_payload())
                .unwrap_or_else(|e| error_json("serialization_error", &e.to_string()))
        }
    }
}

/// Parse a `YYYY-MM-DD` argument.
pub fn parse_date(field: &str, raw: &str) -> ClientResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ClientError::invalid_argument(format!(
            "{} must be in YYYY-MM-DD format, got '{}'",
            field, raw
        ))
    })
}

/// Parse a `YYYY-MM-DDTHH:MM` argument.
pub fn parse_datetime(field: &str, raw: &str) -> ClientResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M").map_err(|_| {
        ClientError::invalid_argument(format!(
            "{} must be in YYYY-MM-DDTHH:MM format, got '{}'",
            field, raw
        ))
    })
}

pub fn require_text(field: &str, value: &str) -> ClientResult<()> {
    if value.trim().is_empty() {
        return Err(ClientError::invalid_argument(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

pub fn person_refs(raw: Option<Vec<String>>) -> Option<Vec<PersonRef>> {
    raw.map(|list| PersonRef::parse_all(&list))
}

/// Convert attachment arguments, rejecting entries that reference no file.
pub fn new_files(attachments: Option<Vec<AttachmentParam>>) -> ClientResult<Option<Vec<NewFile>>> {
    let Some(attachments) = attachments else {
        return Ok(None);
    };
    attachments
        .into_iter()
        .enumerate()
        .map(|(index, a)| {
            let file = NewFile {
                guid: a.guid,
                root_id: a.root_id,
                attachment_id: a.attachment_id,
                url: a.url,
                name: a.name,
            };
            if file.has_source() {
                Ok(file)
            } else {
                Err(ClientError::invalid_argument(format!(
                    "attachments[{}] needs one of 'guid', 'attachment_id' or 'url'",
                    index
                )))
            }
        })
        .collect::<ClientResult<Vec<_>>>()
        .map(Some)
}

/// Convert form field arguments, rejecting entries with neither id nor name.
pub fn field_updates(
    argument: &str,
    fields: Option<Vec<FieldValueParam>>,
) -> ClientResult<Option<Vec<FieldUpdate>>> {
    let Some(fields) = fields else {
        return Ok(None);
    };
    fields
        .into_iter()
        .enumerate()
        .map(|(index, f)| {
            if f.id.is_none() && f.name.is_none() {
                return Err(ClientError::invalid_argument(format!(
                    "{}[{}] needs 'id' or 'name'",
                    argument, index
                )));
            }
            Ok(FieldUpdate {
                id: f.id,
                name: f.name,
                value: f.value,
            })
        })
        .collect::<ClientResult<Vec<_>>>()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_json() {
        let parsed: Value = serde_json::from_str(&error_json("test_code", "msg")).unwrap();
        assert_eq!(parsed["error"], "test_code");
        assert_eq!(parsed["message"], "msg");
    }

    #[test]
    fn test_render_success_is_pretty_json() {
        let text = render("t", Ok(json!({"id": 1})));
        assert!(text.contains('\n'));
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap()["id"], 1);
    }

    #[test]
    fn test_render_error_payload() {
        let text = render("t", Err(ClientError::remote("invalid_task_id", "Task not found")));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["error"], "remote_service_error");
        assert_eq!(parsed["code"], "invalid_task_id");
    }

    #[test]
    fn test_parse_dates() {
        assert!(parse_date("due_date", "2024-01-15").is_ok());
        let err = parse_date("due_date", "15.01.2024").unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        assert!(err.to_string().contains("due_date"));

        assert!(parse_datetime("due", "2024-01-15T14:00").is_ok());
        assert!(parse_datetime("due", "2024-01-15").is_err());
    }

    #[test]
    fn test_new_files_requires_source() {
        assert!(new_files(None).unwrap().is_none());
        let ok = new_files(Some(vec![AttachmentParam {
            guid: Some("g".into()),
            ..Default::default()
        }]))
        .unwrap()
        .unwrap();
        assert_eq!(ok[0].guid.as_deref(), Some("g"));

        let err = new_files(Some(vec![AttachmentParam {
            name: Some("x.pdf".into()),
            ..Default::default()
        }]))
        .unwrap_err();
        assert!(err.to_string().contains("attachments[0]"));
    }

    #[test]
    fn test_field_updates_require_id_or_name() {
        let err = field_updates(
            "fields",
            Some(vec![FieldValueParam {
                id: None,
                name: None,
                value: json!(1),
            }]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("fields[0]"));
    }
}
