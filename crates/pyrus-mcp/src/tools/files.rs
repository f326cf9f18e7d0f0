//! File transfer operations: download to disk, upload, and upload-then-attach.
//!
//! Uploads always go to the session's own API cluster (see
//! [`Session::upload_endpoint`](pyrus_client::Session::upload_endpoint)).

use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use pyrus_client::requests::{NewFile, TaskCommentRequest};
use pyrus_client::{ClientError, ClientResult, SessionManager};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::params::{AttachFileParams, DownloadFileParams, UploadFileContentParams, UploadFileParams};
use super::tasks::post_comment;

/// Name used when a caller-supplied upload name reduces to nothing.
const FALLBACK_UPLOAD_NAME: &str = "upload";

const EMPTY_FILE_WARNING: &str = "File has 0 bytes - may be empty or corrupted on server";

fn expand_home(raw: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (raw, home) {
        ("~", Some(home)) => home,
        (path, Some(home)) if path.starts_with("~/") => home.join(&path[2..]),
        (path, _) => PathBuf::from(path),
    }
}

fn default_download_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("Downloads"))
        .unwrap_or_else(|| PathBuf::from("Downloads"))
}

/// Final path component of `raw`, or `None` when nothing usable remains.
fn safe_filename(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Resolve the download directory without touching the filesystem.
fn resolve_save_dir(save_dir: Option<&str>) -> ClientResult<PathBuf> {
    let dir = non_empty(save_dir)
        .map(expand_home)
        .unwrap_or_else(default_download_dir);
    if dir.exists() && !dir.is_dir() {
        return Err(ClientError::invalid_argument(format!(
            "Cannot save file: '{}' exists but is not a directory",
            dir.display()
        )));
    }
    Ok(dir)
}

pub async fn download_file(
    sessions: &SessionManager,
    params: DownloadFileParams,
) -> ClientResult<Value> {
    let dir = resolve_save_dir(params.save_dir.as_deref())?;
    let session = sessions.get(params.account.as_deref()).await?;
    let file = session.download(params.file_id).await?;
    tokio::fs::create_dir_all(&dir).await?;

    let filename = file.filename.unwrap_or_else(|| {
        warn!(file_id = params.file_id, "No usable filename from server, using fallback");
        format!("file_{}", params.file_id)
    });
    let path = dir.join(&filename);

    let warning = file.content.is_empty().then(|| {
        warn!(file_id = params.file_id, "Downloaded file has 0 bytes");
        EMPTY_FILE_WARNING
    });

    if let Err(e) = tokio::fs::write(&path, &file.content).await {
        if path.exists() {
            if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %cleanup, "Failed to remove partial file");
            }
        }
        return Err(e.into());
    }

    info!(
        account = %session.account_key(),
        file_id = params.file_id,
        size = file.content.len(),
        path = %path.display(),
        "Downloaded file"
    );

    let mut result = json!({
        "status": "downloaded",
        "filename": filename,
        "saved_to": path.display().to_string(),
        "size": file.content.len(),
    });
    if let Some(warning) = warning {
        result["warning"] = json!(warning);
    }
    Ok(result)
}

/// Read a local file for upload, returning its name and content.
async fn read_local_file(raw_path: &str) -> ClientResult<(String, Vec<u8>)> {
    let path = expand_home(raw_path);
    if !path.is_file() {
        return Err(ClientError::invalid_argument(format!(
            "File not found: {}",
            raw_path
        )));
    }
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_UPLOAD_NAME.to_string());
    let content = tokio::fs::read(&path).await?;
    Ok((filename, content))
}

/// Decode inline base64 content for upload.
fn decode_content(content_base64: &str, filename: &str) -> ClientResult<(String, Vec<u8>)> {
    let content = BASE64
        .decode(content_base64.trim())
        .map_err(|e| ClientError::invalid_argument(format!("Invalid base64 content: {}", e)))?;
    let filename = safe_filename(filename).unwrap_or_else(|| FALLBACK_UPLOAD_NAME.to_string());
    Ok((filename, content))
}

pub async fn upload_file(sessions: &SessionManager, params: UploadFileParams) -> ClientResult<Value> {
    let (filename, content) = read_local_file(&params.file_path).await?;
    let session = sessions.get(params.account.as_deref()).await?;
    let uploaded = session.upload(&filename, content).await?;
    Ok(json!({
        "guid": uploaded.guid,
        "md5_hash": uploaded.md5_hash,
        "root_id": params.root_id,
    }))
}

pub async fn upload_file_content(
    sessions: &SessionManager,
    params: UploadFileContentParams,
) -> ClientResult<Value> {
    let (filename, content) = decode_content(&params.content_base64, &params.filename)?;
    let session = sessions.get(params.account.as_deref()).await?;
    let uploaded = session.upload(&filename, content).await?;
    Ok(json!({
        "guid": uploaded.guid,
        "md5_hash": uploaded.md5_hash,
    }))
}

/// Upload a file and attach it to a task with a single comment.
pub async fn attach_file_to_task(
    sessions: &SessionManager,
    params: AttachFileParams,
) -> ClientResult<Value> {
    let file_path = non_empty(params.file_path.as_deref());
    let content_base64 = non_empty(params.content_base64.as_deref());

    let (filename, content) = match (file_path, content_base64) {
        (Some(_), Some(_)) => {
            return Err(ClientError::invalid_argument(
                "Provide either file_path or content_base64, not both",
            ))
        }
        (None, None) => {
            return Err(ClientError::invalid_argument(
                "Must provide either file_path or content_base64",
            ))
        }
        (Some(path), None) => read_local_file(path).await?,
        (None, Some(content)) => {
            let filename = non_empty(params.filename.as_deref()).ok_or_else(|| {
                ClientError::invalid_argument("filename is required when using content_base64")
            })?;
            decode_content(content, filename)?
        }
    };

    let session = sessions.get(params.account.as_deref()).await?;
    let uploaded = session.upload(&filename, content).await?;

    let request = TaskCommentRequest {
        text: params.text,
        attachments: Some(vec![NewFile {
            guid: uploaded.guid,
            root_id: params.root_id,
            ..Default::default()
        }]),
        ..Default::default()
    };
    post_comment(sessions, params.account.as_deref(), params.task_id, &request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("report.pdf").as_deref(), Some("report.pdf"));
        assert_eq!(safe_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(safe_filename("dir\\x.txt").as_deref(), Some("x.txt"));
        assert_eq!(safe_filename("a/"), None);
        assert_eq!(safe_filename(".."), None);
    }

    #[test]
    fn test_expand_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/docs/a.txt"), home.join("docs/a.txt"));
            assert_eq!(expand_home("~"), home);
        }
        assert_eq!(expand_home("/tmp/a.txt"), PathBuf::from("/tmp/a.txt"));
    }

    #[test]
    fn test_decode_content() {
        let (name, bytes) = decode_content("aGVsbG8=", "../notes.txt").unwrap();
        assert_eq!(name, "notes.txt");
        assert_eq!(bytes, b"hello");

        let err = decode_content("not base64!!", "x.txt").unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        assert!(err.to_string().contains("Invalid base64"));
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let server = MockServer::start();
        testing::auth(&server);
        server.mock(|when, then| {
            when.method(GET).path("/v4/files/download/5");
            then.status(200)
                .header("content-disposition", "attachment; filename*=UTF-8''%D0%BE%D1%82%D1%87%D0%B5%D1%82.txt")
                .body("data");
        });

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");
        let sessions = testing::sessions(&server);
        let result = download_file(
            &sessions,
            DownloadFileParams {
                file_id: 5,
                save_dir: Some(target.display().to_string()),
                account: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(result["status"], "downloaded");
        assert_eq!(result["filename"], "отчет.txt");
        assert_eq!(result["size"], 4);
        assert!(result.get("warning").is_none());
        assert_eq!(std::fs::read(target.join("отчет.txt")).unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_download_fallback_name_and_empty_warning() {
        let server = MockServer::start();
        testing::auth(&server);
        server.mock(|when, then| {
            when.method(GET).path("/v4/files/download/9");
            then.status(200);
        });

        let dir = tempfile::tempdir().unwrap();
        let sessions = testing::sessions(&server);
        let result = download_file(
            &sessions,
            DownloadFileParams {
                file_id: 9,
                save_dir: Some(dir.path().display().to_string()),
                account: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(result["filename"], "file_9");
        assert_eq!(result["size"], 0);
        assert_eq!(result["warning"], EMPTY_FILE_WARNING);
        assert!(dir.path().join("file_9").exists());
    }

    #[tokio::test]
    async fn test_download_into_regular_file_is_rejected_before_handshake() {
        let server = MockServer::start();
        let auth = testing::auth(&server);
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let sessions = testing::sessions(&server);
        let err = download_file(
            &sessions,
            DownloadFileParams {
                file_id: 1,
                save_dir: Some(blocker.display().to_string()),
                account: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        auth.assert_calls(0);
    }

    #[tokio::test]
    async fn test_failed_download_creates_no_directory() {
        let server = MockServer::start();
        let auth = testing::auth(&server);
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("never-created");

        let sessions = testing::sessions(&server);
        let err = download_file(
            &sessions,
            DownloadFileParams {
                file_id: 1,
                save_dir: Some(target.display().to_string()),
                account: Some("missing".into()),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "unknown_account");
        auth.assert_calls(0);
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_upload_file_from_disk() {
        let server = MockServer::start();
        testing::auth(&server);
        let upload = server.mock(|when, then| {
            when.method(POST).path("/v4/files/upload");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"guid":"g-1","md5_hash":"m"}"#);
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();

        let sessions = testing::sessions(&server);
        let result = upload_file(
            &sessions,
            UploadFileParams {
                file_path: path.display().to_string(),
                root_id: Some(3),
                account: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(result, json!({"guid": "g-1", "md5_hash": "m", "root_id": 3}));
        upload.assert_calls(1);
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let server = MockServer::start();
        let auth = testing::auth(&server);
        let sessions = testing::sessions(&server);
        let err = upload_file(
            &sessions,
            UploadFileParams {
                file_path: "/nonexistent/file.bin".into(),
                root_id: None,
                account: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        auth.assert_calls(0);
    }

    #[tokio::test]
    async fn test_upload_content_invalid_base64_makes_no_calls() {
        let server = MockServer::start();
        let auth = testing::auth(&server);
        let sessions = testing::sessions(&server);
        let err = upload_file_content(
            &sessions,
            UploadFileContentParams {
                content_base64: "%%%".into(),
                filename: "x.bin".into(),
                account: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        auth.assert_calls(0);
    }

    #[tokio::test]
    async fn test_attach_argument_conflicts() {
        let server = MockServer::start();
        let auth = testing::auth(&server);
        let sessions = testing::sessions(&server);

        let both = AttachFileParams {
            task_id: 1,
            file_path: Some("/tmp/a".into()),
            content_base64: Some("aGk=".into()),
            ..Default::default()
        };
        assert!(attach_file_to_task(&sessions, both)
            .await
            .unwrap_err()
            .to_string()
            .contains("not both"));

        let neither = AttachFileParams {
            task_id: 1,
            ..Default::default()
        };
        assert!(attach_file_to_task(&sessions, neither).await.is_err());

        let nameless = AttachFileParams {
            task_id: 1,
            content_base64: Some("aGk=".into()),
            ..Default::default()
        };
        assert!(attach_file_to_task(&sessions, nameless)
            .await
            .unwrap_err()
            .to_string()
            .contains("filename is required"));

        auth.assert_calls(0);
    }

    #[tokio::test]
    async fn test_attach_uploads_then_comments() {
        let server = MockServer::start();
        let auth = testing::auth(&server);
        let upload = server.mock(|when, then| {
            when.method(POST).path("/v4/files/upload");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"guid":"g-7","md5_hash":"m"}"#);
        });
        let comment = server.mock(|when, then| {
            when.method(POST).path("/v4/tasks/11/comments").json_body(json!({
                "text": "See attached",
                "attachments": [{"guid": "g-7", "root_id": 4}]
            }));
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"task":{"id":11,"attachments":[{"id":99,"name":"hi.txt"}]}}"#);
        });

        let sessions = testing::sessions(&server);
        let task = attach_file_to_task(
            &sessions,
            AttachFileParams {
                task_id: 11,
                content_base64: Some("aGk=".into()),
                filename: Some("hi.txt".into()),
                text: Some("See attached".into()),
                root_id: Some(4),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(task["attachments"][0]["name"], "hi.txt");
        auth.assert_calls(1);
        upload.assert_calls(1);
        comment.assert_calls(1);
    }
}
