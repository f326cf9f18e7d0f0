//! Authenticated Pyrus sessions and the per-account session cache.
//!
//! A [`Session`] is created lazily on the first call that needs an account,
//! via the `POST {auth_url}` handshake, and then reused for the life of the
//! process. Failed handshakes are never cached.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Account;
use crate::error::{ClientError, ClientResult};
use crate::models::{AuthResponse, UploadResponse};
use crate::normalize::{check_remote_error, error_indicator};
use crate::registry::AccountRegistry;

/// API base used when the handshake does not name a cluster.
pub const DEFAULT_API_URL: &str = "https://api.pyrus.com/v4/";

/// HTTP request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const MAX_ERROR_BODY: usize = 300;

/// HTTP client settings shared by every session.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientOptions {
    /// Build the shared `reqwest` client.
    pub fn build_http(&self) -> ClientResult<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("pyrus-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(client)
    }
}

/// Raw downloaded file.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    /// Name taken from `Content-Disposition`, if the server sent a usable one.
    pub filename: Option<String>,
    pub content: Vec<u8>,
}

/// Live authenticated handle bound to one account.
pub struct Session {
    account_key: String,
    access_token: String,
    api_url: Url,
    advertised_files_url: Option<String>,
    created_at: DateTime<Utc>,
    http: reqwest::Client,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("account_key", &self.account_key)
            .field("access_token", &"<redacted>")
            .field("api_url", &self.api_url.as_str())
            .field("advertised_files_url", &self.advertised_files_url)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Session {
    pub fn account_key(&self) -> &str {
        &self.account_key
    }

    /// API cluster base returned by the handshake, always with a trailing slash.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn advertised_files_url(&self) -> Option<&str> {
        self.advertised_files_url.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Resolve an API path (`tasks/42`) against the session's cluster.
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.api_url.join(path).map_err(|e| {
            ClientError::invalid_argument(format!("Invalid API path '{}': {}", path, e))
        })
    }

    /// `GET {api_url}{path}` returning the checked JSON body.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> ClientResult<Value> {
        let url = self.endpoint(path)?;
        debug!(account = %self.account_key, %url, "GET");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;
        read_json(response).await
    }

    /// `POST {api_url}{path}` with a JSON body, returning the checked JSON body.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<Value> {
        let url = self.endpoint(path)?;
        debug!(account = %self.account_key, %url, "POST");
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }

    /// Upload target for binary transfers.
    ///
    /// Always derived from the session's own API cluster. The `files_url`
    /// advertised by the handshake can name a different cluster and is only
    /// logged.
    pub fn upload_endpoint(&self) -> ClientResult<Url> {
        let endpoint = self.endpoint("files/upload")?;
        if let Some(advertised) = &self.advertised_files_url {
            let advertised_host = Url::parse(advertised)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string));
            if advertised_host.as_deref() != endpoint.host_str() {
                debug!(
                    account = %self.account_key,
                    advertised = %advertised,
                    using = %endpoint,
                    "Ignoring advertised files endpoint on another host"
                );
            }
        }
        Ok(endpoint)
    }

    /// Multipart upload of `content` as `filename`.
    pub async fn upload(&self, filename: &str, content: Vec<u8>) -> ClientResult<UploadResponse> {
        let url = self.upload_endpoint()?;
        info!(
            account = %self.account_key,
            filename,
            size = content.len(),
            "Uploading file"
        );
        let form = Form::new().part("file", Part::bytes(content).file_name(filename.to_string()));
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await?;
        let body = read_json(response).await?;
        let upload: UploadResponse = serde_json::from_value(body)?;
        match upload.guid.as_deref() {
            Some(guid) if !guid.is_empty() => Ok(upload),
            _ => Err(ClientError::remote(
                "invalid_response",
                "Upload response did not contain a file guid",
            )),
        }
    }

    /// `GET {api_url}files/download/{file_id}` as raw bytes.
    pub async fn download(&self, file_id: i64) -> ClientResult<DownloadedFile> {
        let url = self.endpoint(&format!("files/download/{}", file_id))?;
        debug!(account = %self.account_key, %url, "Downloading file");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Errors come back as the usual JSON envelope
            return Err(read_json(response)
                .await
                .err()
                .unwrap_or_else(|| http_error(status, "")));
        }

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_content_disposition);
        let content = response.bytes().await?.to_vec();
        Ok(DownloadedFile { filename, content })
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_ERROR_BODY {
        return text.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

fn http_error(status: reqwest::StatusCode, body: &str) -> ClientError {
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        truncate(body)
    };
    ClientError::remote(format!("http_{}", status.as_u16()), message)
}

/// Parse a response body and apply remote error classification.
async fn read_json(response: reqwest::Response) -> ClientResult<Value> {
    let status = response.status();
    let text = response.text().await?;
    let body: Value = match serde_json::from_str(&text) {
        Ok(body) => body,
        Err(_) if !status.is_success() => return Err(http_error(status, &text)),
        Err(e) => {
            return Err(ClientError::remote(
                "invalid_response",
                format!("Response was not valid JSON: {}", e),
            ))
        }
    };
    check_remote_error(&body)?;
    if !status.is_success() {
        let message = body.get("error").and_then(Value::as_str).unwrap_or("");
        return Err(http_error(status, message));
    }
    Ok(body)
}

/// Extract a safe local filename from a `Content-Disposition` header.
///
/// `filename*=` wins over `filename=`. The value is URL-decoded (`+` is a
/// space) and reduced to its final path component.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for param in header.split(';').map(str::trim) {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"');
        match name.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                // RFC 5987: charset'lang'value
                let encoded = value.splitn(3, '\'').nth(2).unwrap_or(value);
                extended = Some(encoded.to_string());
            }
            "filename" => plain = Some(value.to_string()),
            _ => {}
        }
    }
    let raw = extended.or(plain)?;
    let decoded = url_decode(&raw)?;
    let name = decoded
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .unwrap_or_default();
    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

fn url_decode(raw: &str) -> Option<String> {
    let escaped = raw.replace('&', "%26").replace('=', "%3D");
    url::form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(decoded, _)| decoded.into_owned())
}

fn with_trailing_slash(raw: &str) -> Result<Url, url::ParseError> {
    if raw.ends_with('/') {
        Url::parse(raw)
    } else {
        Url::parse(&format!("{}/", raw))
    }
}

/// Perform the authentication handshake for `account`.
async fn authenticate(http: &reqwest::Client, account: &Account) -> ClientResult<Session> {
    let fail = |detail: String| ClientError::authentication(account.key.clone(), detail);

    let response = http
        .post(&account.auth_url)
        .json(&json!({
            "login": account.login,
            "security_key": account.security_key(),
        }))
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    let body: Value = serde_json::from_str(&text).map_err(|_| {
        fail(format!(
            "HTTP {}: handshake response was not JSON",
            status.as_u16()
        ))
    })?;

    if let Some(code) = error_indicator(&body) {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("handshake rejected");
        return Err(fail(format!("{} ({})", message, code)));
    }
    if !status.is_success() {
        return Err(fail(format!("HTTP {}", status)));
    }

    let auth: AuthResponse = serde_json::from_value(body).map_err(|e| fail(e.to_string()))?;
    let access_token = auth
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| fail("handshake returned no access_token".to_string()))?;
    let api_url_raw = auth
        .api_url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let api_url = with_trailing_slash(&api_url_raw)
        .map_err(|e| fail(format!("invalid api_url '{}': {}", api_url_raw, e)))?;

    Ok(Session {
        account_key: account.key.clone(),
        access_token,
        api_url,
        advertised_files_url: auth.files_url,
        created_at: Utc::now(),
        http: http.clone(),
    })
}

/// Lazily-populated cache of one [`Session`] per account.
///
/// The cache lock is never held across a handshake. Two concurrent first
/// calls for the same account may both authenticate; the last write wins.
#[derive(Debug)]
pub struct SessionManager {
    registry: AccountRegistry,
    http: reqwest::Client,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionManager {
    pub fn new(registry: AccountRegistry, options: &ClientOptions) -> ClientResult<Self> {
        Ok(Self::with_http(registry, options.build_http()?))
    }

    pub fn with_http(registry: AccountRegistry, http: reqwest::Client) -> Self {
        Self {
            registry,
            http,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    /// Session for `selector` (or the default account), authenticating on first use.
    pub async fn get(&self, selector: Option<&str>) -> ClientResult<Arc<Session>> {
        let account = self.registry.resolve(selector)?;

        let cached = self.sessions.read().await.get(&account.key).cloned();
        if let Some(session) = cached {
            return Ok(session);
        }

        let session = match authenticate(&self.http, account).await {
            Ok(session) => Arc::new(session),
            Err(e) => {
                warn!(account = %account.key, error = %e, "Pyrus authentication failed");
                return Err(e);
            }
        };
        info!(
            account = %account.key,
            api_url = %session.api_url,
            "Created Pyrus session"
        );

        self.sessions
            .write()
            .await
            .insert(account.key.clone(), Arc::clone(&session));
        Ok(session)
    }

    /// Whether a session for `key` has been established.
    pub async fn is_connected(&self, key: &str) -> bool {
        self.sessions.read().await.contains_key(key)
    }
}
