//! Account configuration file contract and discovery.
//!
//! The accounts file is a JSON document:
//!
//! ```json
//! {
//!   "accounts": {
//!     "work": {
//!       "name": "Work",
//!       "description": "Company workspace",
//!       "login": "bot@example.com",
//!       "security_key": "..."
//!     }
//!   },
//!   "default_account": "work"
//! }
//! ```
//!
//! Search order when no explicit path is given:
//! 1. `./accounts.json` (working directory)
//! 2. `~/.config/pyrus-mcp/accounts.json` (user-global)

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Accounts file name looked up in each search location.
pub const ACCOUNTS_FILENAME: &str = "accounts.json";

/// Directory under the user config dir holding the global accounts file.
pub const GLOBAL_CONFIG_DIR: &str = "pyrus-mcp";

/// Pyrus cloud authentication endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://accounts.pyrus.com/api/v4/auth";

/// One configured Pyrus identity.
///
/// Immutable after load. The security key is redacted from `Debug` output and
/// never serialized.
#[derive(Clone)]
pub struct Account {
    pub key: String,
    pub name: String,
    pub description: String,
    pub login: String,
    pub(crate) security_key: String,
    pub auth_url: String,
}

impl Account {
    /// Security key used for the authentication handshake.
    pub fn security_key(&self) -> &str {
        &self.security_key
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("login", &self.login)
            .field("security_key", &"<redacted>")
            .field("auth_url", &self.auth_url)
            .finish()
    }
}

/// Public view of an account for listing. Never carries the credential.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub key: String,
    pub name: String,
    pub description: String,
    pub login: String,
    pub is_default: bool,
}

/// Parse one `accounts.<key>` entry.
pub(crate) fn parse_account(key: &str, entry: &Value) -> ClientResult<Account> {
    let fields = entry.as_object().ok_or_else(|| {
        ClientError::config_error(format!("Account '{}' must be a JSON object", key))
    })?;

    let required = |field: &str| -> ClientResult<String> {
        match fields.get(field).and_then(Value::as_str) {
            Some(value) if !value.trim().is_empty() => Ok(value.to_string()),
            _ => Err(ClientError::config_error(format!(
                "Account '{}' is missing required field '{}'",
                key, field
            ))),
        }
    };
    let optional = |field: &str| fields.get(field).and_then(Value::as_str).map(str::to_string);

    Ok(Account {
        key: key.to_string(),
        name: optional("name").unwrap_or_else(|| key.to_string()),
        description: optional("description").unwrap_or_default(),
        login: required("login")?,
        security_key: required("security_key")?,
        auth_url: optional("auth_url").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
    })
}

/// Candidate accounts file locations in precedence order.
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(ACCOUNTS_FILENAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(GLOBAL_CONFIG_DIR).join(ACCOUNTS_FILENAME));
    }
    paths
}

/// Pick the accounts file to load.
///
/// An explicit path always wins, even if it does not exist, so the eventual
/// error names the path the operator asked for. Otherwise the first existing
/// candidate is returned, falling back to `./accounts.json`.
pub fn find_accounts_file(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    candidate_paths()
        .into_iter()
        .find(|p| p.is_file())
        .unwrap_or_else(|| PathBuf::from(ACCOUNTS_FILENAME))
}

/// Read and parse the accounts file as raw JSON.
pub fn read_accounts_file(path: &Path) -> ClientResult<Value> {
    if !path.is_file() {
        return Err(ClientError::config_error(format!(
            "{} not found at {}",
            ACCOUNTS_FILENAME,
            path.display()
        )));
    }
    debug!("Loading accounts from: {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| {
        ClientError::config_error(format!("Invalid JSON in {}: {}", path.display(), e))
    })
}
