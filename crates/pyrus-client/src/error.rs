//! # Client Error Types
//!
//! Unified error handling for account resolution, session handshakes, remote
//! API calls and tool argument validation.

use serde_json::{json, Value};
use thiserror::Error;

/// Client operation result type
pub type ClientResult<T> = Result<T, ClientError>;

/// Comprehensive error types for client operations
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Account '{account}' not found. Available accounts: [{available}]")]
    UnknownAccount { account: String, available: String },

    #[error(
        "No default account configured and {count} accounts exist. \
         Pass 'account' explicitly or set 'default_account'"
    )]
    NoDefaultAccount { count: usize },

    #[error("Authentication failed for account '{account}': {detail}")]
    Authentication { account: String, detail: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Pyrus API error: {code} - {message}")]
    RemoteService { code: String, message: String },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create an argument validation error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a remote business-logic error from the reported code and message
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteService {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error for an account
    pub fn authentication(account: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Authentication {
            account: account.into(),
            detail: detail.into(),
        }
    }

    /// Stable kind tag surfaced to MCP callers.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::ConfigError(_) => "config_error",
            ClientError::UnknownAccount { .. } => "unknown_account",
            ClientError::NoDefaultAccount { .. } => "no_default_account",
            ClientError::Authentication { .. } => "authentication_error",
            ClientError::InvalidArgument(_) => "invalid_argument",
            ClientError::RemoteService { .. } => "remote_service_error",
            ClientError::Transport(_) => "transport_error",
            ClientError::Serialization(_) => "serialization_error",
            ClientError::Io(_) => "io_error",
        }
    }

    /// Render as the structured error object returned to callers.
    ///
    /// Always carries `error` (kind tag) and `message`; remote errors add the
    /// verbatim `code`, authentication errors add the `account` key.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        let mut payload = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        match self {
            ClientError::RemoteService { code, .. } => {
                payload["code"] = Value::String(code.clone());
            }
            ClientError::Authentication { account, .. } => {
                payload["account"] = Value::String(account.clone());
            }
            _ => {}
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_constructor() {
        let err = ClientError::config_error("bad config");
        match err {
            ClientError::ConfigError(msg) => assert_eq!(msg, "bad config"),
            _ => panic!("Expected ConfigError variant"),
        }
    }

    #[test]
    fn test_remote_constructor() {
        let err = ClientError::remote("invalid_task_id", "Task not found");
        match err {
            ClientError::RemoteService { code, message } => {
                assert_eq!(code, "invalid_task_id");
                assert_eq!(message, "Task not found");
            }
            _ => panic!("Expected RemoteService variant"),
        }
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(ClientError::config_error("x").kind(), "config_error");
        assert_eq!(
            ClientError::UnknownAccount {
                account: "a".into(),
                available: String::new()
            }
            .kind(),
            "unknown_account"
        );
        assert_eq!(
            ClientError::NoDefaultAccount { count: 2 }.kind(),
            "no_default_account"
        );
        assert_eq!(
            ClientError::authentication("work", "denied").kind(),
            "authentication_error"
        );
        assert_eq!(ClientError::invalid_argument("x").kind(), "invalid_argument");
        assert_eq!(
            ClientError::remote("c", "m").kind(),
            "remote_service_error"
        );
    }

    #[test]
    fn test_display_unknown_account() {
        let err = ClientError::UnknownAccount {
            account: "missing".to_string(),
            available: "home, work".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Account 'missing' not found. Available accounts: [home, work]"
        );
    }

    #[test]
    fn test_display_remote() {
        let err = ClientError::remote("access_denied", "No rights");
        assert_eq!(format!("{err}"), "Pyrus API error: access_denied - No rights");
    }

    #[test]
    fn test_payload_remote_carries_code() {
        let payload = ClientError::remote("invalid_task_id", "Task not found").to_payload();
        assert_eq!(payload["error"], "remote_service_error");
        assert_eq!(payload["code"], "invalid_task_id");
        assert!(payload["message"]
            .as_str()
            .unwrap()
            .contains("Task not found"));
    }

    #[test]
    fn test_payload_auth_carries_account() {
        let payload = ClientError::authentication("home", "invalid credentials").to_payload();
        assert_eq!(payload["error"], "authentication_error");
        assert_eq!(payload["account"], "home");
    }

    #[test]
    fn test_payload_plain_kinds_have_no_extras() {
        let payload = ClientError::invalid_argument("due_date and cancel_due").to_payload();
        assert_eq!(payload["error"], "invalid_argument");
        assert!(payload.get("code").is_none());
        assert!(payload.get("account").is_none());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad}}").unwrap_err();
        let err: ClientError = json_err.into();
        assert!(matches!(err, ClientError::Serialization(_)));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no access");
        let err: ClientError = io_err.into();
        assert!(matches!(err, ClientError::Io(_)));
        assert_eq!(err.kind(), "io_error");
    }
}
