//! Configured account set with default-account resolution.
//!
//! `AccountRegistry` is built once from the accounts file and is read-only
//! afterwards. Accounts are kept in a `Vec` sorted by key; the set is small
//! (a handful of workspaces) so linear lookup keeps everything co-located.

use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::config::{self, Account, AccountSummary};
use crate::error::{ClientError, ClientResult};

/// Mapping from account key to [`Account`] plus an optional default key.
#[derive(Debug, Clone)]
pub struct AccountRegistry {
    accounts: Vec<Account>,
    default_account: Option<String>,
}

impl AccountRegistry {
    /// Build a registry from a parsed configuration payload.
    ///
    /// Pure transform: touches neither network nor session state.
    pub fn load(source: &Value) -> ClientResult<Self> {
        let root = source
            .as_object()
            .ok_or_else(|| ClientError::config_error("Accounts configuration must be a JSON object"))?;

        let entries = root
            .get("accounts")
            .ok_or_else(|| ClientError::config_error("Accounts configuration must contain 'accounts' key"))?
            .as_object()
            .ok_or_else(|| ClientError::config_error("'accounts' must be a JSON object"))?;

        if entries.is_empty() {
            return Err(ClientError::config_error(
                "Accounts configuration must have at least one account configured",
            ));
        }

        let mut accounts = entries
            .iter()
            .map(|(key, entry)| config::parse_account(key, entry))
            .collect::<ClientResult<Vec<_>>>()?;
        accounts.sort_by(|a, b| a.key.cmp(&b.key));

        let default_account = match root.get("default_account") {
            None | Some(Value::Null) => None,
            Some(Value::String(key)) => {
                if !accounts.iter().any(|a| &a.key == key) {
                    return Err(ClientError::config_error(format!(
                        "default_account '{}' does not match any configured account",
                        key
                    )));
                }
                Some(key.clone())
            }
            Some(_) => {
                return Err(ClientError::config_error(
                    "'default_account' must be a string",
                ))
            }
        };

        info!(count = accounts.len(), "Loaded account(s)");
        Ok(Self {
            accounts,
            default_account,
        })
    }

    /// Read the accounts file at `path` and build a registry from it.
    pub fn load_from_path(path: &Path) -> ClientResult<Self> {
        let source = config::read_accounts_file(path)?;
        Self::load(&source)
    }

    fn find(&self, key: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.key == key)
    }

    /// All account keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        self.accounts.iter().map(|a| a.key.as_str()).collect()
    }

    /// Explicitly configured default key, if any.
    pub fn default_key(&self) -> Option<&str> {
        self.default_account.as_deref()
    }

    /// Key used when a caller omits the selector.
    ///
    /// The configured default, or the only account when exactly one exists.
    pub fn effective_default(&self) -> Option<&str> {
        match (&self.default_account, self.accounts.as_slice()) {
            (Some(key), _) => Some(key.as_str()),
            (None, [only]) => Some(only.key.as_str()),
            _ => None,
        }
    }

    /// Return the account for `selector`, or the default account when omitted.
    pub fn resolve(&self, selector: Option<&str>) -> ClientResult<&Account> {
        match selector {
            Some(key) => self.find(key).ok_or_else(|| ClientError::UnknownAccount {
                account: key.to_string(),
                available: self.keys().join(", "),
            }),
            None => self
                .effective_default()
                .and_then(|key| self.find(key))
                .ok_or(ClientError::NoDefaultAccount {
                    count: self.accounts.len(),
                }),
        }
    }

    /// Public attributes of every account, sorted by key.
    pub fn list(&self) -> Vec<AccountSummary> {
        let default = self.effective_default();
        self.accounts
            .iter()
            .map(|a| AccountSummary {
                key: a.key.clone(),
                name: a.name.clone(),
                description: a.description.clone(),
                login: a.login.clone(),
                is_default: Some(a.key.as_str()) == default,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
