//! Account listing, profile and organization directory operations.

use pyrus_client::{normalize, ClientResult, SessionManager, Shape};
use serde_json::{json, Value};

use super::params::{AccountParams, GetContactsParams};

/// Configured accounts with their connection state. Makes no remote call.
pub async fn list_accounts(sessions: &SessionManager) -> ClientResult<Value> {
    let mut accounts = Vec::new();
    for summary in sessions.registry().list() {
        let connected = sessions.is_connected(&summary.key).await;
        let mut entry = serde_json::to_value(&summary)?;
        entry["connected"] = json!(connected);
        accounts.push(entry);
    }
    Ok(Value::Array(accounts))
}

pub async fn get_profile(sessions: &SessionManager, params: AccountParams) -> ClientResult<Value> {
    let session = sessions.get(params.account.as_deref()).await?;
    let body = session.get("profile", &[]).await?;
    Ok(normalize(&body, Shape::Profile))
}

pub async fn get_contacts(
    sessions: &SessionManager,
    params: GetContactsParams,
) -> ClientResult<Value> {
    let include_inactive = params.include_inactive.unwrap_or(false);
    let session = sessions.get(params.account.as_deref()).await?;
    let body = session
        .get("contacts", &[("include_inactive", include_inactive.to_string())])
        .await?;
    Ok(normalize(&body, Shape::Contact))
}

pub async fn get_members(sessions: &SessionManager, params: AccountParams) -> ClientResult<Value> {
    let session = sessions.get(params.account.as_deref()).await?;
    let body = session.get("members", &[]).await?;
    Ok(normalize(&body, Shape::Member))
}

pub async fn get_roles(sessions: &SessionManager, params: AccountParams) -> ClientResult<Value> {
    let session = sessions.get(params.account.as_deref()).await?;
    let body = session.get("roles", &[]).await?;
    Ok(normalize(&body, Shape::Role))
}
