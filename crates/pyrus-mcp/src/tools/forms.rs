//! Form template and form registry operations.

use pyrus_client::requests::{CreateTaskRequest, FormRegisterRequest};
use pyrus_client::{normalize, normalize_entity, ClientResult, SessionManager, Shape};
use serde_json::Value;

use super::helpers::field_updates;
use super::params::{AccountParams, CreateFormTaskParams, GetFormParams, GetRegistryParams};

pub const DEFAULT_REGISTRY_LIMIT: u32 = 100;

pub async fn get_forms(sessions: &SessionManager, params: AccountParams) -> ClientResult<Value> {
    let session = sessions.get(params.account.as_deref()).await?;
    let body = session.get("forms", &[]).await?;
    Ok(normalize(&body, Shape::FormList))
}

pub async fn get_form(sessions: &SessionManager, params: GetFormParams) -> ClientResult<Value> {
    let session = sessions.get(params.account.as_deref()).await?;
    let body = session.get(&format!("forms/{}", params.form_id), &[]).await?;
    Ok(normalize(&body, Shape::Form))
}

pub async fn get_registry(
    sessions: &SessionManager,
    params: GetRegistryParams,
) -> ClientResult<Value> {
    let request = FormRegisterRequest::new(
        params.limit.unwrap_or(DEFAULT_REGISTRY_LIMIT),
        params.include_archived.unwrap_or(false),
    );
    let session = sessions.get(params.account.as_deref()).await?;
    let body = session
        .post(&format!("forms/{}/register", params.form_id), &request)
        .await?;
    Ok(normalize(&body, Shape::RegistryEntry))
}

pub async fn create_form_task(
    sessions: &SessionManager,
    params: CreateFormTaskParams,
) -> ClientResult<Value> {
    let request = CreateTaskRequest {
        form_id: Some(params.form_id),
        fields: field_updates("fields", params.fields)?,
        fill_defaults: Some(params.fill_defaults.unwrap_or(true)),
        ..Default::default()
    };
    let session = sessions.get(params.account.as_deref()).await?;
    let body = session.post("tasks", &request).await?;
    normalize_entity(&body, Shape::Task)
}
