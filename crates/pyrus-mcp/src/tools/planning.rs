//! Calendar, task list and catalog operations.

use chrono::NaiveTime;
use pyrus_client::requests::format_datetime;
use pyrus_client::{normalize, ClientError, ClientResult, SessionManager, Shape};
use serde_json::Value;

use super::helpers::parse_date;
use super::params::{AccountParams, GetCalendarParams, GetCatalogParams, GetListTasksParams};

pub const DEFAULT_LIST_TASKS_LIMIT: u32 = 200;

/// Calendar `filter_mask` bits: tasks with due dates, scheduled tasks, reminders.
const CALENDAR_TASKS_MASK: u32 = 0b0111;
/// Calendar `filter_mask` bit for meetings (events with a duration).
const CALENDAR_MEETINGS_MASK: u32 = 0b1000;

fn calendar_query(params: &GetCalendarParams) -> ClientResult<Vec<(&'static str, String)>> {
    let start = parse_date("start_date", &params.start_date)?;
    let end = parse_date("end_date", &params.end_date)?;
    if end < start {
        return Err(ClientError::invalid_argument(format!(
            "end_date {} is before start_date {}",
            end, start
        )));
    }
    let mask = if params.include_meetings.unwrap_or(true) {
        CALENDAR_TASKS_MASK | CALENDAR_MEETINGS_MASK
    } else {
        CALENDAR_TASKS_MASK
    };
    Ok(vec![
        ("start_date_utc", format_datetime(start.and_time(NaiveTime::MIN))),
        ("end_date_utc", format_datetime(end.and_time(NaiveTime::MIN))),
        ("filter_mask", mask.to_string()),
    ])
}

pub async fn get_calendar(
    sessions: &SessionManager,
    params: GetCalendarParams,
) -> ClientResult<Value> {
    let query = calendar_query(&params)?;
    let session = sessions.get(params.account.as_deref()).await?;
    let body = session.get("calendar", &query).await?;
    Ok(normalize(&body, Shape::CalendarEntry))
}

pub async fn get_lists(sessions: &SessionManager, params: AccountParams) -> ClientResult<Value> {
    let session = sessions.get(params.account.as_deref()).await?;
    let body = session.get("lists", &[]).await?;
    Ok(normalize(&body, Shape::List))
}

pub async fn get_list_tasks(
    sessions: &SessionManager,
    params: GetListTasksParams,
) -> ClientResult<Value> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_TASKS_LIMIT);
    let session = sessions.get(params.account.as_deref()).await?;
    let body = session
        .get(
            &format!("lists/{}/tasks", params.list_id),
            &[("item_count", limit.to_string())],
        )
        .await?;
    Ok(normalize(&body, Shape::TaskList))
}

pub async fn get_catalog(sessions: &SessionManager, params: GetCatalogParams) -> ClientResult<Value> {
    let session = sessions.get(params.account.as_deref()).await?;
    let body = session
        .get(&format!("catalogs/{}", params.catalog_id), &[])
        .await?;
    Ok(normalize(&body, Shape::Catalog))
}
