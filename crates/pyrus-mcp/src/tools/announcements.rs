//! Announcement operations.

use pyrus_client::requests::CreateAnnouncementRequest;
use pyrus_client::{normalize, normalize_entity, ClientResult, SessionManager, Shape};
use serde_json::Value;

use super::helpers::require_text;
use super::params::{CreateAnnouncementParams, GetAnnouncementsParams};

pub const DEFAULT_ANNOUNCEMENT_LIMIT: u32 = 100;

pub async fn get_announcements(
    sessions: &SessionManager,
    params: GetAnnouncementsParams,
) -> ClientResult<Value> {
    let limit = params.limit.unwrap_or(DEFAULT_ANNOUNCEMENT_LIMIT);
    let session = sessions.get(params.account.as_deref()).await?;
    let body = session
        .get("announcements", &[("item_count", limit.to_string())])
        .await?;
    Ok(normalize(&body, Shape::AnnouncementList))
}

pub async fn create_announcement(
    sessions: &SessionManager,
    params: CreateAnnouncementParams,
) -> ClientResult<Value> {
    require_text("text", &params.text)?;
    let request = CreateAnnouncementRequest { text: params.text };
    let session = sessions.get(params.account.as_deref()).await?;
    let body = session.post("announcements", &request).await?;
    normalize_entity(&body, Shape::Announcement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;

    #[tokio::test]
    async fn test_listing_with_entries_the_typed_model_rejects() {
        let server = MockServer::start();
        testing::auth(&server);
        server.mock(|when, then| {
            when.method(GET)
                .path("/v4/announcements")
                .query_param("item_count", "100");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"{"announcements":[
                        {"id":1,"text":"a","author":{"id":2,"first_name":"Kim"},"comments":[{"id":"c1"}]},
                        {"id":2,"text":"b"},
                        {"id":3,"text":"c"}
                    ]}"#,
                );
        });

        let sessions = testing::sessions(&server);
        let list = get_announcements(&sessions, GetAnnouncementsParams::default())
            .await
            .unwrap();
        let entries = list.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["author"]["name"], "Kim");
        assert_eq!(entries[0]["comments_count"], 1);
    }

    #[tokio::test]
    async fn test_create_requires_text() {
        let server = MockServer::start();
        let auth = testing::auth(&server);
        let create = server.mock(|when, then| {
            when.method(POST).path("/v4/announcements");
            then.status(200).body("{}");
        });

        let sessions = testing::sessions(&server);
        let err = create_announcement(
            &sessions,
            CreateAnnouncementParams {
                text: "".into(),
                account: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        auth.assert_calls(0);
        create.assert_calls(0);
    }

    #[tokio::test]
    async fn test_create_announcement() {
        let server = MockServer::start();
        testing::auth(&server);
        server.mock(|when, then| {
            when.method(POST).path("/v4/announcements");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"announcement":{"id":10,"text":"Hello team"}}"#);
        });

        let sessions = testing::sessions(&server);
        let created = create_announcement(
            &sessions,
            CreateAnnouncementParams {
                text: "Hello team".into(),
                account: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(created["id"], 10);
        assert_eq!(created["comments_count"], 0);
    }
}
