//! MCP ServerHandler implementation for Pyrus.
//!
//! Every tool accepts an optional `account` parameter selecting one of the
//! configured Pyrus accounts:
//!
//! **Accounts & profile**
//! - `list_accounts`: Configured accounts and whether each is connected
//! - `get_profile`: Current user's profile and organization
//!
//! **Inbox & tasks**
//! - `get_inbox`, `get_task`, `create_task`
//! - `comment_task`: Comments, status, scheduling, due dates, lists, people, approvals
//! - `complete_task`, `reopen_task`
//!
//! **Forms & registry**
//! - `get_forms`, `get_form`, `get_registry`, `create_form_task`
//!
//! **Organization**
//! - `get_contacts`, `get_members`, `get_roles`
//!
//! **Announcements**
//! - `get_announcements`, `create_announcement`
//!
//! **Calendar, lists & catalogs**
//! - `get_calendar`, `get_lists`, `get_list_tasks`, `get_catalog`
//!
//! **Files**
//! - `download_file`, `upload_file`, `upload_file_content`, `attach_file_to_task`

use std::sync::Arc;

use pyrus_client::SessionManager;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ServerHandler};

use crate::tools::*;

/// Pyrus MCP server handler dispatching tool calls to per-account sessions.
#[derive(Debug, Clone)]
pub struct PyrusMcpServer {
    tool_router: ToolRouter<Self>,
    sessions: Arc<SessionManager>,
}

impl PyrusMcpServer {
    pub fn new(sessions: SessionManager) -> Self {
        Self::with_sessions(Arc::new(sessions))
    }

    /// Create a server sharing an existing session manager.
    pub fn with_sessions(sessions: Arc<SessionManager>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for PyrusMcpServer {
    fn get_info(&self) -> ServerInfo {
        let registry = self.sessions.registry();
        let default_note = match registry.effective_default() {
            Some(key) => format!("Omitting 'account' uses the default account '{}'.", key),
            None => "No default account is configured: pass 'account' on every call.".to_string(),
        };
        let instructions = format!(
            "Pyrus is a task management and workflow platform. This server manages Pyrus on \
             behalf of the user across {count} configured account(s): [{keys}].\n\
             Every tool accepts an optional 'account' parameter. {default_note}\n\
             Use list_accounts to see which account fits the user's request.\n\
             Tasks: get_inbox → get_task → comment_task (the main tool for changing a task). \
             complete_task/reopen_task are shortcuts for status changes.\n\
             Forms: get_forms → get_form (field ids) → create_form_task / get_registry.\n\
             Files: upload_file or upload_file_content returns a guid for attachments; \
             attach_file_to_task uploads and attaches in one step; download_file saves to disk.\n\
             People are referenced by email or numeric person id (see get_members).",
            count = registry.len(),
            keys = registry.keys().join(", "),
        );

        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "pyrus-mcp".to_string(),
                title: Some("Pyrus MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: Some(
                    "MCP server exposing Pyrus task management across multiple accounts: \
                     inbox, tasks, forms, contacts, announcements, calendar, lists, catalogs \
                     and files"
                        .to_string(),
                ),
                icons: None,
                website_url: None,
            },
            instructions: Some(instructions),
        }
    }
}

#[tool_router(router = tool_router)]
impl PyrusMcpServer {
    // ── Accounts & profile ──

    #[tool(
        name = "list_accounts",
        description = "List all configured Pyrus accounts with key, name, description, login, whether it is the default, and whether a session is already connected. Use this to decide which account a request belongs to."
    )]
    pub async fn list_accounts(&self) -> String {
        render(
            "list_accounts",
            organization::list_accounts(&self.sessions).await,
        )
    }

    #[tool(
        name = "get_profile",
        description = "Get the current user's profile for an account: person id, name, email and organization."
    )]
    pub async fn get_profile(&self, Parameters(params): Parameters<AccountParams>) -> String {
        render(
            "get_profile",
            organization::get_profile(&self.sessions, params).await,
        )
    }

    // ── Inbox & tasks ──

    #[tool(
        name = "get_inbox",
        description = "Get inbox tasks (task headers plus grouped tasks). Default limit is 50."
    )]
    pub async fn get_inbox(&self, Parameters(params): Parameters<GetInboxParams>) -> String {
        render("get_inbox", tasks::get_inbox(&self.sessions, params).await)
    }

    #[tool(
        name = "get_task",
        description = "Get a task with all comments, form field values and attachments."
    )]
    pub async fn get_task(&self, Parameters(params): Parameters<GetTaskParams>) -> String {
        render("get_task", tasks::get_task(&self.sessions, params).await)
    }

    #[tool(
        name = "create_task",
        description = "Create a simple task. 'responsible' and 'participants' take emails or numeric person ids; 'due_date' is YYYY-MM-DD; attachments need a guid from upload_file / upload_file_content."
    )]
    pub async fn create_task(&self, Parameters(params): Parameters<CreateTaskParams>) -> String {
        render("create_task", tasks::create_task(&self.sessions, params).await)
    }

    #[tool(
        name = "comment_task",
        description = "Comment on a task or modify it: action ('finished'/'reopened'), reassign, add/remove lists, schedule (YYYY-MM-DD) or cancel schedule, due_date (YYYY-MM-DD) or due (YYYY-MM-DDTHH:MM, with optional duration) or cancel_due, subject, spent_minutes, subscribers/participants, approval_choice ('approved'/'rejected'/'acknowledged'), field_updates, attachments, skip_notification. Conflicting options are rejected."
    )]
    pub async fn comment_task(&self, Parameters(params): Parameters<CommentTaskParams>) -> String {
        render(
            "comment_task",
            tasks::comment_task(&self.sessions, params).await,
        )
    }

    #[tool(
        name = "complete_task",
        description = "Mark a task as finished, optionally with a comment."
    )]
    pub async fn complete_task(&self, Parameters(params): Parameters<TaskActionParams>) -> String {
        render(
            "complete_task",
            tasks::complete_task(&self.sessions, params).await,
        )
    }

    #[tool(
        name = "reopen_task",
        description = "Reopen a closed task, optionally with a comment."
    )]
    pub async fn reopen_task(&self, Parameters(params): Parameters<TaskActionParams>) -> String {
        render(
            "reopen_task",
            tasks::reopen_task(&self.sessions, params).await,
        )
    }

    // ── Forms & registry ──

    #[tool(
        name = "get_forms",
        description = "List available form templates (id and name)."
    )]
    pub async fn get_forms(&self, Parameters(params): Parameters<AccountParams>) -> String {
        render("get_forms", forms::get_forms(&self.sessions, params).await)
    }

    #[tool(
        name = "get_form",
        description = "Get a form template with its steps and field definitions (id, name, type, required step)."
    )]
    pub async fn get_form(&self, Parameters(params): Parameters<GetFormParams>) -> String {
        render("get_form", forms::get_form(&self.sessions, params).await)
    }

    #[tool(
        name = "get_registry",
        description = "Get tasks created from a form (the form registry). Default limit is 100; archived tasks are excluded unless include_archived is true."
    )]
    pub async fn get_registry(&self, Parameters(params): Parameters<GetRegistryParams>) -> String {
        render(
            "get_registry",
            forms::get_registry(&self.sessions, params).await,
        )
    }

    #[tool(
        name = "create_form_task",
        description = "Create a task from a form template. Each field needs 'id' or 'name' plus 'value'. fill_defaults (default true) applies template defaults."
    )]
    pub async fn create_form_task(
        &self,
        Parameters(params): Parameters<CreateFormTaskParams>,
    ) -> String {
        render(
            "create_form_task",
            forms::create_form_task(&self.sessions, params).await,
        )
    }

    // ── Organization ──

    #[tool(
        name = "get_contacts",
        description = "Get contacts grouped by organization, with persons and roles. Inactive users are excluded unless include_inactive is true."
    )]
    pub async fn get_contacts(&self, Parameters(params): Parameters<GetContactsParams>) -> String {
        render(
            "get_contacts",
            organization::get_contacts(&self.sessions, params).await,
        )
    }

    #[tool(
        name = "get_members",
        description = "Get all members of the organization (id, name, email)."
    )]
    pub async fn get_members(&self, Parameters(params): Parameters<AccountParams>) -> String {
        render(
            "get_members",
            organization::get_members(&self.sessions, params).await,
        )
    }

    #[tool(
        name = "get_roles",
        description = "Get all roles in the organization with their member ids."
    )]
    pub async fn get_roles(&self, Parameters(params): Parameters<AccountParams>) -> String {
        render(
            "get_roles",
            organization::get_roles(&self.sessions, params).await,
        )
    }

    // ── Announcements ──

    #[tool(
        name = "get_announcements",
        description = "Get announcements with author and comments. Default limit is 100."
    )]
    pub async fn get_announcements(
        &self,
        Parameters(params): Parameters<GetAnnouncementsParams>,
    ) -> String {
        render(
            "get_announcements",
            announcements::get_announcements(&self.sessions, params).await,
        )
    }

    #[tool(name = "create_announcement", description = "Publish a new announcement.")]
    pub async fn create_announcement(
        &self,
        Parameters(params): Parameters<CreateAnnouncementParams>,
    ) -> String {
        render(
            "create_announcement",
            announcements::create_announcement(&self.sessions, params).await,
        )
    }

    // ── Calendar, lists & catalogs ──

    #[tool(
        name = "get_calendar",
        description = "Get calendar tasks between start_date and end_date (YYYY-MM-DD). Meetings are included unless include_meetings is false."
    )]
    pub async fn get_calendar(&self, Parameters(params): Parameters<GetCalendarParams>) -> String {
        render(
            "get_calendar",
            planning::get_calendar(&self.sessions, params).await,
        )
    }

    #[tool(
        name = "get_lists",
        description = "Get the task lists available to the user as a tree (id, name, children)."
    )]
    pub async fn get_lists(&self, Parameters(params): Parameters<AccountParams>) -> String {
        render("get_lists", planning::get_lists(&self.sessions, params).await)
    }

    #[tool(
        name = "get_list_tasks",
        description = "Get task headers in a list. Default limit is 200."
    )]
    pub async fn get_list_tasks(
        &self,
        Parameters(params): Parameters<GetListTasksParams>,
    ) -> String {
        render(
            "get_list_tasks",
            planning::get_list_tasks(&self.sessions, params).await,
        )
    }

    #[tool(
        name = "get_catalog",
        description = "Get a catalog with its headers and items."
    )]
    pub async fn get_catalog(&self, Parameters(params): Parameters<GetCatalogParams>) -> String {
        render(
            "get_catalog",
            planning::get_catalog(&self.sessions, params).await,
        )
    }

    // ── Files ──

    #[tool(
        name = "download_file",
        description = "Download a file attachment to disk (default ~/Downloads, created if missing). Returns status, filename, saved_to, size and a warning for empty files. Existing files with the same name are overwritten."
    )]
    pub async fn download_file(&self, Parameters(params): Parameters<DownloadFileParams>) -> String {
        render(
            "download_file",
            files::download_file(&self.sessions, params).await,
        )
    }

    #[tool(
        name = "upload_file",
        description = "Upload a local file. Returns a guid to use in create_task / comment_task attachments; root_id is passed through for versioning."
    )]
    pub async fn upload_file(&self, Parameters(params): Parameters<UploadFileParams>) -> String {
        render("upload_file", files::upload_file(&self.sessions, params).await)
    }

    #[tool(
        name = "upload_file_content",
        description = "Upload base64-encoded content under the given filename. Returns a guid for attachments."
    )]
    pub async fn upload_file_content(
        &self,
        Parameters(params): Parameters<UploadFileContentParams>,
    ) -> String {
        render(
            "upload_file_content",
            files::upload_file_content(&self.sessions, params).await,
        )
    }

    #[tool(
        name = "attach_file_to_task",
        description = "Upload a file (file_path OR content_base64 with filename) and attach it to a task in one comment, optionally with text. Returns the updated task."
    )]
    pub async fn attach_file_to_task(
        &self,
        Parameters(params): Parameters<AttachFileParams>,
    ) -> String {
        render(
            "attach_file_to_task",
            files::attach_file_to_task(&self.sessions, params).await,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use pyrus_client::{AccountRegistry, ClientOptions};
    use serde_json::{json, Value};

    const TOOL_NAMES: [&str; 25] = [
        "list_accounts",
        "get_profile",
        "get_inbox",
        "get_task",
        "create_task",
        "comment_task",
        "complete_task",
        "reopen_task",
        "get_forms",
        "get_form",
        "get_registry",
        "create_form_task",
        "get_contacts",
        "get_members",
        "get_roles",
        "get_announcements",
        "create_announcement",
        "get_calendar",
        "get_lists",
        "get_list_tasks",
        "get_catalog",
        "download_file",
        "upload_file",
        "upload_file_content",
        "attach_file_to_task",
    ];

    fn server_with(accounts: Value) -> PyrusMcpServer {
        let registry = AccountRegistry::load(&accounts).unwrap();
        PyrusMcpServer::new(SessionManager::new(registry, &ClientOptions::default()).unwrap())
    }

    fn work_home() -> PyrusMcpServer {
        server_with(json!({
            "accounts": {
                "work": {"login": "w@example.com", "security_key": "k1"},
                "home": {"login": "h@example.com", "security_key": "k2"}
            },
            "default_account": "work"
        }))
    }

    #[test]
    fn test_server_info() {
        let info = work_home().get_info();
        assert_eq!(info.server_info.name, "pyrus-mcp");
        assert!(info.capabilities.tools.is_some());
        let instructions = info.instructions.unwrap();
        assert!(instructions.contains("home, work"));
        assert!(instructions.contains("default account 'work'"));
    }

    #[test]
    fn test_server_info_without_default() {
        let server = server_with(json!({
            "accounts": {
                "a": {"login": "a@example.com", "security_key": "k"},
                "b": {"login": "b@example.com", "security_key": "k"}
            }
        }));
        assert!(server
            .get_info()
            .instructions
            .unwrap()
            .contains("No default account"));
    }

    #[test]
    fn test_router_registers_every_tool() {
        let server = work_home();
        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        let mut expected: Vec<String> = TOOL_NAMES.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn test_list_accounts_tool() {
        let text = work_home().list_accounts().await;
        let parsed: Value = serde_json::from_str(&text).unwrap();
        let keys: Vec<&str> = parsed
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["key"].as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["home", "work"]);
        assert!(!text.contains("k1"));
    }

    #[tokio::test]
    async fn test_unknown_account_payload() {
        let text = work_home()
            .get_task(Parameters(GetTaskParams {
                task_id: 1,
                account: Some("missing".into()),
            }))
            .await;
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["error"], "unknown_account");
        assert!(parsed["message"].as_str().unwrap().contains("home, work"));
    }

    #[tokio::test]
    async fn test_comment_conflict_never_authenticates() {
        let mock = MockServer::start();
        let auth = mock.mock(|when, then| {
            when.method(POST);
            then.status(200).body(r#"{"access_token":"t"}"#);
        });
        let server = server_with(json!({
            "accounts": {
                "work": {"login": "w@example.com", "security_key": "k", "auth_url": mock.url("/auth")}
            }
        }));

        let text = server
            .comment_task(Parameters(CommentTaskParams {
                task_id: 42,
                due_date: Some("2024-01-15".into()),
                cancel_due: Some(true),
                ..Default::default()
            }))
            .await;
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["error"], "invalid_argument");
        auth.assert_calls(0);
        assert!(!server.sessions().is_connected("work").await);
    }

    #[tokio::test]
    async fn test_authentication_failure_payload_names_account() {
        let mock = MockServer::start();
        mock.mock(|when, then| {
            when.method(POST).path("/auth");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"error":"bad key","error_code":"invalid_credentials"}"#);
        });
        let server = server_with(json!({
            "accounts": {
                "work": {"login": "w@example.com", "security_key": "k", "auth_url": mock.url("/auth")}
            }
        }));

        let text = server.get_profile(Parameters(AccountParams::default())).await;
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["error"], "authentication_error");
        assert_eq!(parsed["account"], "work");
    }
}
