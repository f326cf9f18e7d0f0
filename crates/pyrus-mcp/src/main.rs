//! Pyrus MCP Server
//!
//! Model Context Protocol server exposing Pyrus task management (inbox,
//! tasks, forms, contacts, announcements, calendar, lists, catalogs, files)
//! across several Pyrus accounts to LLM agents over stdio.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use pyrus_client::config::find_accounts_file;
use pyrus_client::{AccountRegistry, ClientOptions, SessionManager};
use pyrus_mcp::server::PyrusMcpServer;
use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pyrus-mcp", version, about = "Pyrus MCP server (stdio transport)")]
struct Cli {
    /// Accounts file. Defaults to ./accounts.json, then the user config directory.
    #[arg(long, env = "PYRUS_MCP_ACCOUNTS")]
    accounts: Option<PathBuf>,

    /// Timeout for each Pyrus HTTP request, in seconds.
    #[arg(long, env = "PYRUS_MCP_TIMEOUT_SECS", default_value_t = 60)]
    timeout_secs: u64,

    /// Append logs to this file instead of stderr.
    #[arg(long, env = "PYRUS_MCP_LOG_FILE")]
    log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("pyrus_mcp=info".parse()?)
        .add_directive("pyrus_client=info".parse()?);

    // stdout carries the protocol; logs never go there.
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_ref())?;

    tracing::info!("pyrus-mcp starting (stdio transport)");

    let path = find_accounts_file(cli.accounts.as_deref());
    let registry = AccountRegistry::load_from_path(&path)
        .with_context(|| format!("Failed to load accounts from {}", path.display()))?;
    tracing::info!(
        accounts = %registry.keys().join(", "),
        default = registry.effective_default().unwrap_or("-"),
        "Accounts configured"
    );

    let options = ClientOptions {
        timeout: Duration::from_secs(cli.timeout_secs),
    };
    let sessions = SessionManager::new(registry, &options)?;

    let server = PyrusMcpServer::new(sessions);
    let transport = rmcp::transport::io::stdio();

    let service = server.serve(transport).await?;
    service.waiting().await?;

    Ok(())
}
