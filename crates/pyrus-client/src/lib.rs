//! Multi-account Pyrus API client.
//!
//! Consumed by `pyrus-mcp`. Resolves an account selector to a lazily
//! authenticated session and turns Pyrus responses into stable JSON shapes.
//!
//! # Modules
//!
//! - [`config`]: Accounts file contract and discovery
//! - [`registry`]: Validated account set with default-account resolution
//! - [`session`]: Authentication handshake, HTTP transport, per-account session cache
//! - [`models`]: Lenient typed views of response bodies
//! - [`requests`]: Request bodies for write endpoints
//! - [`normalize`]: Canonical response shapes and remote error classification
//! - [`error`]: Error taxonomy surfaced to callers

pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod registry;
pub mod requests;
pub mod session;

pub use config::{Account, AccountSummary};
pub use error::{ClientError, ClientResult};
pub use normalize::{normalize, normalize_entity, Shape};
pub use registry::AccountRegistry;
pub use session::{ClientOptions, DownloadedFile, Session, SessionManager};
