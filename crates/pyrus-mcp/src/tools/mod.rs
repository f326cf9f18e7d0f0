//! MCP tool parameters and operation implementations.
//!
//! Each operation validates its arguments first, then resolves a session from
//! the [`SessionManager`](pyrus_client::SessionManager), issues its remote
//! call(s) and normalizes the result. Invalid arguments therefore never cause
//! a handshake or any other remote traffic.

pub mod announcements;
pub mod files;
pub mod forms;
pub mod helpers;
pub mod organization;
pub mod params;
pub mod planning;
pub mod tasks;

pub use helpers::{error_json, render};
pub use params::*;
