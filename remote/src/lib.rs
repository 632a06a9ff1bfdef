pub mod auth;
mod backend;
pub mod constants;
pub mod control;
mod errors;
pub mod fetch;
pub mod rpc;
pub mod subscribe;

pub use crate::backend::RedditBackend;
pub use crate::control::PixelAnnouncement;
pub use crate::errors::{FetchError, RefreshError, RemoteError, RpcError, SubscribeError};

use crate::constants::USER_AGENT;

/// Shared HTTP client for every collaborator. Per-request timeouts are set
/// at the call sites.
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().user_agent(USER_AGENT).build()
}
