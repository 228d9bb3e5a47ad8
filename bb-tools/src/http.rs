use crate::error::{Result, ToolError};
use std::time::Duration;

const USER_AGENT: &str = concat!("briefbot/", env!("CARGO_PKG_VERSION"));

/// Shared client for every outbound call. Some providers reject requests
/// without a `User-Agent`.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ToolError::ExecutionFailed(format!("build http client: {e}")))
}
