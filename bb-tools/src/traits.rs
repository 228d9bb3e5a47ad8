use crate::error::{Result, ToolError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Instant;

pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters_schema: serde_json::Value,
}

/// A data lookup the model may call. `Args` mirrors `spec().parameters_schema`.
#[async_trait]
pub trait Tool: Send + Sync {
    type Args: DeserializeOwned + Send;

    fn spec(&self) -> ToolSpec;

    /// Returns the text handed back to the model. Provider-side failures are
    /// rendered into that text; only transport and decode failures are errors.
    async fn execute(&self, args: Self::Args) -> Result<String>;
}

pub fn to_llm_tool_def(spec: ToolSpec) -> Result<bb_llm::ToolDefinition> {
    Ok(bb_llm::ToolDefinition::validated(
        spec.name,
        spec.description,
        spec.parameters_schema,
    )?)
}

/// Parse a raw argument payload as JSON. An empty payload counts as `{}`.
pub(crate) fn parse_json_arguments(tool_name: &str, raw: &str) -> Result<serde_json::Value> {
    let raw = raw.trim();
    let raw = if raw.is_empty() { "{}" } else { raw };
    serde_json::from_str(raw).map_err(|e| {
        ToolError::InvalidArguments(format!("{tool_name}: arguments are not valid JSON: {e}"))
    })
}

/// Decode parsed arguments into the typed arguments of `tool_name`.
pub(crate) fn decode_arguments<T: DeserializeOwned>(
    tool_name: &str,
    value: serde_json::Value,
) -> Result<T> {
    if !value.is_object() {
        return Err(ToolError::InvalidArguments(format!(
            "{tool_name}: arguments must be a JSON object, got {value}"
        )));
    }
    serde_json::from_value(value)
        .map_err(|e| ToolError::InvalidArguments(format!("{tool_name}: {e}")))
}

pub(crate) enum ProviderReply<T> {
    Ok(T),
    Failed { message: String },
}

/// Send `request` and decode a 200 body as `T`. Any other status becomes
/// `ProviderReply::Failed` carrying the body's `message` field, or the status
/// line when the body has none.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<ProviderReply<T>> {
    let started = Instant::now();
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    tracing::info!(
        provider,
        status = status.as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        body_len = body.len(),
        "provider request completed"
    );

    if status != StatusCode::OK {
        let message = failure_message(status, &body);
        tracing::warn!(provider, status = status.as_u16(), %message, "provider returned failure");
        return Ok(ProviderReply::Failed { message });
    }

    let parsed = serde_json::from_str(&body).map_err(|e| {
        ToolError::ResponseFormat(format!("{provider} response did not match expected shape: {e}"))
    })?;
    Ok(ProviderReply::Ok(parsed))
}

fn failure_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| status.to_string())
}

pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

pub(crate) fn require_api_key(provider: &str, api_key: &str) -> Result<String> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(ToolError::InvalidArguments(format!(
            "{provider} api key is required"
        )));
    }
    Ok(api_key.to_string())
}
