use crate::error::{LlmError, Result};
use crate::openai::OpenAiClient;
use crate::types::{ChatMessage, ChatResponse, ToolDefinition};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

const TOOL_NAME_MAX_LEN: usize = 64;

#[derive(Clone)]
pub struct LlmClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl LlmClient {
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn new(http: reqwest::Client, api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            client: http,
        }
    }

    /// Point the client at an OpenAI-compatible server other than api.openai.com.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One chat-completion round trip. An empty `tools` slice sends no tools
    /// and no `tool_choice`.
    #[tracing::instrument(level = "info", skip_all, fields(model = %self.model))]
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse> {
        if messages.is_empty() {
            return Err(LlmError::InvalidInput(
                "chat request needs at least one message".to_string(),
            ));
        }
        tracing::debug!(
            message_count = messages.len(),
            tool_count = tools.len(),
            "sending chat request"
        );
        let c = OpenAiClient::new(self.client.clone(), &self.base_url, &self.api_key, &self.model);
        c.chat(messages, tools).await
    }
}

/// Tool names must match `^[a-zA-Z0-9_-]{1,64}$` to be accepted by the provider.
pub fn validate_tool_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(LlmError::InvalidInput(
            "tool name must not be empty".to_string(),
        ));
    }
    if name.len() > TOOL_NAME_MAX_LEN {
        return Err(LlmError::InvalidInput(format!(
            "tool name {name:?} exceeds {TOOL_NAME_MAX_LEN} characters"
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(LlmError::InvalidInput(format!(
            "tool name {name:?} contains invalid character {bad:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, ToolCall};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn tool_names_follow_provider_pattern() {
        assert!(validate_tool_name("get_weather").is_ok());
        assert!(validate_tool_name("get-cat-img2").is_ok());
        assert!(validate_tool_name("").is_err());
        assert!(validate_tool_name("shell.execute").is_err());
        assert!(validate_tool_name(&"a".repeat(65)).is_err());
    }

    #[test]
    fn validated_definition_rejects_bad_name() {
        let err = ToolDefinition::validated("bad name", "desc", json!({}))
            .expect_err("space is not allowed");
        assert!(err.to_string().contains("invalid character"));
    }

    #[tokio::test]
    async fn chat_posts_to_completions_endpoint_and_decodes_tool_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {"name": "get_weather", "arguments": "{\"location\":\"Boston, MA\"}"}
                        }]
                    },
                    "finish_reason": "tool_calls"
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 7}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = LlmClient::new(reqwest::Client::new(), "sk-test", "gpt-4o-mini")
            .with_base_url(&format!("{}/", server.uri()));
        let resp = client
            .chat(&[ChatMessage::user("weather in Boston?")], &[])
            .await
            .expect("chat succeeds");

        assert_eq!(resp.message.role, Role::Assistant);
        assert_eq!(resp.message.content, "");
        assert_eq!(
            resp.message.tool_calls,
            vec![ToolCall {
                id: "call_1".to_string(),
                name: "get_weather".to_string(),
                arguments: "{\"location\":\"Boston, MA\"}".to_string(),
            }]
        );
        assert_eq!(resp.usage.prompt_tokens, 12);
        assert_eq!(resp.finish_reason, "tool_calls");
    }

    #[tokio::test]
    async fn chat_surfaces_non_success_status_as_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let client = LlmClient::new(reqwest::Client::new(), "sk-wrong", "gpt-4o-mini")
            .with_base_url(&server.uri());
        let err = client
            .chat(&[ChatMessage::user("hi")], &[])
            .await
            .expect_err("401 is an error");
        match err {
            LlmError::Http(msg) => {
                assert!(msg.contains("401"));
                assert!(msg.contains("bad key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn chat_rejects_empty_message_list_without_sending() {
        let client = LlmClient::new(reqwest::Client::new(), "sk-test", "gpt-4o-mini")
            .with_base_url("http://127.0.0.1:9");
        let err = client.chat(&[], &[]).await.expect_err("empty input");
        assert!(matches!(err, LlmError::InvalidInput(_)));
    }
}
