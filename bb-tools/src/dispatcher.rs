use crate::cat::{CAT_TOOL_NAME, CatImgArgs, CatTool};
use crate::error::Result;
use crate::news::{NEWS_TOOL_NAME, NewsArgs, NewsTool};
use crate::registry::registry;
use crate::traits::{Tool, decode_arguments, parse_json_arguments};
use crate::weather::{WEATHER_TOOL_NAME, WeatherArgs, WeatherTool};
use bb_llm::{ToolCall, ToolDefinition};
use std::time::Instant;

/// Output of one dispatched tool call, linked to the request by `call_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallResult {
    pub call_id: String,
    pub content: String,
}

/// A tool call resolved against the registry, with typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    GetNews(NewsArgs),
    GetWeather(WeatherArgs),
    GetCatImg(CatImgArgs),
    Unknown(String),
}

impl ToolInvocation {
    /// The payload must be valid JSON whatever the name. Known names then
    /// require an object matching the tool's schema exactly.
    pub fn parse(name: &str, arguments: &str) -> Result<Self> {
        let value = parse_json_arguments(name, arguments)?;
        Ok(match name {
            NEWS_TOOL_NAME => Self::GetNews(decode_arguments(name, value)?),
            WEATHER_TOOL_NAME => Self::GetWeather(decode_arguments(name, value)?),
            CAT_TOOL_NAME => Self::GetCatImg(decode_arguments(name, value)?),
            other => Self::Unknown(other.to_string()),
        })
    }
}

pub fn unknown_function_message(name: &str) -> String {
    format!("Unknown function: {name}")
}

pub struct ToolDispatcher {
    news: NewsTool,
    weather: WeatherTool,
    cat: CatTool,
}

impl ToolDispatcher {
    pub fn new(news: NewsTool, weather: WeatherTool, cat: CatTool) -> Self {
        Self { news, weather, cat }
    }

    pub fn registry(&self) -> Result<Vec<ToolDefinition>> {
        registry(&self.news, &self.weather, &self.cat)
    }

    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(tool_call_id = %call.id, tool_name = %call.name)
    )]
    pub async fn dispatch(&self, call: &ToolCall) -> Result<ToolCallResult> {
        let invocation = ToolInvocation::parse(&call.name, &call.arguments)?;
        let started = Instant::now();
        let content = match invocation {
            ToolInvocation::GetNews(args) => self.news.execute(args).await?,
            ToolInvocation::GetWeather(args) => self.weather.execute(args).await?,
            ToolInvocation::GetCatImg(args) => self.cat.execute(args).await?,
            ToolInvocation::Unknown(name) => {
                tracing::warn!(tool_name = %name, "tool call referenced unknown tool");
                unknown_function_message(&name)
            }
        };
        tracing::info!(
            latency_ms = started.elapsed().as_millis() as u64,
            output_len = content.len(),
            "tool call executed"
        );
        Ok(ToolCallResult {
            call_id: call.id.clone(),
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::weather::WeatherUnits;
    use serde_json::json;
    use wiremock::matchers::{any, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dispatcher(server: &MockServer) -> ToolDispatcher {
        let http = reqwest::Client::new();
        let base = server.uri();
        ToolDispatcher::new(
            NewsTool::new(http.clone(), "n", &base).expect("news"),
            WeatherTool::new(http.clone(), "w", &base, WeatherUnits::Imperial).expect("weather"),
            CatTool::new(http, "c", &base).expect("cat"),
        )
    }

    fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[test]
    fn parse_resolves_each_known_tool() {
        assert_eq!(
            ToolInvocation::parse("get_news", r#"{"category":"sports"}"#).expect("news"),
            ToolInvocation::GetNews(NewsArgs {
                category: "sports".to_string()
            })
        );
        assert_eq!(
            ToolInvocation::parse("get_weather", r#"{"location":"Paris"}"#).expect("weather"),
            ToolInvocation::GetWeather(WeatherArgs {
                location: "Paris".to_string()
            })
        );
        assert_eq!(
            ToolInvocation::parse("get_cat_img", "").expect("cat"),
            ToolInvocation::GetCatImg(CatImgArgs {})
        );
    }

    #[test]
    fn parse_checks_json_before_resolving_name() {
        assert_eq!(
            ToolInvocation::parse("get_stock_price", r#"{"ticker":"ACME"}"#).expect("unknown"),
            ToolInvocation::Unknown("get_stock_price".to_string())
        );
        let err = ToolInvocation::parse("get_stock_price", "not json")
            .expect_err("malformed JSON fails even for unknown names");
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn parse_rejects_arguments_outside_schema() {
        let err = ToolInvocation::parse("get_weather", r#"{"city":"Paris"}"#)
            .expect_err("wrong field");
        assert!(matches!(err, ToolError::InvalidArguments(_)));

        let err = ToolInvocation::parse("get_cat_img", r#"{"limit":3}"#)
            .expect_err("cat takes no arguments");
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn dispatch_preserves_call_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Boston, MA"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "main": {"temp": 55},
                "weather": [{"description": "clear sky"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = dispatcher(&server)
            .dispatch(&call("call_abc", "get_weather", r#"{"location":"Boston, MA"}"#))
            .await
            .expect("dispatch");
        assert_eq!(result.call_id, "call_abc");
        assert!(result.content.contains("55"));
        assert!(result.content.contains("clear sky"));
    }

    #[tokio::test]
    async fn dispatch_unknown_function_invokes_no_provider() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = dispatcher(&server)
            .dispatch(&call("call_x", "launch_rocket", r#"{"target":"moon"}"#))
            .await
            .expect("unknown is not an error");
        assert_eq!(result.call_id, "call_x");
        assert_eq!(result.content, "Unknown function: launch_rocket");
    }

    #[tokio::test]
    async fn dispatch_malformed_arguments_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = dispatcher(&server)
            .dispatch(&call("call_bad", "get_news", r#"{"category": "#))
            .await
            .expect_err("malformed JSON");
        assert!(err.to_string().contains("not valid JSON"));
    }
}
