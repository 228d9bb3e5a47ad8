use crate::error::Result;
use crate::traits::{ProviderReply, Tool, ToolSpec, fetch_json, normalize_base_url, require_api_key};
use async_trait::async_trait;
use serde::Deserialize;

pub const NEWS_TOOL_NAME: &str = "get_news";
pub const DEFAULT_NEWS_BASE_URL: &str = "https://newsapi.org";

const MAX_HEADLINES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewsArgs {
    pub category: String,
}

#[derive(Clone)]
pub struct NewsTool {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl NewsTool {
    pub fn new(http: reqwest::Client, api_key: &str, base_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            api_key: require_api_key("news", api_key)?,
            base_url: normalize_base_url(base_url),
        })
    }

    /// Top headlines for `category`. The category is passed through unchecked.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn get_news(&self, category: &str) -> Result<String> {
        let request = self
            .http
            .get(format!("{}/v2/top-headlines", self.base_url))
            .query(&[("category", category), ("apiKey", self.api_key.as_str())]);

        match fetch_json::<HeadlinesResponse>("news", request).await? {
            ProviderReply::Ok(body) => {
                let headlines: Vec<&str> = body
                    .articles
                    .iter()
                    .take(MAX_HEADLINES)
                    .map(|a| a.title.as_str())
                    .collect();
                Ok(format!(
                    "Here are the latest {category} news headlines:\n{}",
                    headlines.join("\n")
                ))
            }
            ProviderReply::Failed { message } => Ok(format!("Error fetching news: {message}")),
        }
    }
}

#[async_trait]
impl Tool for NewsTool {
    type Args = NewsArgs;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: NEWS_TOOL_NAME.to_string(),
            description: "Get the latest news headlines".to_string(),
            parameters_schema: serde_json::json!({
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "category": {
                        "type": "string",
                        "description": "The news category (e.g., 'business', 'technology')"
                    }
                },
                "required": ["category"]
            }),
        }
    }

    async fn execute(&self, args: NewsArgs) -> Result<String> {
        self.get_news(&args.category).await
    }
}

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: String,
}
