use crate::error::Result;
use crate::traits::{ProviderReply, Tool, ToolSpec, fetch_json, normalize_base_url, require_api_key};
use async_trait::async_trait;
use serde::Deserialize;

pub const CAT_TOOL_NAME: &str = "get_cat_img";
pub const DEFAULT_CAT_BASE_URL: &str = "https://api.thecatapi.com";

const IMAGE_LIMIT: &str = "10";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatImgArgs {}

#[derive(Clone)]
pub struct CatTool {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl CatTool {
    pub fn new(http: reqwest::Client, api_key: &str, base_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            api_key: require_api_key("cat", api_key)?,
            base_url: normalize_base_url(base_url),
        })
    }

    #[tracing::instrument(level = "info", skip(self))]
    pub async fn get_cat_img(&self) -> Result<String> {
        // This endpoint takes the key as a header, not a query parameter.
        let request = self
            .http
            .get(format!("{}/v1/images/search", self.base_url))
            .header("x-api-key", &self.api_key)
            .query(&[("limit", IMAGE_LIMIT)]);

        match fetch_json::<Vec<CatImage>>("cat", request).await? {
            ProviderReply::Ok(images) => {
                let urls: Vec<&str> = images.iter().map(|i| i.url.as_str()).collect();
                Ok(format!(
                    "Here are some adorable cat images:\n{}",
                    urls.join("\n")
                ))
            }
            ProviderReply::Failed { message } => {
                Ok(format!("Error fetching cat images: {message}"))
            }
        }
    }
}

#[async_trait]
impl Tool for CatTool {
    type Args = CatImgArgs;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: CAT_TOOL_NAME.to_string(),
            description: "Get a random cat image".to_string(),
            parameters_schema: serde_json::json!({
                "type": "object",
                "additionalProperties": false,
                "properties": {},
                "required": []
            }),
        }
    }

    async fn execute(&self, _args: CatImgArgs) -> Result<String> {
        self.get_cat_img().await
    }
}

#[derive(Debug, Deserialize)]
struct CatImage {
    url: String,
}
