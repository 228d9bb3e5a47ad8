use crate::error::Result;
use crate::traits::{ProviderReply, Tool, ToolSpec, fetch_json, normalize_base_url, require_api_key};
use async_trait::async_trait;
use serde::Deserialize;

pub const WEATHER_TOOL_NAME: &str = "get_weather";
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org";

/// Unit system requested from the weather endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherUnits {
    #[default]
    Imperial,
    Metric,
    Standard,
}

impl WeatherUnits {
    pub fn as_query(self) -> &'static str {
        match self {
            Self::Imperial => "imperial",
            Self::Metric => "metric",
            Self::Standard => "standard",
        }
    }

    fn temperature_suffix(self) -> &'static str {
        match self {
            Self::Imperial => "°F",
            Self::Metric => "°C",
            Self::Standard => " K",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeatherArgs {
    pub location: String,
}

#[derive(Clone)]
pub struct WeatherTool {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    units: WeatherUnits,
}

impl WeatherTool {
    pub fn new(
        http: reqwest::Client,
        api_key: &str,
        base_url: &str,
        units: WeatherUnits,
    ) -> Result<Self> {
        Ok(Self {
            http,
            api_key: require_api_key("weather", api_key)?,
            base_url: normalize_base_url(base_url),
            units,
        })
    }

    #[tracing::instrument(level = "info", skip(self))]
    pub async fn get_weather(&self, location: &str) -> Result<String> {
        let request = self
            .http
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[
                ("q", location),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_query()),
            ]);

        match fetch_json::<CurrentWeather>("weather", request).await? {
            ProviderReply::Ok(body) => {
                // The endpoint always sends at least one condition; tolerate an empty list.
                let description = body
                    .weather
                    .first()
                    .map(|w| w.description.as_str())
                    .unwrap_or("unknown conditions");
                Ok(format!(
                    "The current weather in {location} is {description} with a temperature of {}{}.",
                    body.main.temp,
                    self.units.temperature_suffix()
                ))
            }
            ProviderReply::Failed { message } => Ok(format!("Error fetching weather: {message}")),
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    type Args = WeatherArgs;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: WEATHER_TOOL_NAME.to_string(),
            description: "Get the current weather in a given location".to_string(),
            parameters_schema: serde_json::json!({
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "The city and state, e.g. San Francisco, CA"
                    }
                },
                "required": ["location"]
            }),
        }
    }

    async fn execute(&self, args: WeatherArgs) -> Result<String> {
        self.get_weather(&args.location).await
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    main: MainReadings,
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}
