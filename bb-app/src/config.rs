//! briefbot configuration and credential loading.
//!
//! Precedence, lowest first: built-in defaults, the optional TOML file, the
//! process environment (after the dotenv file is loaded into it), CLI flags.

use bb_tools::{DEFAULT_CAT_BASE_URL, DEFAULT_NEWS_BASE_URL, DEFAULT_WEATHER_BASE_URL, WeatherUnits};
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const NEWS_API_KEY_VAR: &str = "OPEN_NEWS_API_KEY";
pub const WEATHER_API_KEY_VAR: &str = "OPEN_WEATHER_MAP_API_KEY";
pub const CAT_API_KEY_VAR: &str = "CAT_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("load env file {}: {message}", path.display())]
    EnvFile { path: PathBuf, message: String },

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("no {label} API key found: set {key} (searched {searched})")]
    MissingKey {
        key: &'static str,
        label: &'static str,
        searched: String,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub keys: KeysConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// System prompt of the second request, sent after tool results are in.
    #[serde(default = "default_followup_system_prompt")]
    pub followup_system_prompt: String,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            system_prompt: default_system_prompt(),
            followup_system_prompt: default_followup_system_prompt(),
            log_file: default_log_file(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful assistant that can provide news, weather, and cat images.".to_string()
}

fn default_followup_system_prompt() -> String {
    "You are a helpful assistant. Provide a natural response incorporating the tool results."
        .to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("briefbot.log")
}

fn default_http_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_news_base_url")]
    pub news_base_url: String,
    #[serde(default = "default_weather_base_url")]
    pub weather_base_url: String,
    #[serde(default = "default_cat_base_url")]
    pub cat_base_url: String,
    #[serde(default)]
    pub weather_units: WeatherUnits,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            openai_base_url: default_openai_base_url(),
            news_base_url: default_news_base_url(),
            weather_base_url: default_weather_base_url(),
            cat_base_url: default_cat_base_url(),
            weather_units: WeatherUnits::default(),
        }
    }
}

fn default_openai_base_url() -> String {
    bb_llm::DEFAULT_OPENAI_BASE_URL.to_string()
}

fn default_news_base_url() -> String {
    DEFAULT_NEWS_BASE_URL.to_string()
}

fn default_weather_base_url() -> String {
    DEFAULT_WEATHER_BASE_URL.to_string()
}

fn default_cat_base_url() -> String {
    DEFAULT_CAT_BASE_URL.to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysConfig {
    pub openai_api_key: Option<String>,
    pub news_api_key: Option<String>,
    pub weather_api_key: Option<String>,
    pub cat_api_key: Option<String>,
}

impl AppConfig {
    /// Load `path`, which must exist when given. Without a path, the default
    /// location is used if present and built-in defaults otherwise.
    pub async fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = match path {
            Some(p) => Some(p),
            None => {
                let p = default_config_path();
                let exists = tokio::fs::try_exists(&p).await.unwrap_or(false);
                exists.then_some(p)
            }
        };

        let mut cfg = match path.as_deref() {
            Some(p) => Self::from_file(p).await?,
            None => Self::default(),
        };
        cfg.apply_env_overrides(|name| std::env::var(name).ok());
        cfg.validate()?;
        Ok((cfg, path))
    }

    async fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(path, &contents)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("BRIEFBOT_MODEL").filter(|v| !v.trim().is_empty()) {
            self.general.model = v;
        }
        if let Some(v) = lookup("BRIEFBOT_LOG_FILE").filter(|v| !v.trim().is_empty()) {
            self.general.log_file = PathBuf::from(v);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.model.trim().is_empty() {
            return Err(ConfigError::Invalid("general.model is required".to_string()));
        }
        if self.general.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "general.http_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.general.log_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("general.log_file is required".to_string()));
        }
        for (field, value) in [
            ("endpoints.openai_base_url", &self.endpoints.openai_base_url),
            ("endpoints.news_base_url", &self.endpoints.news_base_url),
            ("endpoints.weather_base_url", &self.endpoints.weather_base_url),
            ("endpoints.cat_base_url", &self.endpoints.cat_base_url),
        ] {
            Url::parse(value)
                .map_err(|e| ConfigError::Invalid(format!("{field}={value:?}: {e}")))?;
        }
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".briefbot").join("config.toml")
}

/// Load the dotenv file into the process environment. An explicit path must
/// exist; otherwise `.env` in the working directory is used when present.
pub fn load_env_file(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    match explicit {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            Ok(Some(path.to_path_buf()))
        }
        None => match dotenvy::dotenv() {
            Ok(path) => Ok(Some(path)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(ConfigError::EnvFile {
                path: PathBuf::from(".env"),
                message: e.to_string(),
            }),
        },
    }
}

/// Where credentials were looked for, reported when one is missing.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub env_file: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
}

impl ConfigSources {
    pub fn describe(&self) -> String {
        let mut places = vec!["the process environment".to_string()];
        match &self.env_file {
            Some(p) => places.push(format!("env file {}", p.display())),
            None => places.push("env file .env (not found)".to_string()),
        }
        if let Some(p) = &self.config_file {
            places.push(format!("[keys] in {}", p.display()));
        }
        places.join(", ")
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub openai_api_key: String,
    pub news_api_key: String,
    pub weather_api_key: String,
    pub cat_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn from_env(keys: &KeysConfig, sources: &ConfigSources) -> Result<Self, ConfigError> {
        Self::resolve(|name| std::env::var(name).ok(), keys, sources)
    }

    /// Environment values win over the config file unless blank. Keys are checked in a
    /// fixed order (news, weather, cat, LLM) and the first missing one aborts.
    pub fn resolve(
        lookup: impl Fn(&str) -> Option<String>,
        keys: &KeysConfig,
        sources: &ConfigSources,
    ) -> Result<Self, ConfigError> {
        let pick = |var: &'static str, label: &'static str, file: &Option<String>| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file.clone())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingKey {
                    key: var,
                    label,
                    searched: sources.describe(),
                })
        };

        let news_api_key = pick(NEWS_API_KEY_VAR, "News", &keys.news_api_key)?;
        let weather_api_key = pick(WEATHER_API_KEY_VAR, "OpenWeatherMap", &keys.weather_api_key)?;
        let cat_api_key = pick(CAT_API_KEY_VAR, "Cat", &keys.cat_api_key)?;
        let openai_api_key = pick(OPENAI_API_KEY_VAR, "OpenAI", &keys.openai_api_key)?;

        Ok(Self {
            openai_api_key,
            news_api_key,
            weather_api_key,
            cat_api_key,
        })
    }
}
