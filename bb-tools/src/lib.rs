//! Data lookups the assistant can call: news headlines, current weather and
//! cat images, plus the registry and dispatcher that expose them to the model.

mod cat;
mod dispatcher;
mod error;
mod http;
mod news;
mod registry;
mod traits;
mod weather;

pub use cat::{CAT_TOOL_NAME, CatImgArgs, CatTool, DEFAULT_CAT_BASE_URL};
pub use dispatcher::{ToolCallResult, ToolDispatcher, ToolInvocation, unknown_function_message};
pub use error::{Result, ToolError};
pub use http::build_http_client;
pub use news::{DEFAULT_NEWS_BASE_URL, NEWS_TOOL_NAME, NewsArgs, NewsTool};
pub use registry::registry;
pub use traits::{Tool, ToolSpec, to_llm_tool_def};
pub use weather::{DEFAULT_WEATHER_BASE_URL, WEATHER_TOOL_NAME, WeatherArgs, WeatherTool, WeatherUnits};
