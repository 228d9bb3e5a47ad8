//! Chat-completion client for briefbot.
//!
//! Pure HTTP client over the OpenAI chat-completions protocol. The types in
//! [`types`] are provider-neutral; the wire shapes stay private to this crate.

mod client;
mod error;
mod openai;
mod types;

pub use client::{DEFAULT_OPENAI_BASE_URL, LlmClient, validate_tool_name};
pub use error::{LlmError, Result};
pub use types::{ChatMessage, ChatResponse, Role, ToolCall, ToolDefinition, Usage};
