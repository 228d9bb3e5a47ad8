use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolError>;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("invalid tool definition: {0}")]
    Definition(String),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("unexpected response format: {0}")]
    ResponseFormat(String),
}

impl From<reqwest::Error> for ToolError {
    fn from(e: reqwest::Error) -> Self {
        Self::ExecutionFailed(e.to_string())
    }
}

impl From<bb_llm::LlmError> for ToolError {
    fn from(e: bb_llm::LlmError) -> Self {
        Self::Definition(e.to_string())
    }
}
