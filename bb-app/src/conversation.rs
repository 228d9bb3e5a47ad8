//! Interactive loop: one user line in, at most two LLM calls, one answer out.
//!
//! Each exchange starts from a fresh turn list; nothing carries over between
//! exchanges.

use bb_llm::{ChatMessage, LlmClient, LlmError, ToolDefinition};
use bb_tools::{ToolCallResult, ToolDispatcher, ToolError};
use std::io::Write;
use std::time::Instant;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const WELCOME: &str = "Welcome! You can ask for news, weather, or a cat image. Type 'exit' to quit.";
const INPUT_PROMPT: &str = "You: ";
const FAREWELL: &str = "Goodbye!";
const ASSISTANT_LABEL: &str = "Assistant: ";
const EXIT_KEYWORD: &str = "exit";

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("llm request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("tool call {call_id} ({tool_name}) failed: {source}")]
    Tool {
        call_id: String,
        tool_name: String,
        #[source]
        source: ToolError,
    },
}

impl ExchangeError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Llm(_) => "llm",
            Self::Tool { .. } => "tool",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Prompts {
    pub initial: String,
    pub followup: String,
}

pub struct Conversation {
    llm: LlmClient,
    dispatcher: ToolDispatcher,
    tools: Vec<ToolDefinition>,
    prompts: Prompts,
}

impl Conversation {
    pub fn new(
        llm: LlmClient,
        dispatcher: ToolDispatcher,
        prompts: Prompts,
    ) -> Result<Self, ToolError> {
        let tools = dispatcher.registry()?;
        Ok(Self {
            llm,
            dispatcher,
            tools,
            prompts,
        })
    }

    pub fn llm(&self) -> &LlmClient {
        &self.llm
    }

    /// Read lines from `input` until the exit keyword or end of input. Exchange
    /// failures are reported and logged; only I/O errors on the terminal end
    /// the loop early.
    pub async fn run<R, W>(&self, input: R, output: &mut W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(output, "{WELCOME}")?;
        let mut lines = input.lines();
        loop {
            write!(output, "{INPUT_PROMPT}")?;
            output.flush()?;

            let Some(line) = lines.next_line().await? else {
                writeln!(output)?;
                writeln!(output, "{FAREWELL}")?;
                tracing::info!("input closed, conversation ended");
                return Ok(());
            };
            if is_exit_command(&line) {
                writeln!(output, "{FAREWELL}")?;
                tracing::info!("exit requested, conversation ended");
                return Ok(());
            }
            if line.trim().is_empty() {
                continue;
            }

            match self.exchange(&line).await {
                Ok(reply) => writeln!(output, "{ASSISTANT_LABEL}{reply}")?,
                Err(e) => {
                    tracing::error!(kind = e.kind(), error = %e, "exchange failed");
                    writeln!(output, "An error occurred: {e}")?;
                }
            }
        }
    }

    /// Resolve one user message into the assistant's reply.
    #[tracing::instrument(level = "info", skip_all, fields(model = %self.llm.model()))]
    pub async fn exchange(&self, user_input: &str) -> Result<String, ExchangeError> {
        let user_turn = ChatMessage::user(user_input);
        let initial = [ChatMessage::system(&self.prompts.initial), user_turn.clone()];

        let started = Instant::now();
        let response = self.llm.chat(&initial, &self.tools).await?;
        tracing::info!(
            latency_ms = started.elapsed().as_millis() as u64,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            tool_calls = response.message.tool_calls.len(),
            finish_reason = %response.finish_reason,
            "initial llm call completed"
        );

        if response.message.tool_calls.is_empty() {
            return Ok(response.message.content);
        }

        let mut results: Vec<ToolCallResult> = Vec::with_capacity(response.message.tool_calls.len());
        for call in &response.message.tool_calls {
            tracing::info!(
                tool_call_id = %call.id,
                tool_name = %call.name,
                arguments_len = call.arguments.len(),
                "dispatching tool call"
            );
            let result = self
                .dispatcher
                .dispatch(call)
                .await
                .map_err(|source| ExchangeError::Tool {
                    call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    source,
                })?;
            results.push(result);
        }

        let followup = followup_turns(&self.prompts.followup, user_turn, response.message, results);
        let started = Instant::now();
        let final_response = self.llm.chat(&followup, &[]).await?;
        tracing::info!(
            latency_ms = started.elapsed().as_millis() as u64,
            prompt_tokens = final_response.usage.prompt_tokens,
            completion_tokens = final_response.usage.completion_tokens,
            "follow-up llm call completed"
        );
        Ok(final_response.message.content)
    }
}

/// System, user, the assistant's tool-call turn, then one tool turn per
/// result in dispatch order.
fn followup_turns(
    system_prompt: &str,
    user_turn: ChatMessage,
    assistant_turn: ChatMessage,
    results: Vec<ToolCallResult>,
) -> Vec<ChatMessage> {
    let mut turns = Vec::with_capacity(3 + results.len());
    turns.push(ChatMessage::system(system_prompt));
    turns.push(user_turn);
    turns.push(assistant_turn);
    turns.extend(
        results
            .into_iter()
            .map(|r| ChatMessage::tool(r.call_id, r.content)),
    );
    turns
}

fn is_exit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_KEYWORD)
}
