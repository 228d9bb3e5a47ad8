//! briefbot main binary.

mod config;
mod conversation;

use anyhow::Context;
use bb_llm::LlmClient;
use bb_tools::{CatTool, NewsTool, ToolDispatcher, WeatherTool, build_http_client};
use clap::Parser;
use config::{AppConfig, ConfigSources, Credentials};
use conversation::{Conversation, Prompts};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Debug, Parser)]
#[command(
    name = "briefbot",
    version,
    about = "Chat assistant for news headlines, weather and cat pictures"
)]
struct Cli {
    /// TOML config file. Defaults to ~/.briefbot/config.toml when present.
    #[arg(long, env = "BRIEFBOT_CONFIG")]
    config: Option<PathBuf>,
    /// Dotenv file with API keys. Defaults to ./.env when present.
    #[arg(long, env = "BRIEFBOT_ENV_FILE")]
    env_file: Option<PathBuf>,
    /// Chat model, overriding the config file and BRIEFBOT_MODEL.
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_file = config::load_env_file(cli.env_file.as_deref())?;
    let (mut cfg, config_file) = AppConfig::load(cli.config).await?;
    if let Some(model) = cli.model {
        cfg.general.model = model;
        cfg.validate()?;
    }

    init_tracing(&cfg.general.log_file)?;
    install_panic_hook();

    let sources = ConfigSources {
        env_file,
        config_file,
    };
    let credentials = match Credentials::from_env(&cfg.keys, &sources) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "credential check failed");
            return Err(e.into());
        }
    };

    let conversation = build_conversation(&cfg, &credentials)?;
    tracing::info!(
        model = %conversation.llm().model(),
        llm_base_url = %conversation.llm().base_url(),
        log_file = %cfg.general.log_file.display(),
        "briefbot started"
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    conversation
        .run(stdin, &mut stdout)
        .await
        .context("terminal i/o failed")?;
    Ok(())
}

fn build_conversation(cfg: &AppConfig, credentials: &Credentials) -> anyhow::Result<Conversation> {
    let http = build_http_client(Duration::from_secs(cfg.general.http_timeout_secs))?;
    let endpoints = &cfg.endpoints;

    let dispatcher = ToolDispatcher::new(
        NewsTool::new(http.clone(), &credentials.news_api_key, &endpoints.news_base_url)?,
        WeatherTool::new(
            http.clone(),
            &credentials.weather_api_key,
            &endpoints.weather_base_url,
            endpoints.weather_units,
        )?,
        CatTool::new(http.clone(), &credentials.cat_api_key, &endpoints.cat_base_url)?,
    );
    let llm = LlmClient::new(http, &credentials.openai_api_key, &cfg.general.model)
        .with_base_url(&endpoints.openai_base_url);

    Ok(Conversation::new(
        llm,
        dispatcher,
        Prompts {
            initial: cfg.general.system_prompt.clone(),
            followup: cfg.general.followup_system_prompt.clone(),
        },
    )?)
}

/// Logs go to an append-only file; stdout belongs to the conversation.
fn init_tracing(log_file: &Path) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        Err(_) => EnvFilter::new("info,briefbot=debug,bb_app=debug,bb_llm=debug,bb_tools=debug"),
    };
    let log_format = std::env::var("BRIEFBOT_LOG_FORMAT")
        .unwrap_or_else(|_| "json".to_string())
        .to_ascii_lowercase();

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("open log file {}", log_file.display()))?;
    let writer = std::sync::Mutex::new(file);

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(writer)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(true)
                .init();
        }
        "compact" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(writer)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .compact()
                .init();
        }
        other => {
            return Err(anyhow::anyhow!(
                "unsupported BRIEFBOT_LOG_FORMAT={other:?}; expected one of: json, compact"
            ));
        }
    }

    tracing::info!(
        log_format = %log_format,
        env_filter = ?std::env::var("RUST_LOG").ok(),
        "tracing initialized"
    );
    Ok(())
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_to_string(panic_info.payload());
        tracing::error!(
            panic_location = %location,
            panic_payload = %payload,
            "panic captured"
        );
        default_hook(panic_info);
    }));
}

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        return msg.to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_accepts_no_flags() {
        let cli = Cli::try_parse_from(["briefbot"]).expect("bare invocation");
        assert!(cli.model.is_none());
    }

    #[test]
    fn cli_parses_overrides() {
        let cli = Cli::try_parse_from([
            "briefbot",
            "--config",
            "/tmp/briefbot.toml",
            "--env-file",
            "/tmp/keys.env",
            "--model",
            "gpt-4o",
        ])
        .expect("flags");
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/briefbot.toml")));
        assert_eq!(cli.env_file, Some(PathBuf::from("/tmp/keys.env")));
        assert_eq!(cli.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn panic_payload_handles_str_and_string() {
        let s: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_payload_to_string(s.as_ref()), "boom");
        let s: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_payload_to_string(s.as_ref()), "bang");
        let s: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_payload_to_string(s.as_ref()), "non-string panic payload");
    }

    #[test]
    fn conversation_builds_from_default_config() {
        let creds = Credentials::resolve(
            |k| Some(format!("{k}-value")),
            &config::KeysConfig::default(),
            &ConfigSources::default(),
        )
        .expect("credentials");
        let conversation = build_conversation(&AppConfig::default(), &creds).expect("wiring");
        assert_eq!(conversation.llm().model(), "gpt-4o-mini");
        assert_eq!(conversation.llm().base_url(), bb_llm::DEFAULT_OPENAI_BASE_URL);
    }
}
