//! turnstream - decode a captured chat completion stream
//!
//! Reads an SSE body (or a non-streamed JSON body with `--body`) from a file
//! or stdin and prints the decoded updates as JSON lines.

#![allow(missing_docs)]

use anyhow::Context;
use clap::Parser;
use futures::StreamExt;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use turnstream::utils::logging::{LogFormat, init_tracing};
use turnstream::{DecodeError, DecoderConfig, TransportResponse, TurnAssembler};

#[derive(Debug, Parser)]
#[command(name = "turnstream", version, about = "Decode OpenAI-compatible chat completion streams")]
struct Cli {
    /// Captured response body; stdin when omitted
    input: Option<PathBuf>,

    /// Decoder profile (openai, deepseek-reasoner, qwen-tagged, name-prefixed)
    #[arg(short, long, env = "TURNSTREAM_PROFILE")]
    profile: Option<String>,

    /// YAML configuration file
    #[arg(short, long, env = "TURNSTREAM_CONFIG")]
    config: Option<PathBuf>,

    /// Candidate function names for the name-prefixed profile
    #[arg(short, long = "tool", value_delimiter = ',')]
    tools: Vec<String>,

    /// Input is a complete `chat.completion` JSON body, not an SSE stream
    #[arg(long)]
    body: bool,

    /// Print the assembled turn instead of individual updates
    #[arg(short, long)]
    summary: bool,

    /// Log level used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format (text or json)
    #[arg(long, default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Alternate Display keeps the context chain on one line
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // The level comes from the configuration, so the subscriber is installed after loading it
    let (config, source) = load_config(&cli).await?;
    init_tracing(&config.log_level, cli.log_format).context("Failed to initialise logging")?;
    info!(%source, profile = %config.profile, level = %config.log_level, "configuration loaded");

    let assembler = config.assembler().context("Invalid decoder profile")?;
    info!(profile = %assembler.profile().name, "decoder ready");

    if cli.body {
        return decode_body(&cli, &assembler).await;
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received");
            on_interrupt.cancel();
        }
    });

    let response = open_input(cli.input.as_deref()).await?;

    if cli.summary {
        let result = assembler.complete(response, cancel).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let mut updates = assembler.decode(response, cancel);
    while let Some(update) = updates.next().await {
        println!("{}", serde_json::to_string(&update?)?);
    }
    Ok(())
}

/// Where the configuration was read from
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConfigSource {
    File(PathBuf),
    Environment,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Environment => write!(f, "environment"),
        }
    }
}

async fn load_config(cli: &Cli) -> anyhow::Result<(DecoderConfig, ConfigSource)> {
    let (mut config, source) = match &cli.config {
        Some(path) => (
            DecoderConfig::from_file(path)
                .await
                .with_context(|| format!("Failed to load {}", path.display()))?,
            ConfigSource::File(path.clone()),
        ),
        None => (
            DecoderConfig::from_env().context("Failed to read TURNSTREAM_* variables")?,
            ConfigSource::Environment,
        ),
    };

    if let Some(profile) = &cli.profile {
        config.profile = profile.clone();
        config.custom_profile = None;
    }
    if !cli.tools.is_empty() {
        config.candidates = cli.tools.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.to_lowercase();
    }

    turnstream::Validate::validate(&config).map_err(anyhow::Error::msg)?;
    Ok((config, source))
}

async fn open_input(path: Option<&Path>) -> anyhow::Result<TransportResponse> {
    let body = match path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            ReaderStream::new(file)
                .map(|chunk| chunk.map_err(|e| DecodeError::network(e.to_string())))
                .boxed()
        }
        None => ReaderStream::new(tokio::io::stdin())
            .map(|chunk| chunk.map_err(|e| DecodeError::network(e.to_string())))
            .boxed(),
    };
    Ok(TransportResponse::ok(body))
}

async fn decode_body(cli: &Cli, assembler: &TurnAssembler) -> anyhow::Result<()> {
    let mut text = String::new();
    match &cli.input {
        Some(path) => {
            text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
        }
        None => {
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read stdin")?;
        }
    }

    let result = assembler.decode_body(&text)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
