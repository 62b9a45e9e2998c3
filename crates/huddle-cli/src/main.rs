//! Huddle replay entry point.

use std::{
    io::{self, Write},
    path::PathBuf,
};

use clap::Parser;
use huddle_app::AppConfig;
use huddle_cli::{ReplayError, ReplayOptions, parse_script, replay};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Replay a scripted chat session and print the final view state
#[derive(Parser, Debug)]
#[command(name = "huddle-replay")]
#[command(about = "Replays scripted chat sessions through the Huddle runtime")]
#[command(version)]
struct Args {
    /// JSON-lines script to replay
    #[arg(short, long)]
    script: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Allow opening a room with oneself
    #[arg(long)]
    allow_self_chat: bool,

    /// Reject every persistence intent
    #[arg(long)]
    fail_persistence: bool,

    /// Clock start in milliseconds since the Unix epoch
    #[arg(long)]
    start_ms: Option<u64>,

    /// Capacity of the stream channel
    #[arg(long, default_value_t = huddle_app::DEFAULT_CHANNEL_CAPACITY)]
    channel_capacity: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // stdout carries the view, logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .init();

    let text = std::fs::read_to_string(&args.script)
        .map_err(|source| ReplayError::Io { path: args.script.clone(), source })?;
    let steps = parse_script(&text)?;
    tracing::info!(script = %args.script.display(), steps = steps.len(), "starting replay");

    let options = ReplayOptions {
        config: AppConfig { allow_self_chat: args.allow_self_chat, channel_capacity: args.channel_capacity },
        fail_persistence: args.fail_persistence,
        start_ms: args.start_ms,
    };
    let view = replay(steps, &options).await?;

    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &view).map_err(|e| ReplayError::Output(e.into()))?;
    writeln!(out).map_err(ReplayError::Output)?;

    Ok(())
}
