//! voxdemo: terminal host for the voice-agent demo state machine.
//! One process owns the session; playback, connection and watchdog tasks
//! feed it events while a printer follows its snapshots.

use anyhow::Context;
use clap::Parser;

mod cli;
mod cmd_play;
mod cmd_replay;
mod cmd_table;
mod config;
mod connection;
mod demo;
mod host;
mod playback;
mod render;
mod watchdog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("VOXDEMO_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let cfg = config::DemoConfig::load(args.config.as_deref()).context("failed to load config")?;

    match args.command {
        cli::Command::Play(opts) => {
            let agent = opts.agent.unwrap_or(cfg.agent);
            cmd_play::cmd_play(&cfg, agent, opts.fast, args.json).await?;
        }
        cli::Command::Interactive(opts) => {
            let agent = opts.agent.unwrap_or(cfg.agent);
            cmd_play::cmd_interactive(&cfg, agent, opts.fail, &opts.say, args.json).await?;
        }
        cli::Command::Replay(opts) => {
            cmd_replay::cmd_replay(&opts.file, opts.deterministic, args.json)?;
        }
        cli::Command::Table => cmd_table::cmd_table(),
    }

    Ok(())
}
