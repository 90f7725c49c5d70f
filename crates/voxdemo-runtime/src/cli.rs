//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use voxdemo_core::AgentType;

#[derive(Parser)]
#[command(name = "voxdemo", about = "Voice-agent demo session driver")]
pub struct Cli {
    /// TOML config file (default: $VOXDEMO_CONFIG, else built-in defaults)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Print one JSON session object per observed snapshot instead of a transcript
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Play the scripted simulated conversation
    Play(PlayOpts),
    /// Try the interactive path, falling back to playback on failure
    Interactive(InteractiveOpts),
    /// Feed a recorded event log through a fresh session
    Replay(ReplayOpts),
    /// Print the transition table
    Table,
}

#[derive(clap::Args)]
pub struct PlayOpts {
    /// Persona: revenue | service
    #[arg(long)]
    pub agent: Option<AgentType>,

    /// Skip all playback delays
    #[arg(long)]
    pub fast: bool,
}

#[derive(clap::Args)]
pub struct InteractiveOpts {
    /// Persona: revenue | service
    #[arg(long)]
    pub agent: Option<AgentType>,

    /// Force the simulated handshake to fail
    #[arg(long)]
    pub fail: bool,

    /// Caller utterance for the single interactive turn
    #[arg(long, default_value = "What can you help me with?")]
    pub say: String,
}

#[derive(clap::Args)]
pub struct ReplayOpts {
    /// Event log: a JSON array or one `{"type": ..., "payload": ...}` per line
    pub file: PathBuf,

    /// Use a fixed clock and sequential ids so output is reproducible
    #[arg(long)]
    pub deterministic: bool,
}
