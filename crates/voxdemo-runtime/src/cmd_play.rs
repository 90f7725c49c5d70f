//! `voxdemo play` and `voxdemo interactive`.

use voxdemo_core::{AgentType, DemoStatus, Event};

use crate::config::{ConnectOutcome, DemoConfig, PlaybackConfig};
use crate::demo::LiveDemo;
use crate::host::wait_for;
use crate::playback::{self, PlaybackEnd};

/// Entry point for `voxdemo play`.
pub async fn cmd_play(cfg: &DemoConfig, agent: AgentType, fast: bool, json: bool) -> anyhow::Result<()> {
    let pacing = if fast {
        PlaybackConfig {
            step_delay_ms: 0,
            chunk_delay_ms: 0,
        }
    } else {
        cfg.playback.clone()
    };

    let demo = LiveDemo::start(cfg, json);
    let script = playback::script_for(agent);

    let end = tokio::select! {
        end = playback::play(&demo.handle, &script, &pacing) => Some(end),
        _ = tokio::signal::ctrl_c() => None,
    };

    let session = demo.shutdown().await?;
    match end {
        Some(Ok(PlaybackEnd::Completed)) => {
            tracing::info!(messages = session.messages.len(), "demo complete");
        }
        Some(Ok(PlaybackEnd::Interrupted(status))) => {
            anyhow::bail!("playback interrupted in {status}");
        }
        Some(Err(e)) => return Err(e.into()),
        None => eprintln!(),
    }
    Ok(())
}

/// Entry point for `voxdemo interactive`.
///
/// Starts in simulated mode, asks for the interactive upgrade and runs one
/// caller turn. A failed or stalled handshake falls back to scripted playback.
pub async fn cmd_interactive(
    cfg: &DemoConfig,
    agent: AgentType,
    fail: bool,
    utterance: &str,
    json: bool,
) -> anyhow::Result<()> {
    let mut cfg = cfg.clone();
    if fail {
        cfg.connection.outcome = ConnectOutcome::Fail;
    }

    let demo = LiveDemo::start(&cfg, json);
    let result = tokio::select! {
        res = run_interactive(&demo, &cfg, agent, utterance) => Some(res),
        _ = tokio::signal::ctrl_c() => None,
    };
    let session = demo.shutdown().await?;

    match result {
        Some(Ok(status)) => {
            tracing::info!(%status, mode = %session.mode, "demo finished");
            if status.is_error() {
                anyhow::bail!(
                    "demo ended in {status}: {}",
                    session.error.map(|e| e.message).unwrap_or_default()
                );
            }
            Ok(())
        }
        Some(Err(e)) => Err(e),
        None => {
            eprintln!();
            Ok(())
        }
    }
}

async fn run_interactive(
    demo: &LiveDemo,
    cfg: &DemoConfig,
    agent: AgentType,
    utterance: &str,
) -> anyhow::Result<DemoStatus> {
    let handle = &demo.handle;
    let mut rx = handle.subscribe();

    handle
        .send(Event::SetAgent {
            agent_type: Some(agent),
        })
        .await?;
    handle.send(Event::StartSimulated).await?;
    handle.send(Event::TryInteractive).await?;

    let snap = wait_for(&mut rx, |s| {
        matches!(
            s,
            DemoStatus::Interactive | DemoStatus::Fallback | DemoStatus::Timeout
        )
    })
    .await
    .ok_or(crate::host::HostError::Closed)?;

    if snap.status() == DemoStatus::Interactive {
        let turn = playback::turn_for(agent);
        let status = playback::run_turn(handle, utterance, &turn, &cfg.playback).await?;
        return Ok(status);
    }

    tracing::warn!(
        status = %snap.status(),
        error = ?snap.session.error.as_ref().map(|e| e.message.as_str()),
        "interactive mode unavailable, playing scripted demo"
    );
    match playback::play(handle, &playback::script_for(agent), &cfg.playback).await? {
        PlaybackEnd::Completed => Ok(DemoStatus::Complete),
        PlaybackEnd::Interrupted(status) => Ok(status),
    }
}
