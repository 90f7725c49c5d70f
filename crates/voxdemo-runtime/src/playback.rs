//! Scripted playback: drives a canned conversation while `mode=simulated`.

use std::time::Duration;

use serde_json::{Value, json};
use voxdemo_core::{
    AgentType, DemoStatus, Event, NewMessage, NewToolCall, Role, ToolCallStatus, ToolCallUpdate,
};

use crate::config::PlaybackConfig;
use crate::host::{HostError, HostHandle, wait_for};

/// One beat of a scripted conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A complete utterance appended to the transcript.
    Say { role: Role, content: String },
    /// Install a tool call.
    Tool { name: String, params: Vec<(String, Value)> },
    /// Move the current tool call along.
    ToolStatus {
        status: ToolCallStatus,
        result: Option<Value>,
    },
    /// Assistant turn streamed word by word, then committed to the transcript.
    Respond(String),
}

impl Step {
    fn say(role: Role, content: &str) -> Self {
        Self::Say {
            role,
            content: content.to_string(),
        }
    }

    fn tool(name: &str, params: &[(&str, Value)]) -> Self {
        Self::Tool {
            name: name.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    fn tool_done(result: Value) -> Self {
        Self::ToolStatus {
            status: ToolCallStatus::Complete,
            result: Some(result),
        }
    }

    fn executing() -> Self {
        Self::ToolStatus {
            status: ToolCallStatus::Executing,
            result: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub agent: AgentType,
    pub steps: Vec<Step>,
}

/// Display name of the persona's voice agent.
pub fn agent_name(agent: AgentType) -> &'static str {
    match agent {
        AgentType::Revenue => "Alex AI",
        AgentType::Service => "Sarah AI",
    }
}

pub fn script_for(agent: AgentType) -> Script {
    let steps = match agent {
        AgentType::Revenue => vec![
            Step::say(
                Role::Assistant,
                "Thank you for calling! I can help qualify your interest and schedule a call with our team.",
            ),
            Step::say(
                Role::User,
                "Hi, we run a dental clinic and miss a lot of after-hours calls.",
            ),
            Step::tool("search_crm", &[("company", json!("Brightsmile Dental"))]),
            Step::executing(),
            Step::tool_done(json!({"existing_customer": false, "locations": 2})),
            Step::Respond(
                "Clinics your size usually recover fifteen to twenty bookings a month. Would Thursday at 2pm work for a call with our team?".into(),
            ),
            Step::say(Role::User, "Thursday works."),
            Step::tool(
                "check_calendar",
                &[("day", json!("thursday")), ("time", json!("14:00"))],
            ),
            Step::executing(),
            Step::tool_done(json!({"available": true})),
            Step::Respond(
                "You're booked for Thursday at 2pm. A confirmation is on its way to your inbox.".into(),
            ),
        ],
        AgentType::Service => vec![
            Step::say(Role::Assistant, "Hi, this is Sarah. How can I help you today?"),
            Step::say(
                Role::User,
                "My order still hasn't arrived and it's been two weeks.",
            ),
            Step::tool("lookup_account", &[("phone", json!("+1-555-0142"))]),
            Step::executing(),
            Step::tool_done(json!({"account": "A-20931", "open_orders": 1})),
            Step::Respond(
                "I've located your account and can help resolve that right away.".into(),
            ),
            Step::tool("track_order", &[("order_id", json!("ORD-58213"))]),
            Step::executing(),
            Step::tool_done(json!({"status": "held_at_depot"})),
            Step::Respond(
                "Your package is held at the local depot. I've scheduled redelivery for tomorrow morning.".into(),
            ),
        ],
    };
    Script { agent, steps }
}

/// Tool work and reply for one interactive turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// Runs while `PROCESSING`.
    pub tools: Vec<Step>,
    /// Streamed once `RESPONDING`.
    pub reply: String,
}

pub fn turn_for(agent: AgentType) -> Turn {
    match agent {
        AgentType::Revenue => Turn {
            tools: vec![
                Step::tool("search_crm", &[("query", json!("caller"))]),
                Step::executing(),
                Step::tool_done(json!({"existing_customer": false})),
            ],
            reply: "I can answer product questions, qualify your needs and book a call with our team.".into(),
        },
        AgentType::Service => Turn {
            tools: vec![
                Step::tool("lookup_account", &[("query", json!("caller"))]),
                Step::executing(),
                Step::tool_done(json!({"account": "A-20931"})),
            ],
            reply: "I can check orders, update your account and fix billing issues.".into(),
        },
    }
}

/// How a playback run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    Completed,
    /// Something else moved the session out of `SIMULATED` mid-script.
    Interrupted(DemoStatus),
}

/// Play `script` from a fresh session.
///
/// A session that is not `IDLE` is reset first, since `START_SIMULATED` is
/// only accepted from there.
pub async fn play(
    handle: &HostHandle,
    script: &Script,
    cfg: &PlaybackConfig,
) -> Result<PlaybackEnd, HostError> {
    let step_delay = Duration::from_millis(cfg.step_delay_ms);
    let chunk_delay = Duration::from_millis(cfg.chunk_delay_ms);
    let mut rx = handle.subscribe();

    if handle.status() != DemoStatus::Idle {
        handle.send(Event::Reset).await?;
        wait_for(&mut rx, |s| s == DemoStatus::Idle)
            .await
            .ok_or(HostError::Closed)?;
    }

    handle
        .send(Event::SetAgent {
            agent_type: Some(script.agent),
        })
        .await?;
    handle.send(Event::StartSimulated).await?;
    wait_for(&mut rx, |s| s != DemoStatus::Idle)
        .await
        .ok_or(HostError::Closed)?;

    tracing::info!(agent = %script.agent, steps = script.steps.len(), "playback started");

    for (i, step) in script.steps.iter().enumerate() {
        tokio::time::sleep(step_delay).await;

        let status = handle.status();
        if status != DemoStatus::Simulated {
            tracing::info!(step = i, %status, "playback interrupted");
            return Ok(PlaybackEnd::Interrupted(status));
        }

        tracing::debug!(index = i, ?step, "playback step");
        perform(handle, step, chunk_delay).await?;
    }

    handle.send(Event::ResponseComplete).await?;
    let snap = wait_for(&mut rx, |s| s != DemoStatus::Simulated)
        .await
        .ok_or(HostError::Closed)?;

    let end = match snap.status() {
        DemoStatus::Complete => PlaybackEnd::Completed,
        other => PlaybackEnd::Interrupted(other),
    };
    tracing::info!(?end, "playback finished");
    Ok(end)
}

/// Drive one caller turn through an `INTERACTIVE` session.
///
/// Events are queued back to back; the host applies them in order, so each
/// guard sees the status the previous event produced. Returns the status the
/// turn settled in.
pub async fn run_turn(
    handle: &HostHandle,
    utterance: &str,
    turn: &Turn,
    cfg: &PlaybackConfig,
) -> Result<DemoStatus, HostError> {
    let step_delay = Duration::from_millis(cfg.step_delay_ms);
    let chunk_delay = Duration::from_millis(cfg.chunk_delay_ms);
    let mut rx = handle.subscribe();
    let start = rx.borrow().revision;

    handle.send(Event::StartListening).await?;
    handle
        .send(Event::AddMessage(NewMessage::new(Role::User, utterance)))
        .await?;
    handle.send(Event::StopListening).await?;

    for step in &turn.tools {
        tokio::time::sleep(step_delay).await;
        perform(handle, step, chunk_delay).await?;
    }

    handle.send(Event::ResponseStart).await?;
    perform(handle, &Step::Respond(turn.reply.clone()), chunk_delay).await?;
    handle.send(Event::ResponseComplete).await?;

    let status = rx
        .wait_for(|snap| {
            snap.revision > start && (snap.status() == DemoStatus::Complete || snap.status().is_error())
        })
        .await
        .map_err(|_| HostError::Closed)?
        .status();
    Ok(status)
}

async fn perform(handle: &HostHandle, step: &Step, chunk_delay: Duration) -> Result<(), HostError> {
    match step {
        Step::Say { role, content } => {
            handle
                .send(Event::AddMessage(NewMessage::new(*role, content.clone())))
                .await
        }
        Step::Tool { name, params } => {
            let call = params
                .iter()
                .fold(NewToolCall::named(name.clone()), |call, (k, v)| {
                    call.with_param(k.clone(), v.clone())
                });
            handle.send(Event::SetToolCall(call)).await
        }
        Step::ToolStatus { status, result } => {
            handle
                .send(Event::UpdateToolCall(ToolCallUpdate {
                    status: *status,
                    result: result.clone(),
                }))
                .await
        }
        Step::Respond(text) => {
            for prefix in word_prefixes(text) {
                handle
                    .send(Event::UpdateStreaming {
                        text: prefix.to_string(),
                    })
                    .await?;
                tokio::time::sleep(chunk_delay).await;
            }
            handle
                .send(Event::AddMessage(NewMessage::new(Role::Assistant, text.clone())))
                .await
        }
    }
}

/// Growing prefixes of `text`, one per word: "a", "a b", "a b c".
fn word_prefixes(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for (idx, ch) in text.char_indices() {
        if ch == ' ' && idx > 0 && !text[..idx].ends_with(' ') {
            out.push(&text[..idx]);
        }
    }
    let trimmed = text.trim_end();
    if !trimmed.is_empty() {
        out.push(trimmed);
    }
    out
}
