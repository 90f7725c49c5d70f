//! Event model: one variant per tag, plus the string-tag decoding surface.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::{AgentType, DemoStatus, Role, ToolCallStatus};

// ─── Tags ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventTag {
    StartSimulated,
    TryInteractive,
    Connected,
    ConnectionFailed,
    StartListening,
    StopListening,
    Cancel,
    ResponseStart,
    ResponseComplete,
    AddMessage,
    UpdateStreaming,
    SetToolCall,
    UpdateToolCall,
    ClearToolCall,
    Error,
    Timeout,
    Retry,
    Fallback,
    Reset,
    SetAgent,
}

impl EventTag {
    pub const ALL: [Self; 20] = [
        Self::StartSimulated,
        Self::TryInteractive,
        Self::Connected,
        Self::ConnectionFailed,
        Self::StartListening,
        Self::StopListening,
        Self::Cancel,
        Self::ResponseStart,
        Self::ResponseComplete,
        Self::AddMessage,
        Self::UpdateStreaming,
        Self::SetToolCall,
        Self::UpdateToolCall,
        Self::ClearToolCall,
        Self::Error,
        Self::Timeout,
        Self::Retry,
        Self::Fallback,
        Self::Reset,
        Self::SetAgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartSimulated => "START_SIMULATED",
            Self::TryInteractive => "TRY_INTERACTIVE",
            Self::Connected => "CONNECTED",
            Self::ConnectionFailed => "CONNECTION_FAILED",
            Self::StartListening => "START_LISTENING",
            Self::StopListening => "STOP_LISTENING",
            Self::Cancel => "CANCEL",
            Self::ResponseStart => "RESPONSE_START",
            Self::ResponseComplete => "RESPONSE_COMPLETE",
            Self::AddMessage => "ADD_MESSAGE",
            Self::UpdateStreaming => "UPDATE_STREAMING",
            Self::SetToolCall => "SET_TOOL_CALL",
            Self::UpdateToolCall => "UPDATE_TOOL_CALL",
            Self::ClearToolCall => "CLEAR_TOOL_CALL",
            Self::Error => "ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Retry => "RETRY",
            Self::Fallback => "FALLBACK",
            Self::Reset => "RESET",
            Self::SetAgent => "SET_AGENT",
        }
    }

    /// Statuses the event is accepted from. `None` means "from any status".
    pub fn valid_from(self) -> Option<&'static [DemoStatus]> {
        use DemoStatus as S;
        match self {
            Self::StartSimulated => Some(&[S::Idle]),
            Self::TryInteractive => Some(&[S::Simulated, S::Complete]),
            Self::Connected | Self::ConnectionFailed => Some(&[S::Connecting]),
            Self::StartListening => Some(&[S::Interactive, S::Complete]),
            Self::StopListening => Some(&[S::Listening]),
            Self::Cancel => Some(&[S::Listening, S::Processing]),
            Self::ResponseStart => Some(&[S::Processing]),
            Self::ResponseComplete => Some(&[S::Responding, S::Simulated]),
            Self::Retry => Some(&[S::Error, S::Timeout, S::Fallback]),
            Self::Error
            | Self::Timeout
            | Self::Fallback
            | Self::Reset
            | Self::AddMessage
            | Self::UpdateStreaming
            | Self::SetToolCall
            | Self::UpdateToolCall
            | Self::ClearToolCall
            | Self::SetAgent => None,
        }
    }

    /// Target status of a lifecycle event; `None` for data events.
    pub fn target(self) -> Option<DemoStatus> {
        use DemoStatus as S;
        match self {
            Self::StartSimulated => Some(S::Simulated),
            Self::TryInteractive | Self::Retry => Some(S::Connecting),
            Self::Connected | Self::Cancel => Some(S::Interactive),
            Self::ConnectionFailed | Self::Fallback => Some(S::Fallback),
            Self::StartListening => Some(S::Listening),
            Self::StopListening => Some(S::Processing),
            Self::ResponseStart => Some(S::Responding),
            Self::ResponseComplete => Some(S::Complete),
            Self::Error => Some(S::Error),
            Self::Timeout => Some(S::Timeout),
            Self::Reset => Some(S::Idle),
            Self::AddMessage
            | Self::UpdateStreaming
            | Self::SetToolCall
            | Self::UpdateToolCall
            | Self::ClearToolCall
            | Self::SetAgent => None,
        }
    }

    pub fn is_lifecycle(self) -> bool {
        self.target().is_some()
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventTag {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownEvent(s.to_string()))
    }
}

// ─── Payloads ─────────────────────────────────────────────────────

/// `ADD_MESSAGE` payload. Missing `id`/`timestamp` are filled from the `Env`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub role: Role,
    pub content: String,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            content: content.into(),
            timestamp: None,
        }
    }
}

/// `SET_TOOL_CALL` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewToolCall {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

impl NewToolCall {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// `UPDATE_TOOL_CALL` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallUpdate {
    pub status: ToolCallStatus,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    /// Any JSON cause: a string, an `{message, ...}` object or a bare value.
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl ErrorPayload {
    fn message(self) -> Option<String> {
        match self.error? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Object(map) => match map.get("message") {
                Some(serde_json::Value::String(m)) => Some(m.clone()),
                _ => Some(serde_json::Value::Object(map).to_string()),
            },
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamingPayload {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentPayload {
    #[serde(default)]
    agent_type: Option<AgentType>,
}

// ─── Event ────────────────────────────────────────────────────────

/// Everything that can be dispatched into a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StartSimulated,
    TryInteractive,
    Connected,
    ConnectionFailed { error: Option<String> },
    StartListening,
    StopListening,
    Cancel,
    ResponseStart,
    ResponseComplete,
    AddMessage(NewMessage),
    UpdateStreaming { text: String },
    SetToolCall(NewToolCall),
    UpdateToolCall(ToolCallUpdate),
    ClearToolCall,
    Error { error: Option<String> },
    Timeout,
    Retry,
    Fallback,
    Reset,
    SetAgent { agent_type: Option<AgentType> },
}

impl Event {
    pub fn tag(&self) -> EventTag {
        match self {
            Self::StartSimulated => EventTag::StartSimulated,
            Self::TryInteractive => EventTag::TryInteractive,
            Self::Connected => EventTag::Connected,
            Self::ConnectionFailed { .. } => EventTag::ConnectionFailed,
            Self::StartListening => EventTag::StartListening,
            Self::StopListening => EventTag::StopListening,
            Self::Cancel => EventTag::Cancel,
            Self::ResponseStart => EventTag::ResponseStart,
            Self::ResponseComplete => EventTag::ResponseComplete,
            Self::AddMessage(_) => EventTag::AddMessage,
            Self::UpdateStreaming { .. } => EventTag::UpdateStreaming,
            Self::SetToolCall(_) => EventTag::SetToolCall,
            Self::UpdateToolCall(_) => EventTag::UpdateToolCall,
            Self::ClearToolCall => EventTag::ClearToolCall,
            Self::Error { .. } => EventTag::Error,
            Self::Timeout => EventTag::Timeout,
            Self::Retry => EventTag::Retry,
            Self::Fallback => EventTag::Fallback,
            Self::Reset => EventTag::Reset,
            Self::SetAgent { .. } => EventTag::SetAgent,
        }
    }

    /// Guard column of the transition table. `None` means "from any status".
    pub fn valid_from(&self) -> Option<&'static [DemoStatus]> {
        self.tag().valid_from()
    }

    /// Whether the event can move `status`. Data events only touch context.
    pub fn is_lifecycle(&self) -> bool {
        self.tag().is_lifecycle()
    }

    pub fn accepts(&self, status: DemoStatus) -> bool {
        self.valid_from().is_none_or(|from| from.contains(&status))
    }

    /// Decode a string tag plus optional JSON payload.
    pub fn decode(tag: &str, payload: Option<serde_json::Value>) -> Result<Self, CoreError> {
        let tag: EventTag = tag.parse()?;
        let payload = payload.unwrap_or(serde_json::Value::Null);

        let event = match tag {
            EventTag::StartSimulated => Self::StartSimulated,
            EventTag::TryInteractive => Self::TryInteractive,
            EventTag::Connected => Self::Connected,
            EventTag::ConnectionFailed => Self::ConnectionFailed {
                error: optional::<ErrorPayload>(tag, payload)?.message(),
            },
            EventTag::StartListening => Self::StartListening,
            EventTag::StopListening => Self::StopListening,
            EventTag::Cancel => Self::Cancel,
            EventTag::ResponseStart => Self::ResponseStart,
            EventTag::ResponseComplete => Self::ResponseComplete,
            EventTag::AddMessage => Self::AddMessage(required(tag, payload)?),
            EventTag::UpdateStreaming => Self::UpdateStreaming {
                text: required::<StreamingPayload>(tag, payload)?.text,
            },
            EventTag::SetToolCall => Self::SetToolCall(required(tag, payload)?),
            EventTag::UpdateToolCall => Self::UpdateToolCall(required(tag, payload)?),
            EventTag::ClearToolCall => Self::ClearToolCall,
            EventTag::Error => Self::Error {
                error: optional::<ErrorPayload>(tag, payload)?.message(),
            },
            EventTag::Timeout => Self::Timeout,
            EventTag::Retry => Self::Retry,
            EventTag::Fallback => Self::Fallback,
            EventTag::Reset => Self::Reset,
            EventTag::SetAgent => Self::SetAgent {
                agent_type: required::<AgentPayload>(tag, payload)?.agent_type,
            },
        };
        Ok(event)
    }
}

fn required<T: DeserializeOwned>(tag: EventTag, payload: serde_json::Value) -> Result<T, CoreError> {
    serde_json::from_value(payload).map_err(|e| CoreError::InvalidPayload {
        tag: tag.to_string(),
        detail: e.to_string(),
    })
}

fn optional<T: DeserializeOwned + Default>(
    tag: EventTag,
    payload: serde_json::Value,
) -> Result<T, CoreError> {
    if payload.is_null() {
        Ok(T::default())
    } else {
        required(tag, payload)
    }
}

/// Pre-built `{type, payload}` record, as read from replay files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl TryFrom<RawEvent> for Event {
    type Error = CoreError;

    fn try_from(raw: RawEvent) -> Result<Self, CoreError> {
        Event::decode(&raw.tag, raw.payload)
    }
}

// ─── Tests ────────────────────────────────────────────────────────
