use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ─── Status ───────────────────────────────────────────────────────

/// Lifecycle status of a demo session. Exactly one is current at any time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoStatus {
    #[default]
    Idle,
    Simulated,
    Connecting,
    Interactive,
    Listening,
    Processing,
    Responding,
    Complete,
    Error,
    Timeout,
    Fallback,
}

impl DemoStatus {
    pub const ALL: [Self; 11] = [
        Self::Idle,
        Self::Simulated,
        Self::Connecting,
        Self::Interactive,
        Self::Listening,
        Self::Processing,
        Self::Responding,
        Self::Complete,
        Self::Error,
        Self::Timeout,
        Self::Fallback,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Simulated => "simulated",
            Self::Connecting => "connecting",
            Self::Interactive => "interactive",
            Self::Listening => "listening",
            Self::Processing => "processing",
            Self::Responding => "responding",
            Self::Complete => "complete",
            Self::Error => "error",
            Self::Timeout => "timeout",
            Self::Fallback => "fallback",
        }
    }

    /// Statuses that may carry an in-flight tool call.
    ///
    /// `Simulated` is included because scripted playback installs tool calls
    /// while the canned conversation runs.
    pub fn admits_tool_call(self) -> bool {
        matches!(
            self,
            Self::Simulated | Self::Listening | Self::Processing | Self::Responding
        )
    }

    /// Statuses in which a response may be streaming.
    pub fn admits_streaming(self) -> bool {
        matches!(self, Self::Simulated | Self::Responding)
    }

    /// Statuses that record a failure in `Session::error`.
    pub fn is_error(self) -> bool {
        matches!(self, Self::Error | Self::Timeout | Self::Fallback)
    }
}

impl fmt::Display for DemoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DemoStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownStatus(s.to_string()))
    }
}

// ─── Mode & Persona ───────────────────────────────────────────────

/// Which collaborator drives the session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemoMode {
    #[default]
    Simulated,
    Interactive,
}

impl DemoMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simulated => "simulated",
            Self::Interactive => "interactive",
        }
    }
}

impl fmt::Display for DemoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Demo persona shown on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Revenue,
    Service,
}

impl AgentType {
    pub const ALL: [Self; 2] = [Self::Revenue, Self::Service];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::Service => "service",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "revenue" => Ok(Self::Revenue),
            "service" => Ok(Self::Service),
            _ => Err(CoreError::UnknownAgent(s.to_string())),
        }
    }
}

// ─── Transcript ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transcript entry. Timestamps travel as epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

// ─── Tool calls ───────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallStatus {
    #[default]
    Pending,
    Executing,
    Complete,
    Failed,
}

impl ToolCallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Executing => "executing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ToolCallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
    pub status: ToolCallStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

// ─── Session errors ───────────────────────────────────────────────

/// Failure category recorded on the session (data, not a Rust error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Connection,
    Timeout,
    Generic,
}

pub const DEFAULT_CONNECTION_ERROR: &str = "Connection failed";
pub const DEFAULT_GENERIC_ERROR: &str = "Unknown error";
pub const TIMEOUT_ERROR: &str = "Response timed out";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionError {
    pub kind: ErrorKind,
    pub message: String,
}

impl SessionError {
    pub fn connection(message: Option<&str>) -> Self {
        Self {
            kind: ErrorKind::Connection,
            message: message.unwrap_or(DEFAULT_CONNECTION_ERROR).to_string(),
        }
    }

    pub fn generic(message: Option<&str>) -> Self {
        Self {
            kind: ErrorKind::Generic,
            message: message.unwrap_or(DEFAULT_GENERIC_ERROR).to_string(),
        }
    }

    pub fn timeout() -> Self {
        Self {
            kind: ErrorKind::Timeout,
            message: TIMEOUT_ERROR.to_string(),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ─── Session ──────────────────────────────────────────────────────

/// The whole demo state: lifecycle status plus context payload.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub status: DemoStatus,
    pub mode: DemoMode,
    pub messages: Vec<Message>,
    pub current_tool_call: Option<ToolCall>,
    pub streaming_text: String,
    pub is_streaming: bool,
    pub error: Option<SessionError>,
    pub agent_type: Option<AgentType>,
}

impl Session {
    /// Birth state: idle, simulated mode, nothing recorded.
    pub fn initial() -> Self {
        Self::default()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_session_matches_birth_state() {
        let s = Session::initial();
        assert_eq!(s.status, DemoStatus::Idle);
        assert_eq!(s.mode, DemoMode::Simulated);
        assert!(s.messages.is_empty());
        assert!(s.current_tool_call.is_none());
        assert!(s.streaming_text.is_empty());
        assert!(!s.is_streaming);
        assert!(s.error.is_none());
        assert!(s.agent_type.is_none());
    }

    #[test]
    fn status_display_and_parse() {
        for st in DemoStatus::ALL {
            let parsed: DemoStatus = st.to_string().parse().expect("parse");
            assert_eq!(st, parsed);
        }
        assert_eq!("RESPONDING".parse::<DemoStatus>().ok(), Some(DemoStatus::Responding));
        assert!("thinking".parse::<DemoStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&DemoStatus::Fallback).expect("serialize");
        assert_eq!(json, "\"fallback\"");
    }

    #[test]
    fn agent_type_parse() {
        for a in AgentType::ALL {
            assert_eq!(a.to_string().parse::<AgentType>().ok(), Some(a));
        }
        assert!(matches!(
            "sales".parse::<AgentType>(),
            Err(CoreError::UnknownAgent(_))
        ));
    }

    #[test]
    fn message_timestamp_is_epoch_millis() {
        let msg = Message {
            id: "msg-1".into(),
            role: Role::User,
            content: "hi".into(),
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_123).expect("valid ts"),
        };
        let v = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(v["timestamp"], serde_json::json!(1_700_000_000_123_i64));
        assert_eq!(v["role"], "user");
    }

    #[test]
    fn session_error_defaults() {
        assert_eq!(SessionError::connection(None).message, "Connection failed");
        assert_eq!(SessionError::generic(None).message, "Unknown error");
        assert_eq!(SessionError::generic(Some("boom")).message, "boom");
        assert_eq!(SessionError::timeout().kind, ErrorKind::Timeout);
    }

    #[test]
    fn status_capabilities() {
        assert!(DemoStatus::Responding.admits_streaming());
        assert!(!DemoStatus::Listening.admits_streaming());
        assert!(DemoStatus::Processing.admits_tool_call());
        assert!(!DemoStatus::Complete.admits_tool_call());
        assert!(DemoStatus::Fallback.is_error());
        assert!(!DemoStatus::Connecting.is_error());
    }
}
