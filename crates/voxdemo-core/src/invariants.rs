//! Structural invariants every reachable session satisfies.

use thiserror::Error;

use crate::types::{DemoStatus, Session};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("tool call present while {0}")]
    ToolCallOutsideActiveStatus(DemoStatus),

    #[error("streaming while {0}")]
    StreamingOutsideResponse(DemoStatus),

    #[error("streaming text left behind while {0}")]
    StaleStreamingText(DemoStatus),

    #[error("error recorded while {0}")]
    ErrorOutsideErrorStatus(DemoStatus),
}

/// Check a session against the status-derived invariants.
pub fn check(session: &Session) -> Result<(), InvariantViolation> {
    let status = session.status;
    if session.current_tool_call.is_some() && !status.admits_tool_call() {
        return Err(InvariantViolation::ToolCallOutsideActiveStatus(status));
    }
    if session.is_streaming && !status.admits_streaming() {
        return Err(InvariantViolation::StreamingOutsideResponse(status));
    }
    if !session.streaming_text.is_empty() && !status.admits_streaming() {
        return Err(InvariantViolation::StaleStreamingText(status));
    }
    if session.error.is_some() && !status.is_error() {
        return Err(InvariantViolation::ErrorOutsideErrorStatus(status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SessionError, ToolCall, ToolCallStatus};

    #[test]
    fn initial_session_is_valid() {
        assert_eq!(check(&Session::initial()), Ok(()));
    }

    #[test]
    fn detects_each_violation() {
        let mut s = Session::initial();
        s.current_tool_call = Some(ToolCall {
            id: "tool-1".into(),
            name: "search_db".into(),
            params: Default::default(),
            status: ToolCallStatus::Pending,
            result: None,
        });
        assert_eq!(
            check(&s),
            Err(InvariantViolation::ToolCallOutsideActiveStatus(DemoStatus::Idle))
        );

        let mut s = Session::initial();
        s.status = DemoStatus::Listening;
        s.is_streaming = true;
        assert_eq!(
            check(&s),
            Err(InvariantViolation::StreamingOutsideResponse(DemoStatus::Listening))
        );

        let mut s = Session::initial();
        s.status = DemoStatus::Complete;
        s.streaming_text = "partial".into();
        assert_eq!(
            check(&s),
            Err(InvariantViolation::StaleStreamingText(DemoStatus::Complete))
        );

        let mut s = Session::initial();
        s.status = DemoStatus::Connecting;
        s.error = Some(SessionError::generic(None));
        assert_eq!(
            check(&s),
            Err(InvariantViolation::ErrorOutsideErrorStatus(DemoStatus::Connecting))
        );
    }
}
