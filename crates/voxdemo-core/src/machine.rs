//! Demo session state machine.
//!
//! Guarded transitions over a single [`Session`] value:
//!
//! - **Lifecycle events** move `status` only from the statuses listed in
//!   [`Event::valid_from`]. From any other status they are ignored and the
//!   session comes back unchanged, so a doubled `STOP_LISTENING` from a racing
//!   UI is harmless.
//! - **Data events** (`ADD_MESSAGE`, `UPDATE_STREAMING`, tool-call updates,
//!   `SET_AGENT`) are accepted from any status and never move `status`.
//! - **Settling**: after an event is applied, fields the resulting status
//!   cannot hold are cleared (tool call, streaming buffer, error).

use crate::env::Env;
use crate::event::{Event, NewMessage, NewToolCall, ToolCallUpdate};
use crate::types::{DemoMode, DemoStatus, Message, Session, SessionError, ToolCall, ToolCallStatus};

/// What a single dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionOutput {
    pub from: DemoStatus,
    pub to: DemoStatus,
    /// Whether the resulting session differs from the input.
    pub applied: bool,
}

impl TransitionOutput {
    pub fn status_changed(&self) -> bool {
        self.from != self.to
    }
}

/// Compute the next session. Never fails; inapplicable events are no-ops.
pub fn transition(session: &Session, event: &Event, env: &dyn Env) -> Session {
    transition_with_output(session, event, env).0
}

/// Like [`transition`], also reporting what changed.
pub fn transition_with_output(
    session: &Session,
    event: &Event,
    env: &dyn Env,
) -> (Session, TransitionOutput) {
    let from = session.status;

    if !event.accepts(from) {
        let output = TransitionOutput {
            from,
            to: from,
            applied: false,
        };
        return (session.clone(), output);
    }

    let next = settle(apply(session, event, env));
    let output = TransitionOutput {
        from,
        to: next.status,
        applied: next != *session,
    };
    (next, output)
}

/// Apply the event's side effects. Guards have already been checked.
fn apply(session: &Session, event: &Event, env: &dyn Env) -> Session {
    let s = session.clone();
    match event {
        // ── Lifecycle ───────────────────────────────────────────────
        Event::StartSimulated => Session {
            status: DemoStatus::Simulated,
            mode: DemoMode::Simulated,
            messages: Vec::new(),
            error: None,
            ..s
        },
        Event::TryInteractive => Session {
            status: DemoStatus::Connecting,
            mode: DemoMode::Interactive,
            error: None,
            ..s
        },
        Event::Connected => Session {
            status: DemoStatus::Interactive,
            error: None,
            ..s
        },
        Event::ConnectionFailed { error } => Session {
            status: DemoStatus::Fallback,
            mode: DemoMode::Simulated,
            error: Some(SessionError::connection(error.as_deref())),
            ..s
        },
        Event::StartListening => Session {
            status: DemoStatus::Listening,
            streaming_text: String::new(),
            is_streaming: false,
            ..s
        },
        Event::StopListening => Session {
            status: DemoStatus::Processing,
            ..s
        },
        Event::Cancel => Session {
            status: DemoStatus::Interactive,
            current_tool_call: None,
            streaming_text: String::new(),
            is_streaming: false,
            ..s
        },
        Event::ResponseStart => Session {
            status: DemoStatus::Responding,
            is_streaming: true,
            streaming_text: String::new(),
            ..s
        },
        Event::ResponseComplete => Session {
            status: DemoStatus::Complete,
            is_streaming: false,
            streaming_text: String::new(),
            current_tool_call: None,
            ..s
        },

        // ── Failure & recovery ──────────────────────────────────────
        Event::Error { error } => Session {
            status: DemoStatus::Error,
            error: Some(SessionError::generic(error.as_deref())),
            is_streaming: false,
            ..s
        },
        Event::Timeout => Session {
            status: DemoStatus::Timeout,
            error: Some(SessionError::timeout()),
            is_streaming: false,
            ..s
        },
        Event::Retry => Session {
            status: DemoStatus::Connecting,
            error: None,
            ..s
        },
        Event::Fallback => Session {
            status: DemoStatus::Fallback,
            mode: DemoMode::Simulated,
            ..s
        },
        Event::Reset => Session::initial(),

        // ── Data ────────────────────────────────────────────────────
        Event::AddMessage(msg) => add_message(s, msg, env),
        Event::UpdateStreaming { text } => Session {
            streaming_text: text.clone(),
            is_streaming: true,
            ..s
        },
        Event::SetToolCall(call) => set_tool_call(s, call, env),
        Event::UpdateToolCall(update) => update_tool_call(s, update),
        Event::ClearToolCall => Session {
            current_tool_call: None,
            ..s
        },
        Event::SetAgent { agent_type } => Session {
            agent_type: *agent_type,
            ..s
        },
    }
}

fn add_message(mut s: Session, msg: &NewMessage, env: &dyn Env) -> Session {
    s.messages.push(Message {
        id: msg.id.clone().unwrap_or_else(|| env.next_id("msg")),
        role: msg.role,
        content: msg.content.clone(),
        timestamp: msg.timestamp.unwrap_or_else(|| env.now()),
    });
    s
}

fn set_tool_call(s: Session, call: &NewToolCall, env: &dyn Env) -> Session {
    let tool_call = ToolCall {
        id: call.id.clone().unwrap_or_else(|| env.next_id("tool")),
        name: call.name.clone(),
        params: call.params.clone(),
        status: ToolCallStatus::Pending,
        result: None,
    };
    Session {
        current_tool_call: Some(tool_call),
        ..s
    }
}

fn update_tool_call(s: Session, update: &ToolCallUpdate) -> Session {
    let Some(current) = &s.current_tool_call else {
        return s;
    };
    let updated = ToolCall {
        status: update.status,
        result: update.result.clone(),
        ..current.clone()
    };
    Session {
        current_tool_call: Some(updated),
        ..s
    }
}

/// Clear fields the session's status cannot hold.
fn settle(mut s: Session) -> Session {
    if !s.status.admits_tool_call() {
        s.current_tool_call = None;
    }
    if !s.status.admits_streaming() {
        s.is_streaming = false;
        s.streaming_text.clear();
    }
    if !s.status.is_error() {
        s.error = None;
    }
    s
}

// ─── Tests ───────────────────────────────────────────────────────────


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::env::FixedEnv;
    use crate::invariants;
    use crate::types::{AgentType, Role};
    use proptest::prelude::*;

    fn arb_tool_status() -> impl Strategy<Value = ToolCallStatus> {
        prop_oneof![
            Just(ToolCallStatus::Pending),
            Just(ToolCallStatus::Executing),
            Just(ToolCallStatus::Complete),
            Just(ToolCallStatus::Failed),
        ]
    }

    fn arb_role() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::User), Just(Role::Assistant), Just(Role::System)]
    }

    fn arb_event() -> impl Strategy<Value = Event> {
        prop_oneof![
            Just(Event::StartSimulated),
            Just(Event::TryInteractive),
            Just(Event::Connected),
            proptest::option::of("[a-z ]{1,12}")
                .prop_map(|error| Event::ConnectionFailed { error }),
            Just(Event::StartListening),
            Just(Event::StopListening),
            Just(Event::Cancel),
            Just(Event::ResponseStart),
            Just(Event::ResponseComplete),
            (arb_role(), "[a-z ]{0,16}")
                .prop_map(|(role, content)| Event::AddMessage(NewMessage::new(role, content))),
            "[a-z ]{0,16}".prop_map(|text| Event::UpdateStreaming { text }),
            "[a-z_]{1,12}".prop_map(|name| Event::SetToolCall(NewToolCall::named(name))),
            arb_tool_status().prop_map(|status| Event::UpdateToolCall(ToolCallUpdate {
                status,
                result: None
            })),
            Just(Event::ClearToolCall),
            proptest::option::of("[a-z ]{1,12}").prop_map(|error| Event::Error { error }),
            Just(Event::Timeout),
            Just(Event::Retry),
            Just(Event::Fallback),
            Just(Event::Reset),
            proptest::option::of(prop_oneof![Just(AgentType::Revenue), Just(AgentType::Service)])
                .prop_map(|agent_type| Event::SetAgent { agent_type }),
        ]
    }

    proptest! {
        /// Invariants hold after every step of any event sequence.
        #[test]
        fn invariants_hold_for_any_sequence(
            events in proptest::collection::vec(arb_event(), 0..60),
        ) {
            let env = FixedEnv::epoch();
            let mut s = Session::initial();
            for ev in &events {
                s = transition(&s, ev, &env);
                prop_assert_eq!(invariants::check(&s), Ok(()));
            }
        }

        /// Transcript only grows, except on RESET or START_SIMULATED (which
        /// starts a fresh playback from IDLE).
        #[test]
        fn messages_never_shrink(
            events in proptest::collection::vec(arb_event(), 0..60),
        ) {
            let env = FixedEnv::epoch();
            let mut s = Session::initial();
            for ev in &events {
                let next = transition(&s, ev, &env);
                if !matches!(ev, Event::Reset | Event::StartSimulated) {
                    prop_assert!(next.messages.len() >= s.messages.len());
                    prop_assert_eq!(&next.messages[..s.messages.len()], &s.messages[..]);
                }
                s = next;
            }
        }

        /// Same events from IDLE with the same env yield the same session.
        #[test]
        fn replay_is_deterministic(
            events in proptest::collection::vec(arb_event(), 0..40),
        ) {
            let replay = || {
                let env = FixedEnv::epoch();
                events.iter().fold(Session::initial(), |s, ev| transition(&s, ev, &env))
            };
            prop_assert_eq!(replay(), replay());
        }

        /// RESET always lands on the birth state.
        #[test]
        fn reset_is_total(
            events in proptest::collection::vec(arb_event(), 0..40),
        ) {
            let env = FixedEnv::epoch();
            let s = events.iter().fold(Session::initial(), |s, ev| transition(&s, ev, &env));
            prop_assert_eq!(transition(&s, &Event::Reset, &env), Session::initial());
        }
    }
}
