//! Exhaustive walk of the reachable state space from IDLE.
//!
//! Sessions are grouped by an abstract shape (status, mode, tool call,
//! streaming, error, persona, transcript emptiness). Every shape is expanded
//! with every event until no new shape appears.

use std::collections::{HashSet, VecDeque};
use voxdemo_core::{
    AgentType, DemoMode, DemoStatus, ErrorKind, Event, FixedEnv, NewMessage, NewToolCall, Role,
    Session, ToolCallStatus, ToolCallUpdate, invariants, transition, transition_with_output,
};

type Shape = (
    DemoStatus,
    DemoMode,
    Option<ToolCallStatus>,
    bool,
    bool,
    Option<ErrorKind>,
    Option<AgentType>,
    bool,
);

fn shape(s: &Session) -> Shape {
    (
        s.status,
        s.mode,
        s.current_tool_call.as_ref().map(|c| c.status),
        s.is_streaming,
        s.streaming_text.is_empty(),
        s.error.as_ref().map(|e| e.kind),
        s.agent_type,
        s.messages.is_empty(),
    )
}

fn all_events() -> Vec<Event> {
    let mut events = vec![
        Event::StartSimulated,
        Event::TryInteractive,
        Event::Connected,
        Event::ConnectionFailed { error: None },
        Event::StartListening,
        Event::StopListening,
        Event::Cancel,
        Event::ResponseStart,
        Event::ResponseComplete,
        Event::AddMessage(NewMessage::new(Role::User, "hello")),
        Event::UpdateStreaming {
            text: "partial".into(),
        },
        Event::SetToolCall(NewToolCall::named("search_db")),
        Event::ClearToolCall,
        Event::Error {
            error: Some("boom".into()),
        },
        Event::Timeout,
        Event::Retry,
        Event::Fallback,
        Event::Reset,
        Event::SetAgent {
            agent_type: Some(AgentType::Revenue),
        },
        Event::SetAgent { agent_type: None },
    ];
    for status in [
        ToolCallStatus::Pending,
        ToolCallStatus::Executing,
        ToolCallStatus::Complete,
        ToolCallStatus::Failed,
    ] {
        events.push(Event::UpdateToolCall(ToolCallUpdate {
            status,
            result: None,
        }));
    }
    events
}

fn reachable() -> Vec<Session> {
    let env = FixedEnv::epoch();
    let events = all_events();
    let mut seen: HashSet<Shape> = HashSet::new();
    let mut found = Vec::new();
    let mut queue = VecDeque::from([Session::initial()]);

    while let Some(s) = queue.pop_front() {
        if !seen.insert(shape(&s)) {
            continue;
        }
        for ev in &events {
            queue.push_back(transition(&s, ev, &env));
        }
        found.push(s);
    }
    found
}

#[test]
fn every_status_is_reachable() {
    let statuses: HashSet<DemoStatus> = reachable().iter().map(|s| s.status).collect();
    for status in DemoStatus::ALL {
        assert!(statuses.contains(&status), "{status} unreachable");
    }
}

#[test]
fn invariants_hold_on_every_reachable_session() {
    let env = FixedEnv::epoch();
    for s in reachable() {
        assert_eq!(invariants::check(&s), Ok(()), "{s:?}");
        for ev in all_events() {
            let next = transition(&s, &ev, &env);
            assert_eq!(
                invariants::check(&next),
                Ok(()),
                "{} from {:?}",
                ev.tag(),
                shape(&s)
            );
        }
    }
}

#[test]
fn guarded_events_are_noops_from_other_statuses() {
    let env = FixedEnv::epoch();
    for s in reachable() {
        for ev in all_events() {
            if ev.accepts(s.status) {
                continue;
            }
            let (next, out) = transition_with_output(&s, &ev, &env);
            assert_eq!(next, s, "{} from {} must be ignored", ev.tag(), s.status);
            assert!(!out.applied);
        }
    }
}

#[test]
fn reset_from_every_reachable_session() {
    let env = FixedEnv::epoch();
    for s in reachable() {
        assert_eq!(transition(&s, &Event::Reset, &env), Session::initial());
    }
}

#[test]
fn only_error_statuses_admit_retry() {
    let env = FixedEnv::epoch();
    for s in reachable() {
        let next = transition(&s, &Event::Retry, &env);
        if s.status.is_error() {
            assert_eq!(next.status, DemoStatus::Connecting);
            assert!(next.error.is_none());
        } else {
            assert_eq!(next, s);
        }
    }
}
