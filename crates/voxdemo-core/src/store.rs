//! Owned session holder: the dispatch and read surfaces for one demo mount.

use crate::env::{Env, SystemEnv};
use crate::error::CoreError;
use crate::event::{Event, RawEvent};
use crate::machine::{TransitionOutput, transition_with_output};
use crate::types::{DemoStatus, Session};

/// Holds one session and the `Env` used to fill default ids/timestamps.
///
/// There is no global instance; whoever composes the demo owns the store
/// and hands out references to readers.
#[derive(Debug)]
pub struct DemoStore<E: Env = SystemEnv> {
    session: Session,
    env: E,
    revision: u64,
}

impl DemoStore<SystemEnv> {
    pub fn new() -> Self {
        Self::with_env(SystemEnv::new())
    }
}

impl Default for DemoStore<SystemEnv> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Env> DemoStore<E> {
    pub fn with_env(env: E) -> Self {
        Self {
            session: Session::initial(),
            env,
            revision: 0,
        }
    }

    /// Dispatch a typed event.
    pub fn send(&mut self, event: &Event) -> TransitionOutput {
        let (next, output) = transition_with_output(&self.session, event, &self.env);
        if output.applied {
            self.session = next;
            self.revision += 1;
        }
        output
    }

    /// Dispatch by string tag. On a decode error the session is untouched.
    pub fn send_tagged(
        &mut self,
        tag: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<TransitionOutput, CoreError> {
        let event = Event::decode(tag, payload)?;
        Ok(self.send(&event))
    }

    pub fn send_raw(&mut self, raw: RawEvent) -> Result<TransitionOutput, CoreError> {
        let event = Event::try_from(raw)?;
        Ok(self.send(&event))
    }

    pub fn reset(&mut self) -> TransitionOutput {
        self.send(&Event::Reset)
    }

    pub fn status(&self) -> DemoStatus {
        self.session.status
    }

    pub fn context(&self) -> &Session {
        &self.session
    }

    /// Number of applied (session-changing) events since creation.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
