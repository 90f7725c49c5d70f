//! voxdemo-core: pure state machine behind the interactive voice-agent demo.
//!
//! No async, no I/O. Collaborators read [`Session`] snapshots and feed
//! [`Event`]s back in through [`DemoStore`] or [`machine::transition`].

pub mod env;
pub mod error;
pub mod event;
pub mod invariants;
pub mod machine;
pub mod store;
pub mod types;

pub use env::{Env, FixedEnv, SystemEnv};
pub use error::CoreError;
pub use event::{Event, EventTag, NewMessage, NewToolCall, RawEvent, ToolCallUpdate};
pub use machine::{TransitionOutput, transition, transition_with_output};
pub use store::DemoStore;
pub use types::{
    AgentType, DemoMode, DemoStatus, ErrorKind, Message, Role, Session, SessionError, ToolCall,
    ToolCallStatus,
};
