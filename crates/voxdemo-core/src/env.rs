//! Clock and id capability injected into the transition function.
//!
//! Only `ADD_MESSAGE` and `SET_TOOL_CALL` consult it, and only when their
//! payload leaves `id`/`timestamp` unset.

use chrono::{DateTime, TimeDelta, Utc};
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

pub trait Env {
    fn now(&self) -> DateTime<Utc>;

    /// Fresh id of the form `<prefix>-...`, unique for this environment.
    fn next_id(&self, prefix: &str) -> String;
}

/// Wall clock. Ids are `<prefix>-<millis>-<seq>`.
#[derive(Debug, Default)]
pub struct SystemEnv {
    seq: AtomicU64,
}

impl SystemEnv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Env for SystemEnv {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn next_id(&self, prefix: &str) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{}-{seq}", Utc::now().timestamp_millis())
    }
}

/// Deterministic clock and counter for tests and replays.
#[derive(Debug)]
pub struct FixedEnv {
    now: Cell<DateTime<Utc>>,
    seq: Cell<u64>,
}

impl FixedEnv {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
            seq: Cell::new(0),
        }
    }

    /// Epoch start, handy when the actual instant does not matter.
    pub fn epoch() -> Self {
        Self::new(DateTime::UNIX_EPOCH)
    }

    pub fn advance(&self, delta: TimeDelta) {
        self.now.set(self.now.get() + delta);
    }
}

impl Env for FixedEnv {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.seq.get() + 1;
        self.seq.set(n);
        format!("{prefix}-{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_env_is_deterministic() {
        let env = FixedEnv::epoch();
        assert_eq!(env.next_id("msg"), "msg-1");
        assert_eq!(env.next_id("tool"), "tool-2");
        assert_eq!(env.now(), DateTime::UNIX_EPOCH);
        env.advance(TimeDelta::milliseconds(250));
        assert_eq!(env.now().timestamp_millis(), 250);
    }

    #[test]
    fn system_env_ids_are_unique_within_a_millisecond() {
        let env = SystemEnv::new();
        let a = env.next_id("msg");
        let b = env.next_id("msg");
        assert_ne!(a, b);
        assert!(a.starts_with("msg-"));
    }
}
