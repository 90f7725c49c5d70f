//! Response watchdog: fires `TIMEOUT` when a waiting status lasts too long.

use std::time::Duration;

use tokio::time::{Instant, timeout_at};
use voxdemo_core::{DemoStatus, Event};

use crate::host::{HostError, HostHandle, Snapshot};

/// Statuses in which the demo is waiting on something outside its control.
pub fn is_watched(status: DemoStatus) -> bool {
    matches!(
        status,
        DemoStatus::Connecting | DemoStatus::Processing | DemoStatus::Responding
    )
}

/// Deadline for the status the session is currently in.
#[derive(Debug)]
struct Deadline {
    entered: u64,
    at: Option<Instant>,
}

impl Deadline {
    fn new(snap: &Snapshot, limit: Duration) -> Self {
        Self {
            entered: snap.status_since,
            at: is_watched(snap.status()).then(|| Instant::now() + limit),
        }
    }

    /// Re-arm when the session entered a status since the last observation.
    /// A merged `CONNECTING -> FALLBACK -> CONNECTING` counts as a new entry.
    fn observe(&mut self, snap: &Snapshot, limit: Duration) -> bool {
        if snap.status_since == self.entered {
            return false;
        }
        *self = Self::new(snap, limit);
        self.at.is_some()
    }
}

/// Run until the host shuts down.
///
/// The deadline is armed on entering a watched status and only re-armed when
/// a new status is entered; streaming updates inside `RESPONDING` do not
/// extend it.
pub async fn run(handle: HostHandle, limit: Duration) -> Result<(), HostError> {
    let mut rx = handle.subscribe();
    let mut deadline = Deadline::new(&rx.borrow_and_update(), limit);

    loop {
        let changed = match deadline.at {
            Some(at) => match timeout_at(at, rx.changed()).await {
                Ok(res) => res,
                Err(_) => {
                    tracing::warn!(status = %handle.status(), deadline_ms = limit.as_millis() as u64, "response deadline exceeded");
                    handle.send(Event::Timeout).await?;
                    deadline.at = None;
                    continue;
                }
            },
            None => rx.changed().await,
        };
        if changed.is_err() {
            return Ok(());
        }

        let snap = rx.borrow_and_update().clone();
        if deadline.observe(&snap, limit) {
            tracing::debug!(status = %snap.status(), "watchdog armed");
        }
    }
}
