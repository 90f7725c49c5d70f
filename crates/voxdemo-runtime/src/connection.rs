//! Simulated voice-transport handshake.
//!
//! Answers every `CONNECTING` phase with `CONNECTED` or `CONNECTION_FAILED`
//! after the configured latency. Retries re-enter `CONNECTING` and get a
//! fresh attempt.

use std::time::Duration;

use voxdemo_core::{DemoStatus, Event};

use crate::config::{ConnectOutcome, ConnectionConfig};
use crate::host::{HostError, HostHandle, wait_for};

/// Run until the host shuts down.
pub async fn run(handle: HostHandle, cfg: ConnectionConfig) -> Result<(), HostError> {
    let delay = Duration::from_millis(cfg.delay_ms);
    let mut rx = handle.subscribe();
    let mut attempt: u32 = 0;

    loop {
        if wait_for(&mut rx, |s| s == DemoStatus::Connecting)
            .await
            .is_none()
        {
            return Ok(());
        }
        attempt += 1;
        tracing::debug!(attempt, delay_ms = cfg.delay_ms, "connecting");

        tokio::time::sleep(delay).await;

        let seen = rx.borrow().revision;

        // Cancelled by a reset or timeout while we were "dialing".
        if handle.status() == DemoStatus::Connecting {
            let event = match cfg.outcome {
                ConnectOutcome::Connect => Event::Connected,
                ConnectOutcome::Fail => Event::ConnectionFailed {
                    error: cfg.error.clone(),
                },
            };
            tracing::info!(attempt, outcome = ?cfg.outcome, "connection attempt finished");
            handle.send(event).await?;
        } else {
            tracing::debug!(attempt, status = %handle.status(), "connection attempt abandoned");
        }

        // A second answer to the same attempt is ignored by the machine, so
        // any newer revision is enough to move on.
        if rx.wait_for(|snap| snap.revision > seen).await.is_err() {
            return Ok(());
        }
    }
}
